use crate::core::Viewport;
use crate::error::{AnnotationError, AnnotationResult};
use crate::render::{LinePrimitive, PolylinePrimitive, RectPrimitive, TextPrimitive};

/// Backend-agnostic overlay scene for one draw pass.
///
/// Primitives render in list order per kind: rects, then polylines, then
/// lines, then texts.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    pub viewport: Viewport,
    pub lines: Vec<LinePrimitive>,
    pub rects: Vec<RectPrimitive>,
    pub texts: Vec<TextPrimitive>,
    pub polylines: Vec<PolylinePrimitive>,
}

impl OverlayFrame {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            lines: Vec::new(),
            rects: Vec::new(),
            texts: Vec::new(),
            polylines: Vec::new(),
        }
    }

    /// Rejects frames a backend could not draw: degenerate viewport or any
    /// non-finite primitive.
    pub fn validate(&self) -> AnnotationResult<()> {
        if !self.viewport.is_valid() {
            return Err(AnnotationError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        self.lines.iter().try_for_each(|line| line.validate())?;
        self.rects.iter().try_for_each(|rect| rect.validate())?;
        self.texts.iter().try_for_each(TextPrimitive::validate)?;
        self.polylines
            .iter()
            .try_for_each(PolylinePrimitive::validate)
    }

    #[must_use]
    pub fn primitive_count(&self) -> usize {
        self.lines.len() + self.rects.len() + self.texts.len() + self.polylines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primitive_count() == 0
    }
}
