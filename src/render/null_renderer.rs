use crate::error::AnnotationResult;
use crate::render::{OverlayFrame, Renderer};

/// No-op renderer used by tests and headless hosts.
///
/// It still validates frame content so invalid geometry surfaces in tests.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames_rendered: usize,
    pub last_line_count: usize,
    pub last_rect_count: usize,
    pub last_text_count: usize,
    pub last_polyline_count: usize,
}

impl Renderer for NullRenderer {
    fn render(&mut self, frame: &OverlayFrame) -> AnnotationResult<()> {
        frame.validate()?;
        self.frames_rendered += 1;
        self.last_line_count = frame.lines.len();
        self.last_rect_count = frame.rects.len();
        self.last_text_count = frame.texts.len();
        self.last_polyline_count = frame.polylines.len();
        Ok(())
    }
}
