mod builder;
mod frame;
mod null_renderer;
mod primitives;

pub use builder::{FrameInputs, FrameStyle, build_overlay_frame};
pub use frame::OverlayFrame;
pub use null_renderer::NullRenderer;
pub use primitives::{
    Color, LinePrimitive, LineStrokeStyle, PolylinePrimitive, RectPrimitive, TextHAlign,
    TextPrimitive,
};

use crate::error::AnnotationResult;

/// Contract implemented by any 2D drawing backend.
///
/// Backends receive a fully materialized `OverlayFrame` so drawing code
/// stays isolated from the annotation model and interaction logic.
pub trait Renderer {
    fn render(&mut self, frame: &OverlayFrame) -> AnnotationResult<()>;
}
