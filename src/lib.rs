//! chart-annotations: interactive drawing overlays and declarative chart
//! scripts for price/time charts.
//!
//! The crate never draws candles or axes itself. It consumes a
//! [`core::CoordinateTransform`] and a [`core::ChartSurface`] from the host
//! chart, owns the drawing and script sets, and emits renderer-agnostic
//! [`render::OverlayFrame`]s plus native line series for script output.

pub mod api;
pub mod core;
pub mod drawing;
pub mod error;
pub mod interaction;
pub mod overlay;
pub mod render;
pub mod script;
pub mod telemetry;

pub use api::{AnnotationEngine, AnnotationObserver, OverlayConfig};
pub use drawing::{Drawing, DrawingController, DrawingKind, DrawingStyle, DrawingType};
pub use error::{AnnotationError, AnnotationResult};
pub use interaction::{DrawingTool, InputFocus, InteractionOutcome, Key};
pub use script::{ChartScript, ScriptElement, ScriptGenerator};
