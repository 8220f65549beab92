//! User-placed drawings: data model, pixel geometry and the owned drawing set.

pub mod controller;
pub mod geometry;
pub mod model;

pub use controller::{DrawingChange, DrawingController};
pub use geometry::{
    DEFAULT_HANDLE_RADIUS_PX, DEFAULT_HIT_THRESHOLD_PX, DrawingGeometry, FibLevelLine, HitTester,
    PixelAnchors, PixelRect, PixelSegment, TextMetrics, distance_to_segment, drawing_geometry,
    fib_level_price, handle_at, pixel_anchors, point_in_polygon, resize_handles,
};
pub use model::{
    AnchorAxes, DEFAULT_DRAWING_COLOR, DEFAULT_FIB_LEVELS, Drawing, DrawingKind, DrawingStyle,
    DrawingType, MeasureStats, PlacementDefaults,
};
