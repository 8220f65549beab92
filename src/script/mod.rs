//! Declarative chart scripts: element model, generators, evaluation and
//! cross-script merging.

pub mod engine;
pub mod generators;
pub mod markers;
pub mod merge;
pub mod model;

pub use engine::{EvaluationResult, ScriptEvaluator, evaluate};
pub use generators::{DayLevels, daily_levels, prev_day_levels, session_vlines};
pub use markers::{
    MarkerLabelGeometry, MarkerPlacementConfig, MarkerSide, PlacedMarker, place_markers,
};
pub use merge::{MergedElements, merge_results};
pub use model::{
    BoxElement, ChartScript, HLineElement, LabelElement, LineElement, MarkerElement,
    MarkerPosition, MarkerShape, PrevDayLevelsConfig, ScriptElement, ScriptGenerator,
    SessionVlinesConfig, ShadeElement, VLineElement,
};
