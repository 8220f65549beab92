//! Bridges script output to the chart surface: native series reconciliation
//! and per-frame coalescing of range notifications.

pub mod reconciler;
pub mod scheduler;

pub use reconciler::{OverlayReconciler, ReconcileReport, native_series_config};
pub use scheduler::{FrameCoalescer, FrameWork, SharedCoalescer};
