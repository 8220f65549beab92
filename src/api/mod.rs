//! Host-facing controller wiring drawings, interaction, scripts and the
//! native overlay to one chart surface.

mod drawing_controller;
mod engine_config;
mod interaction_controller;
mod json_contract;
mod observers;
mod render_coordinator;
mod script_controller;

pub use engine_config::OverlayConfig;
pub use json_contract::{
    DRAWING_SET_JSON_SCHEMA_V1, DrawingSetJsonContractV1, SCRIPT_SET_JSON_SCHEMA_V1,
    ScriptSetJsonContractV1,
};
pub use observers::AnnotationObserver;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::core::{ChartSurface, NativeSeriesHost, SubscriptionId};
use crate::drawing::DrawingController;
use crate::error::AnnotationResult;
use crate::interaction::InteractionState;
use crate::overlay::{FrameCoalescer, OverlayReconciler, ReconcileReport, SharedCoalescer};
use crate::render::FrameStyle;
use crate::script::{ChartScript, MergedElements, ScriptEvaluator};

/// Annotation engine bound to one chart surface.
///
/// Owns the canonical drawing set and script list; hosts forward input
/// events, candle updates and animation frames, and persist through
/// [`AnnotationObserver`] notifications.
pub struct AnnotationEngine<S: ChartSurface + NativeSeriesHost> {
    surface: S,
    config: OverlayConfig,
    frame_style: FrameStyle,
    drawings: DrawingController,
    interaction: InteractionState,
    scripts: IndexMap<String, ChartScript>,
    evaluator: ScriptEvaluator,
    merged: MergedElements,
    reconciler: OverlayReconciler<S::Handle>,
    coalescer: SharedCoalescer,
    subscription: Option<SubscriptionId>,
    observers: Vec<Box<dyn AnnotationObserver>>,
    last_reconcile: ReconcileReport,
}

impl<S: ChartSurface + NativeSeriesHost> AnnotationEngine<S> {
    /// Validates `config` and subscribes to the surface's range changes.
    pub fn new(mut surface: S, config: OverlayConfig) -> AnnotationResult<Self> {
        config.validate()?;
        let coalescer = FrameCoalescer::shared();
        let subscription =
            surface.subscribe_visible_range_change(FrameCoalescer::listener(&coalescer))?;
        coalescer.borrow_mut().invalidate_content();
        debug!(subscription = subscription.0, "annotation engine attached");

        Ok(Self {
            surface,
            interaction: InteractionState::new(config.interaction_settings()),
            frame_style: config.frame_style(),
            config,
            drawings: DrawingController::new(),
            scripts: IndexMap::new(),
            evaluator: ScriptEvaluator::new(),
            merged: MergedElements::default(),
            reconciler: OverlayReconciler::new(),
            coalescer,
            subscription: Some(subscription),
            observers: Vec::new(),
            last_reconcile: ReconcileReport::default(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Replaces tuning; the interaction state keeps its tool and selection.
    pub fn set_config(&mut self, config: OverlayConfig) -> AnnotationResult<()> {
        config.validate()?;
        self.interaction.set_settings(config.interaction_settings());
        self.frame_style = config.frame_style();
        self.config = config;
        self.invalidate();
        Ok(())
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable surface access for hosts driving pan/zoom themselves.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub fn drawings(&self) -> &DrawingController {
        &self.drawings
    }

    #[must_use]
    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Detaches from the surface and removes every native series.
    ///
    /// Teardown failures are logged; the engine ends detached either way.
    pub fn shutdown(&mut self) -> ReconcileReport {
        if let Some(subscription) = self.subscription.take() {
            self.surface.unsubscribe_visible_range_change(subscription);
        }
        let report = self.reconciler.clear(&mut self.surface);
        if !report.is_clean() {
            warn!(failed = report.failed.len(), "native series teardown incomplete");
        }
        debug!(removed = report.removed.len(), "annotation engine detached");
        report
    }

    fn invalidate(&self) {
        self.coalescer.borrow_mut().invalidate_content();
    }
}
