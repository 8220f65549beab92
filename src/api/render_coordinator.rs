use tracing::{debug, trace};

use crate::core::{ChartSurface, NativeSeriesHost, VisibleRange};
use crate::drawing::{Drawing, DrawingKind};
use crate::error::AnnotationResult;
use crate::overlay::{FrameWork, ReconcileReport};
use crate::render::{FrameInputs, OverlayFrame, Renderer, build_overlay_frame};

use super::AnnotationEngine;

const PREVIEW_ID: &str = "__placement-preview";

impl<S: ChartSurface + NativeSeriesHost> AnnotationEngine<S> {
    /// Records a visible-range change reported outside the surface
    /// subscription. Folded into the next animation frame.
    pub fn request_visible_range_change(&mut self, range: VisibleRange) {
        self.coalescer.borrow_mut().notify_visible_range(range);
    }

    /// Whether the next animation frame has work to do.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.coalescer.borrow().is_pending()
    }

    /// Runs the coalesced work for one animation frame.
    ///
    /// Native series are reconciled at most once here no matter how many
    /// range notifications arrived. Returns `None` when nothing was pending.
    pub fn on_animation_frame(&mut self) -> Option<FrameWork> {
        let work = self.coalescer.borrow_mut().take()?;
        if !self.surface.is_alive() {
            debug!("surface disposed; skipping reconcile");
            return Some(work);
        }
        self.last_reconcile = self.reconciler.reconcile(&mut self.surface, &self.merged.lines);
        trace!(
            notifications = work.coalesced_notifications,
            content_changed = work.content_changed,
            native_series = self.reconciler.len(),
            "animation frame"
        );
        Some(work)
    }

    /// Report from the most recent reconcile pass.
    #[must_use]
    pub fn last_reconcile_report(&self) -> &ReconcileReport {
        &self.last_reconcile
    }

    #[must_use]
    pub fn native_series_count(&self) -> usize {
        self.reconciler.len()
    }

    /// Materializes the overlay for the current surface state.
    ///
    /// `None` when the surface cannot resolve a viewport (disposed or not
    /// laid out yet).
    #[must_use]
    pub fn build_frame(&self) -> Option<OverlayFrame> {
        if !self.surface.is_alive() {
            return None;
        }
        let preview = self.placement_preview();
        let inputs = FrameInputs {
            drawings: self.drawings.drawings(),
            selected: self.interaction.selected(),
            preview: preview.as_ref(),
            scripts: &self.merged,
            candles: self.evaluator.candles(),
        };
        build_overlay_frame(&inputs, &self.surface, &self.frame_style)
    }

    /// Builds and renders one frame. Returns `false` when nothing could be
    /// built for the current surface state.
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R) -> AnnotationResult<bool> {
        let Some(frame) = self.build_frame() else {
            return Ok(false);
        };
        renderer.render(&frame)?;
        Ok(true)
    }

    fn placement_preview(&self) -> Option<Drawing> {
        let placement = self.interaction.placement()?;
        let mut points = placement.points.clone();
        if let Some(cursor) = placement.preview {
            if points.last() != Some(&cursor) {
                points.push(cursor);
            }
        }
        let defaults = &self.interaction.settings().placement;
        let kind = DrawingKind::from_placement(placement.drawing_type, &points, defaults)?;
        Some(Drawing::new(PREVIEW_ID, kind).with_style(defaults.style.clone()))
    }
}
