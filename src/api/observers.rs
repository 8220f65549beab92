use crate::core::{ChartSurface, NativeSeriesHost};
use crate::drawing::{Drawing, DrawingChange};
use crate::error::{AnnotationError, AnnotationResult};
use crate::script::ChartScript;

use super::AnnotationEngine;

/// Fire-and-forget notifications for the authoring/persistence collaborator.
///
/// Observers see the engine's canonical values after each mutation and
/// cannot mutate engine state from the callbacks.
pub trait AnnotationObserver {
    fn id(&self) -> &str;

    fn on_drawing_created(&mut self, _drawing: &Drawing) {}

    fn on_drawing_updated(&mut self, _drawing: &Drawing) {}

    fn on_drawing_removed(&mut self, _drawing: &Drawing) {}

    fn on_script_changed(&mut self, _script: &ChartScript) {}

    fn on_script_removed(&mut self, _script: &ChartScript) {}
}

impl<S: ChartSurface + NativeSeriesHost> AnnotationEngine<S> {
    /// Registers an observer. Ids must be non-empty and unique.
    pub fn register_observer(&mut self, observer: Box<dyn AnnotationObserver>) -> AnnotationResult<()> {
        let observer_id = observer.id().to_owned();
        if observer_id.is_empty() {
            return Err(AnnotationError::InvalidData(
                "observer id must not be empty".to_owned(),
            ));
        }
        if self.has_observer(&observer_id) {
            return Err(AnnotationError::DuplicateId(observer_id));
        }
        self.observers.push(observer);
        Ok(())
    }

    /// Unregisters an observer by id. Returns `true` when removed.
    pub fn unregister_observer(&mut self, observer_id: &str) -> bool {
        if let Some(position) = self
            .observers
            .iter()
            .position(|observer| observer.id() == observer_id)
        {
            self.observers.remove(position);
            return true;
        }
        false
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn has_observer(&self, observer_id: &str) -> bool {
        self.observers
            .iter()
            .any(|observer| observer.id() == observer_id)
    }

    /// Drains the drawing change log to observers and schedules a redraw.
    pub(super) fn flush_drawing_changes(&mut self) {
        let changes = self.drawings.take_changes();
        if changes.is_empty() {
            return;
        }
        self.invalidate();
        for change in &changes {
            for observer in &mut self.observers {
                match change {
                    DrawingChange::Created(drawing) => observer.on_drawing_created(drawing),
                    DrawingChange::Updated(drawing) => observer.on_drawing_updated(drawing),
                    DrawingChange::Removed(drawing) => observer.on_drawing_removed(drawing),
                }
            }
        }
    }

    pub(super) fn emit_script_changed(&mut self, script: &ChartScript) {
        for observer in &mut self.observers {
            observer.on_script_changed(script);
        }
    }

    pub(super) fn emit_script_removed(&mut self, script: &ChartScript) {
        for observer in &mut self.observers {
            observer.on_script_removed(script);
        }
    }
}
