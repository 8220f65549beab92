use tracing::debug;

use crate::core::{ChartSurface, NativeSeriesHost};
use crate::drawing::Drawing;
use crate::error::{AnnotationError, AnnotationResult};

use super::AnnotationEngine;

impl<S: ChartSurface + NativeSeriesHost> AnnotationEngine<S> {
    /// Adds a drawing on top of the z-order.
    pub fn add_drawing(&mut self, drawing: Drawing) -> AnnotationResult<()> {
        let result = self.drawings.add(drawing);
        self.flush_drawing_changes();
        result
    }

    /// Replaces a drawing by id. Locked drawings accept style/flag edits only.
    pub fn update_drawing(&mut self, drawing: Drawing) -> AnnotationResult<()> {
        let result = self.drawings.update(drawing);
        self.flush_drawing_changes();
        result
    }

    /// Removes a drawing, clearing selection and gestures that referenced it.
    pub fn remove_drawing(&mut self, id: &str) -> AnnotationResult<Drawing> {
        let removed = self
            .drawings
            .remove(id)
            .ok_or_else(|| AnnotationError::NotFound(id.to_owned()))?;
        self.interaction.forget(id);
        self.flush_drawing_changes();
        Ok(removed)
    }

    /// Removes every drawing; returns how many were removed.
    pub fn clear_drawings(&mut self) -> usize {
        let count = self.drawings.len();
        self.drawings.clear();
        self.interaction.select(None);
        self.flush_drawing_changes();
        debug!(count, "cleared drawings");
        count
    }

    pub fn set_drawing_visible(&mut self, id: &str, visible: bool) -> AnnotationResult<()> {
        let result = self.drawings.set_visible(id, visible);
        self.flush_drawing_changes();
        result
    }

    pub fn set_drawing_locked(&mut self, id: &str, locked: bool) -> AnnotationResult<()> {
        let result = self.drawings.set_locked(id, locked);
        self.flush_drawing_changes();
        result
    }

    pub fn bring_drawing_to_front(&mut self, id: &str) -> AnnotationResult<()> {
        let result = self.drawings.bring_to_front(id);
        self.flush_drawing_changes();
        result
    }

    #[must_use]
    pub fn drawing(&self, id: &str) -> Option<&Drawing> {
        self.drawings.get(id)
    }
}
