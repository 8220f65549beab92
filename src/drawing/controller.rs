use tracing::{debug, trace};

use crate::core::{CoordinateTransform, PixelPoint, Point};
use crate::drawing::geometry::HitTester;
use crate::drawing::model::Drawing;
use crate::error::{AnnotationError, AnnotationResult};

/// Mutation recorded by [`DrawingController`] for the persistence collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingChange {
    Created(Drawing),
    Updated(Drawing),
    Removed(Drawing),
}

/// Canonical in-memory drawing set.
///
/// Order is z-order: later drawings render on top and win hit-testing. All
/// mutation goes through this type so id uniqueness and the lock rule are
/// enforced in one place.
#[derive(Debug, Clone, Default)]
pub struct DrawingController {
    drawings: Vec<Drawing>,
    changes: Vec<DrawingChange>,
}

impl DrawingController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a persisted set without recording changes.
    pub fn from_drawings(drawings: Vec<Drawing>) -> AnnotationResult<Self> {
        let mut controller = Self::new();
        for drawing in drawings {
            controller.insert_validated(drawing)?;
        }
        debug!(count = controller.drawings.len(), "restored drawing set");
        Ok(controller)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }

    #[must_use]
    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    pub fn iter(&self) -> impl Iterator<Item = &Drawing> {
        self.drawings.iter()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Drawing> {
        self.drawings.iter().find(|drawing| drawing.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.drawings.iter().position(|drawing| drawing.id == id)
    }

    fn position_or_err(&self, id: &str) -> AnnotationResult<usize> {
        self.position(id)
            .ok_or_else(|| AnnotationError::NotFound(id.to_owned()))
    }

    fn insert_validated(&mut self, drawing: Drawing) -> AnnotationResult<()> {
        drawing.validate()?;
        if self.contains(&drawing.id) {
            return Err(AnnotationError::DuplicateId(drawing.id));
        }
        self.drawings.push(drawing);
        Ok(())
    }

    /// Appends a drawing on top of the stack.
    pub fn add(&mut self, drawing: Drawing) -> AnnotationResult<()> {
        self.insert_validated(drawing.clone())?;
        trace!(id = %drawing.id, kind = ?drawing.drawing_type(), "drawing created");
        self.changes.push(DrawingChange::Created(drawing));
        Ok(())
    }

    /// Replaces a drawing by id, keeping its z-position.
    ///
    /// Geometry of a locked drawing cannot change; style and flags can.
    pub fn update(&mut self, drawing: Drawing) -> AnnotationResult<()> {
        drawing.validate()?;
        let index = self.position_or_err(&drawing.id)?;
        let current = &self.drawings[index];
        if current.locked && current.kind != drawing.kind {
            return Err(AnnotationError::Locked(drawing.id));
        }
        self.commit(index, drawing);
        Ok(())
    }

    /// Removes a drawing; returns it when it existed.
    pub fn remove(&mut self, id: &str) -> Option<Drawing> {
        let index = self.position(id)?;
        let removed = self.drawings.remove(index);
        trace!(id = %removed.id, "drawing removed");
        self.changes.push(DrawingChange::Removed(removed.clone()));
        Some(removed)
    }

    /// Removes every drawing, recording one change per drawing.
    pub fn clear(&mut self) {
        for drawing in std::mem::take(&mut self.drawings) {
            self.changes.push(DrawingChange::Removed(drawing));
        }
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) -> AnnotationResult<()> {
        self.edit_flags(id, |drawing| drawing.visible = visible)
    }

    pub fn set_locked(&mut self, id: &str, locked: bool) -> AnnotationResult<()> {
        self.edit_flags(id, |drawing| drawing.locked = locked)
    }

    fn edit_flags(&mut self, id: &str, edit: impl FnOnce(&mut Drawing)) -> AnnotationResult<()> {
        let index = self.position_or_err(id)?;
        let mut drawing = self.drawings[index].clone();
        edit(&mut drawing);
        if drawing != self.drawings[index] {
            self.commit(index, drawing);
        }
        Ok(())
    }

    /// Moves a drawing to the top of the z-order.
    pub fn bring_to_front(&mut self, id: &str) -> AnnotationResult<()> {
        let index = self.position_or_err(id)?;
        let drawing = self.drawings.remove(index);
        self.drawings.push(drawing.clone());
        self.changes.push(DrawingChange::Updated(drawing));
        Ok(())
    }

    /// Overwrites all anchors at once (move gesture).
    pub fn move_anchors(&mut self, id: &str, anchors: &[Point]) -> AnnotationResult<()> {
        let index = self.unlocked_index(id)?;
        let mut drawing = self.drawings[index].clone();
        drawing.translate_to(anchors)?;
        drawing.validate()?;
        if drawing != self.drawings[index] {
            self.commit(index, drawing);
        }
        Ok(())
    }

    /// Applies one resize handle (resize gesture).
    pub fn resize_handle(&mut self, id: &str, handle: usize, point: Point) -> AnnotationResult<()> {
        let index = self.unlocked_index(id)?;
        let mut drawing = self.drawings[index].clone();
        if !drawing.kind.resize_handle(handle, point) {
            return Err(AnnotationError::InvalidData(format!(
                "drawing `{id}` has no resize handle {handle}"
            )));
        }
        drawing.validate()?;
        if drawing != self.drawings[index] {
            self.commit(index, drawing);
        }
        Ok(())
    }

    fn unlocked_index(&self, id: &str) -> AnnotationResult<usize> {
        let index = self.position_or_err(id)?;
        if self.drawings[index].locked {
            return Err(AnnotationError::Locked(id.to_owned()));
        }
        Ok(index)
    }

    fn commit(&mut self, index: usize, drawing: Drawing) {
        self.drawings[index] = drawing.clone();
        self.changes.push(DrawingChange::Updated(drawing));
    }

    /// Topmost visible drawing under the cursor.
    #[must_use]
    pub fn topmost_hit(
        &self,
        hit_tester: &HitTester,
        transform: &dyn CoordinateTransform,
        cursor: PixelPoint,
    ) -> Option<&Drawing> {
        hit_tester
            .topmost(&self.drawings, transform, cursor)
            .map(|index| &self.drawings[index])
    }

    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Drains the change log in mutation order.
    pub fn take_changes(&mut self) -> Vec<DrawingChange> {
        std::mem::take(&mut self.changes)
    }
}
