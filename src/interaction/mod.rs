//! Pointer/keyboard state machine for selecting, placing, moving, resizing
//! and deleting drawings.
//!
//! The machine holds no drawings itself: every mutation goes through the
//! [`DrawingController`] passed into each event handler.
//!
//! With the select tool, pressing an unselected drawing only selects it.
//! Moving starts from a press on the drawing that is already selected;
//! handles of the selected drawing take precedence over the body.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::core::{CoordinateTransform, PixelPoint, Point};
use crate::drawing::{
    AnchorAxes, DEFAULT_HANDLE_RADIUS_PX, Drawing, DrawingController, DrawingKind, DrawingType,
    HitTester, PixelAnchors, PlacementDefaults, geometry, handle_at, pixel_anchors,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragKind {
    Move,
    /// Handle index in the drawing type's handle order.
    Resize(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    Idle,
    Placing,
    Dragging(DragKind),
}

/// Active pointer tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawingTool {
    #[default]
    Select,
    Eraser,
    Draw(DrawingType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Other,
}

/// Where keyboard focus currently sits in the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFocus {
    #[default]
    Chart,
    TextField,
}

/// What a single input event did.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    Ignored,
    Selected(String),
    Deselected,
    DragStarted { id: String, kind: DragKind },
    DrawingUpdated(String),
    /// A drag frame whose conversion or commit failed; nothing changed.
    DragRejected,
    DragEnded(String),
    PlacementProgress { points: usize },
    PlacementDiscarded,
    Created(String),
    Removed(String),
}

/// Source of ids for drawings created by placement gestures.
pub trait IdGenerator {
    fn next_id(&mut self, drawing_type: DrawingType) -> String;
}

/// Default generator producing `drawing-1`, `drawing-2`, ...
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    issued: u64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, _drawing_type: DrawingType) -> String {
        self.issued += 1;
        format!("drawing-{}", self.issued)
    }
}

/// Tuning for the interaction state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionSettings {
    pub hit_tester: HitTester,
    pub handle_radius_px: f64,
    /// Pointer travel separating a click from a click-drag placement.
    pub drag_threshold_px: f64,
    pub min_brush_points: usize,
    /// Initial pixel gap between a new channel's two lines.
    pub channel_offset_px: f64,
    pub placement: PlacementDefaults,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            hit_tester: HitTester::default(),
            handle_radius_px: DEFAULT_HANDLE_RADIUS_PX,
            drag_threshold_px: 3.0,
            min_brush_points: 2,
            channel_offset_px: 40.0,
            placement: PlacementDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DragSession {
    drawing_id: String,
    kind: DragKind,
    origin: PixelPoint,
    anchors: PixelAnchors,
    axes: AnchorAxes,
}

/// In-progress placement of a new drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementSession {
    pub drawing_type: DrawingType,
    pub points: Vec<Point>,
    /// Last cursor position resolved while placing, for preview rendering.
    pub preview: Option<Point>,
    pressed_at: Option<PixelPoint>,
}

#[derive(Debug, Clone, PartialEq, Default)]
enum Session {
    #[default]
    Idle,
    Placing(PlacementSession),
    Dragging(DragSession),
}

pub struct InteractionState {
    tool: DrawingTool,
    selected: Option<String>,
    session: Session,
    settings: InteractionSettings,
    ids: Box<dyn IdGenerator>,
}

impl fmt::Debug for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionState")
            .field("tool", &self.tool)
            .field("selected", &self.selected)
            .field("session", &self.session)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::new(InteractionSettings::default())
    }
}

impl InteractionState {
    #[must_use]
    pub fn new(settings: InteractionSettings) -> Self {
        Self {
            tool: DrawingTool::Select,
            selected: None,
            session: Session::Idle,
            settings,
            ids: Box::new(SequentialIds::default()),
        }
    }

    #[must_use]
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &InteractionSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: InteractionSettings) {
        self.settings = settings;
    }

    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        match &self.session {
            Session::Idle => InteractionMode::Idle,
            Session::Placing(_) => InteractionMode::Placing,
            Session::Dragging(drag) => InteractionMode::Dragging(drag.kind),
        }
    }

    #[must_use]
    pub fn tool(&self) -> DrawingTool {
        self.tool
    }

    /// Switches tool, abandoning any placement or drag in progress.
    pub fn set_tool(&mut self, tool: DrawingTool) {
        self.session = Session::Idle;
        self.tool = tool;
        if matches!(tool, DrawingTool::Draw(_)) {
            self.selected = None;
        }
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, id: Option<String>) {
        self.selected = id;
    }

    #[must_use]
    pub fn placement(&self) -> Option<&PlacementSession> {
        match &self.session {
            Session::Placing(placement) => Some(placement),
            _ => None,
        }
    }

    /// Drops selection and gesture state that refers to a removed drawing.
    pub fn forget(&mut self, id: &str) {
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if matches!(&self.session, Session::Dragging(drag) if drag.drawing_id == id) {
            self.session = Session::Idle;
        }
    }

    pub fn pointer_down(
        &mut self,
        drawings: &mut DrawingController,
        transform: &dyn CoordinateTransform,
        cursor: PixelPoint,
    ) -> InteractionOutcome {
        match &self.session {
            Session::Dragging(_) => InteractionOutcome::Ignored,
            Session::Placing(_) => self.continue_placement(drawings, transform, cursor),
            Session::Idle => match self.tool {
                DrawingTool::Select => self.select_or_start_drag(drawings, transform, cursor),
                DrawingTool::Eraser => self.erase_at(drawings, transform, cursor),
                DrawingTool::Draw(drawing_type) => {
                    self.begin_placement(drawing_type, drawings, transform, cursor)
                }
            },
        }
    }

    pub fn pointer_move(
        &mut self,
        drawings: &mut DrawingController,
        transform: &dyn CoordinateTransform,
        cursor: PixelPoint,
    ) -> InteractionOutcome {
        match &mut self.session {
            Session::Idle => InteractionOutcome::Ignored,
            Session::Placing(placement) => {
                placement.preview = transform.pixel_to_point(cursor);
                // Freehand strokes sample the pointer while it is held down.
                if placement.drawing_type == DrawingType::Brush && placement.pressed_at.is_some() {
                    if let Some(point) = placement.preview {
                        if placement.points.last() != Some(&point) {
                            placement.points.push(point);
                        }
                    }
                }
                InteractionOutcome::PlacementProgress {
                    points: placement.points.len(),
                }
            }
            Session::Dragging(drag) => {
                let outcome = apply_drag(drag, drawings, transform, cursor);
                if !drawings.contains(&drag.drawing_id) {
                    self.session = Session::Idle;
                }
                outcome
            }
        }
    }

    pub fn pointer_up(
        &mut self,
        drawings: &mut DrawingController,
        transform: &dyn CoordinateTransform,
        cursor: PixelPoint,
    ) -> InteractionOutcome {
        match std::mem::take(&mut self.session) {
            Session::Idle => InteractionOutcome::Ignored,
            Session::Dragging(drag) => {
                trace!(id = %drag.drawing_id, "drag ended");
                InteractionOutcome::DragEnded(drag.drawing_id)
            }
            Session::Placing(mut placement) => {
                let dragged_out = placement
                    .pressed_at
                    .take()
                    .is_some_and(|at| at.distance_to(cursor) > self.settings.drag_threshold_px);
                let awaiting_end = placement.drawing_type.placement_points() == Some(2)
                    && placement.points.len() == 1;
                if dragged_out && awaiting_end {
                    if let Some(point) = transform.pixel_to_point(cursor) {
                        placement.points.push(point);
                        return self.complete_placement(placement, drawings, transform);
                    }
                }
                let points = placement.points.len();
                self.session = Session::Placing(placement);
                InteractionOutcome::PlacementProgress { points }
            }
        }
    }

    /// Ends an open-ended placement (brush strokes).
    ///
    /// Strokes shorter than `min_brush_points`, and unfinished fixed-size
    /// placements, are discarded.
    pub fn finish_placement(
        &mut self,
        drawings: &mut DrawingController,
        transform: &dyn CoordinateTransform,
    ) -> InteractionOutcome {
        let Session::Placing(placement) = std::mem::take(&mut self.session) else {
            return InteractionOutcome::Ignored;
        };
        if placement.drawing_type == DrawingType::Brush
            && placement.points.len() >= self.settings.min_brush_points.max(2)
        {
            return self.complete_placement(placement, drawings, transform);
        }
        InteractionOutcome::PlacementDiscarded
    }

    pub fn key_down(
        &mut self,
        key: Key,
        focus: InputFocus,
        drawings: &mut DrawingController,
    ) -> InteractionOutcome {
        if focus == InputFocus::TextField {
            return InteractionOutcome::Ignored;
        }
        match key {
            Key::Delete | Key::Backspace => {
                let Some(id) = self.selected.take() else {
                    return InteractionOutcome::Ignored;
                };
                self.session = Session::Idle;
                match drawings.remove(&id) {
                    Some(_) => InteractionOutcome::Removed(id),
                    None => InteractionOutcome::Ignored,
                }
            }
            // Drags have no cancel gesture; only placements can be abandoned.
            Key::Escape => match self.session {
                Session::Placing(_) => {
                    self.session = Session::Idle;
                    InteractionOutcome::PlacementDiscarded
                }
                _ => InteractionOutcome::Ignored,
            },
            Key::Other => InteractionOutcome::Ignored,
        }
    }

    fn select_or_start_drag(
        &mut self,
        drawings: &DrawingController,
        transform: &dyn CoordinateTransform,
        cursor: PixelPoint,
    ) -> InteractionOutcome {
        let selected = self.selected.as_deref().and_then(|id| drawings.get(id));
        if let Some(drawing) = selected.filter(|drawing| drawing.visible) {
            if let Some(handle) =
                handle_at(drawing, transform, cursor, self.settings.handle_radius_px)
            {
                return self.start_drag(drawing, DragKind::Resize(handle), transform, cursor);
            }
        }

        match drawings.topmost_hit(&self.settings.hit_tester, transform, cursor) {
            Some(drawing) if self.selected.as_deref() == Some(drawing.id.as_str()) => {
                self.start_drag(drawing, DragKind::Move, transform, cursor)
            }
            Some(drawing) => {
                self.selected = Some(drawing.id.clone());
                InteractionOutcome::Selected(drawing.id.clone())
            }
            None => {
                self.selected = None;
                InteractionOutcome::Deselected
            }
        }
    }

    fn start_drag(
        &mut self,
        drawing: &Drawing,
        kind: DragKind,
        transform: &dyn CoordinateTransform,
        cursor: PixelPoint,
    ) -> InteractionOutcome {
        if drawing.locked {
            return InteractionOutcome::Selected(drawing.id.clone());
        }
        let Some(anchors) = pixel_anchors(&drawing.kind, transform) else {
            return InteractionOutcome::Selected(drawing.id.clone());
        };
        trace!(id = %drawing.id, ?kind, "drag started");
        self.session = Session::Dragging(DragSession {
            drawing_id: drawing.id.clone(),
            kind,
            origin: cursor,
            anchors,
            axes: drawing.kind.anchor_axes(),
        });
        InteractionOutcome::DragStarted {
            id: drawing.id.clone(),
            kind,
        }
    }

    fn erase_at(
        &mut self,
        drawings: &mut DrawingController,
        transform: &dyn CoordinateTransform,
        cursor: PixelPoint,
    ) -> InteractionOutcome {
        let hit = drawings
            .topmost_hit(&self.settings.hit_tester, transform, cursor)
            .map(|drawing| drawing.id.clone());
        match hit {
            Some(id) => {
                drawings.remove(&id);
                self.forget(&id);
                InteractionOutcome::Removed(id)
            }
            None => {
                self.selected = None;
                InteractionOutcome::Deselected
            }
        }
    }

    fn begin_placement(
        &mut self,
        drawing_type: DrawingType,
        drawings: &mut DrawingController,
        transform: &dyn CoordinateTransform,
        cursor: PixelPoint,
    ) -> InteractionOutcome {
        let Some(point) = transform.pixel_to_point(cursor) else {
            return InteractionOutcome::Ignored;
        };
        let placement = PlacementSession {
            drawing_type,
            points: vec![point],
            preview: None,
            pressed_at: Some(cursor),
        };
        if drawing_type.placement_points() == Some(1) {
            return self.complete_placement(placement, drawings, transform);
        }
        self.session = Session::Placing(placement);
        InteractionOutcome::PlacementProgress { points: 1 }
    }

    fn continue_placement(
        &mut self,
        drawings: &mut DrawingController,
        transform: &dyn CoordinateTransform,
        cursor: PixelPoint,
    ) -> InteractionOutcome {
        let Some(point) = transform.pixel_to_point(cursor) else {
            return InteractionOutcome::Ignored;
        };
        let Session::Placing(mut placement) = std::mem::take(&mut self.session) else {
            return InteractionOutcome::Ignored;
        };
        placement.points.push(point);
        placement.pressed_at = Some(cursor);
        match placement.drawing_type.placement_points() {
            Some(needed) if placement.points.len() >= needed => {
                self.complete_placement(placement, drawings, transform)
            }
            _ => {
                let points = placement.points.len();
                self.session = Session::Placing(placement);
                InteractionOutcome::PlacementProgress { points }
            }
        }
    }

    fn complete_placement(
        &mut self,
        placement: PlacementSession,
        drawings: &mut DrawingController,
        transform: &dyn CoordinateTransform,
    ) -> InteractionOutcome {
        self.session = Session::Idle;
        let mut defaults = self.settings.placement.clone();
        if placement.drawing_type == DrawingType::Channel {
            if let Some(start) = placement.points.first() {
                defaults.channel_offset = channel_offset(*start, self.settings.channel_offset_px, transform)
                    .unwrap_or(defaults.channel_offset);
            }
        }

        let Some(kind) =
            DrawingKind::from_placement(placement.drawing_type, &placement.points, &defaults)
        else {
            return InteractionOutcome::PlacementDiscarded;
        };
        let id = self.ids.next_id(placement.drawing_type);
        let drawing = Drawing::new(id.clone(), kind).with_style(defaults.style);
        if let Err(err) = drawings.add(drawing) {
            warn!(error = %err, "discarding placed drawing");
            return InteractionOutcome::PlacementDiscarded;
        }
        self.tool = DrawingTool::Select;
        self.selected = Some(id.clone());
        InteractionOutcome::Created(id)
    }
}

/// Price distance of `offset_px` pixels below `start`, negative downwards.
fn channel_offset(start: Point, offset_px: f64, transform: &dyn CoordinateTransform) -> Option<f64> {
    let y = transform.price_to_pixel_y(start.price)?;
    transform
        .pixel_y_to_price(y + offset_px)
        .or_else(|| transform.pixel_y_to_price(y - offset_px))
        .map(|price| price - start.price)
}

fn apply_drag(
    drag: &DragSession,
    drawings: &mut DrawingController,
    transform: &dyn CoordinateTransform,
    cursor: PixelPoint,
) -> InteractionOutcome {
    match drawings.get(&drag.drawing_id) {
        Some(drawing) if !drawing.locked => {}
        _ => return InteractionOutcome::DragRejected,
    }

    let committed = match drag.kind {
        DragKind::Move => {
            let dx = cursor.x - drag.origin.x;
            let dy = cursor.y - drag.origin.y;
            let moved: PixelAnchors = drag
                .anchors
                .iter()
                .map(|anchor| anchor.offset(dx, dy))
                .collect();
            // All anchors convert or the drawing stays put this frame.
            geometry::domain_anchors(&moved, drag.axes, transform)
                .map(|points| drawings.move_anchors(&drag.drawing_id, &points))
        }
        DragKind::Resize(handle) => geometry::pixel_to_anchor(cursor, drag.axes, transform)
            .map(|point| drawings.resize_handle(&drag.drawing_id, handle, point)),
    };

    match committed {
        Some(Ok(())) => InteractionOutcome::DrawingUpdated(drag.drawing_id.clone()),
        Some(Err(err)) => {
            trace!(error = %err, "drag frame rejected");
            InteractionOutcome::DragRejected
        }
        None => InteractionOutcome::DragRejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Viewport, ViewportTransform, VisibleRange};

    fn transform() -> ViewportTransform {
        ViewportTransform::new(
            Viewport::new(1000, 500),
            VisibleRange::new(0.0, 1000.0),
            0.0,
            100.0,
        )
        .expect("transform")
    }

    #[test]
    fn single_click_places_hline_and_returns_to_select() {
        let t = transform();
        let mut drawings = DrawingController::new();
        let mut state = InteractionState::default();
        state.set_tool(DrawingTool::Draw(DrawingType::HLine));

        let outcome = state.pointer_down(&mut drawings, &t, PixelPoint::new(100.0, 250.0));
        assert_eq!(outcome, InteractionOutcome::Created("drawing-1".to_owned()));
        assert_eq!(state.tool(), DrawingTool::Select);
        assert_eq!(state.selected(), Some("drawing-1"));
        assert_eq!(
            drawings.get("drawing-1").map(|d| d.kind.clone()),
            Some(DrawingKind::HLine { price: 50.0 })
        );
    }

    #[test]
    fn escape_discards_placement_but_not_drag() {
        let t = transform();
        let mut drawings = DrawingController::new();
        let mut state = InteractionState::default();
        state.set_tool(DrawingTool::Draw(DrawingType::TrendLine));

        state.pointer_down(&mut drawings, &t, PixelPoint::new(100.0, 100.0));
        state.pointer_up(&mut drawings, &t, PixelPoint::new(100.0, 100.0));
        assert_eq!(state.mode(), InteractionMode::Placing);
        assert_eq!(
            state.key_down(Key::Escape, InputFocus::Chart, &mut drawings),
            InteractionOutcome::PlacementDiscarded
        );
        assert_eq!(state.mode(), InteractionMode::Idle);
        assert!(drawings.is_empty());

        drawings
            .add(Drawing::new("h", DrawingKind::HLine { price: 50.0 }))
            .expect("add");
        state.set_tool(DrawingTool::Select);
        state.select(Some("h".to_owned()));
        state.pointer_down(&mut drawings, &t, PixelPoint::new(400.0, 250.0));
        assert_eq!(state.mode(), InteractionMode::Dragging(DragKind::Move));
        assert_eq!(
            state.key_down(Key::Escape, InputFocus::Chart, &mut drawings),
            InteractionOutcome::Ignored
        );
        assert_eq!(state.mode(), InteractionMode::Dragging(DragKind::Move));
    }

    #[test]
    fn delete_is_ignored_while_text_field_has_focus() {
        let t = transform();
        let mut drawings = DrawingController::new();
        drawings
            .add(Drawing::new("h", DrawingKind::HLine { price: 50.0 }))
            .expect("add");
        let mut state = InteractionState::default();
        state.pointer_down(&mut drawings, &t, PixelPoint::new(500.0, 250.0));
        state.pointer_up(&mut drawings, &t, PixelPoint::new(500.0, 250.0));

        assert_eq!(
            state.key_down(Key::Backspace, InputFocus::TextField, &mut drawings),
            InteractionOutcome::Ignored
        );
        assert!(drawings.contains("h"));
        assert_eq!(
            state.key_down(Key::Delete, InputFocus::Chart, &mut drawings),
            InteractionOutcome::Removed("h".to_owned())
        );
        assert!(drawings.is_empty());
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn short_brush_stroke_is_discarded() {
        let t = transform();
        let mut drawings = DrawingController::new();
        let mut state = InteractionState::default();
        state.set_tool(DrawingTool::Draw(DrawingType::Brush));

        state.pointer_down(&mut drawings, &t, PixelPoint::new(10.0, 10.0));
        assert_eq!(
            state.finish_placement(&mut drawings, &t),
            InteractionOutcome::PlacementDiscarded
        );
        assert!(drawings.is_empty());
    }
}
