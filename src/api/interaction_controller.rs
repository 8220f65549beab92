use tracing::trace;

use crate::core::{ChartSurface, NativeSeriesHost, PixelPoint};
use crate::drawing::Drawing;
use crate::interaction::{DrawingTool, InputFocus, InteractionMode, InteractionOutcome, Key};

use super::AnnotationEngine;

impl<S: ChartSurface + NativeSeriesHost> AnnotationEngine<S> {
    pub fn set_tool(&mut self, tool: DrawingTool) {
        let had_placement = self.interaction.placement().is_some();
        self.interaction.set_tool(tool);
        if had_placement {
            self.invalidate();
        }
    }

    #[must_use]
    pub fn tool(&self) -> DrawingTool {
        self.interaction.tool()
    }

    #[must_use]
    pub fn interaction_mode(&self) -> InteractionMode {
        self.interaction.mode()
    }

    #[must_use]
    pub fn selected_drawing(&self) -> Option<&Drawing> {
        self.interaction
            .selected()
            .and_then(|id| self.drawings.get(id))
    }

    /// Selects a drawing programmatically; `None` clears the selection.
    pub fn select_drawing(&mut self, id: Option<&str>) -> bool {
        let id = id.filter(|id| self.drawings.contains(id));
        let changed = self.interaction.selected() != id;
        self.interaction.select(id.map(str::to_owned));
        if changed {
            self.invalidate();
        }
        changed
    }

    /// Pointer press in surface pixel coordinates.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> InteractionOutcome {
        let outcome =
            self.interaction
                .pointer_down(&mut self.drawings, &self.surface, PixelPoint::new(x, y));
        self.after_interaction(outcome)
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> InteractionOutcome {
        let outcome =
            self.interaction
                .pointer_move(&mut self.drawings, &self.surface, PixelPoint::new(x, y));
        self.after_interaction(outcome)
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) -> InteractionOutcome {
        let outcome =
            self.interaction
                .pointer_up(&mut self.drawings, &self.surface, PixelPoint::new(x, y));
        self.after_interaction(outcome)
    }

    pub fn key_down(&mut self, key: Key, focus: InputFocus) -> InteractionOutcome {
        let outcome = self.interaction.key_down(key, focus, &mut self.drawings);
        self.after_interaction(outcome)
    }

    /// Completes an open-ended placement such as a brush stroke.
    pub fn finish_placement(&mut self) -> InteractionOutcome {
        let outcome = self
            .interaction
            .finish_placement(&mut self.drawings, &self.surface);
        self.after_interaction(outcome)
    }

    fn after_interaction(&mut self, outcome: InteractionOutcome) -> InteractionOutcome {
        if outcome != InteractionOutcome::Ignored {
            trace!(?outcome, "interaction");
            self.invalidate();
        }
        self.flush_drawing_changes();
        outcome
    }
}
