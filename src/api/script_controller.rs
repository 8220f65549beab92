use tracing::debug;

use crate::core::{Candle, ChartSurface, NativeSeriesHost};
use crate::error::{AnnotationError, AnnotationResult};
use crate::script::{ChartScript, MergedElements, merge_results};

use super::AnnotationEngine;

impl<S: ChartSurface + NativeSeriesHost> AnnotationEngine<S> {
    /// Installs the candle series generators run against.
    ///
    /// Returns `false` and does nothing when the series is unchanged.
    pub fn set_candles(&mut self, candles: Vec<Candle>) -> bool {
        if !self.evaluator.set_candles(candles) {
            return false;
        }
        self.recompute_scripts();
        true
    }

    #[must_use]
    pub fn candles(&self) -> &[Candle] {
        self.evaluator.candles()
    }

    /// Inserts or replaces a script by id, keeping its position on replace.
    pub fn upsert_script(&mut self, script: ChartScript) -> AnnotationResult<()> {
        if script.id.is_empty() {
            return Err(AnnotationError::InvalidData(
                "script id must not be empty".to_owned(),
            ));
        }
        if self.scripts.get(&script.id) == Some(&script) {
            return Ok(());
        }
        debug!(id = %script.id, elements = script.elements.len(), "script upserted");
        self.scripts.insert(script.id.clone(), script.clone());
        self.recompute_scripts();
        self.emit_script_changed(&script);
        Ok(())
    }

    pub fn remove_script(&mut self, id: &str) -> AnnotationResult<ChartScript> {
        let removed = self
            .scripts
            .shift_remove(id)
            .ok_or_else(|| AnnotationError::NotFound(id.to_owned()))?;
        self.evaluator.forget(id);
        self.recompute_scripts();
        self.emit_script_removed(&removed);
        Ok(removed)
    }

    pub fn set_script_visible(&mut self, id: &str, visible: bool) -> AnnotationResult<()> {
        let script = self
            .scripts
            .get_mut(id)
            .ok_or_else(|| AnnotationError::NotFound(id.to_owned()))?;
        if script.visible == visible {
            return Ok(());
        }
        script.visible = visible;
        let script = script.clone();
        self.recompute_scripts();
        self.emit_script_changed(&script);
        Ok(())
    }

    /// Scripts in insertion order.
    pub fn scripts(&self) -> impl Iterator<Item = &ChartScript> {
        self.scripts.values()
    }

    #[must_use]
    pub fn script(&self, id: &str) -> Option<&ChartScript> {
        self.scripts.get(id)
    }

    /// Merged output of every visible script.
    #[must_use]
    pub fn merged_script_elements(&self) -> &MergedElements {
        &self.merged
    }

    /// Number of script evaluations run so far (cache misses).
    #[must_use]
    pub fn script_evaluation_count(&self) -> u64 {
        self.evaluator.evaluation_count()
    }

    pub(super) fn recompute_scripts(&mut self) {
        let visible: Vec<&ChartScript> = self
            .scripts
            .values()
            .filter(|script| script.visible)
            .collect();
        self.evaluator.refresh(visible.iter().copied());
        self.merged = merge_results(
            visible
                .iter()
                .filter_map(|script| self.evaluator.cached(&script.id)),
        );
        self.invalidate();
    }
}
