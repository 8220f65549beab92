use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

#[cfg(feature = "parallel-evaluation")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::Candle;
use crate::script::generators::{prev_day_levels, session_vlines};
use crate::script::model::{
    BoxElement, ChartScript, HLineElement, LabelElement, LineElement, MarkerElement,
    ScriptElement, ScriptGenerator, ShadeElement, VLineElement,
};

/// Script output bucketed by element type.
///
/// Static elements come first in declaration order, followed by generator
/// output in generator order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub lines: Vec<LineElement>,
    pub hlines: Vec<HLineElement>,
    pub vlines: Vec<VLineElement>,
    pub boxes: Vec<BoxElement>,
    pub markers: Vec<MarkerElement>,
    pub labels: Vec<LabelElement>,
    pub shades: Vec<ShadeElement>,
}

impl EvaluationResult {
    pub fn push(&mut self, element: ScriptElement) {
        match element {
            ScriptElement::Line(element) => self.lines.push(element),
            ScriptElement::HLine(element) => self.hlines.push(element),
            ScriptElement::VLine(element) => self.vlines.push(element),
            ScriptElement::Box(element) => self.boxes.push(element),
            ScriptElement::Marker(element) => self.markers.push(element),
            ScriptElement::Label(element) => self.labels.push(element),
            ScriptElement::Shade(element) => self.shades.push(element),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
            + self.hlines.len()
            + self.vlines.len()
            + self.boxes.len()
            + self.markers.len()
            + self.labels.len()
            + self.shades.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Evaluates one script against a candle series.
///
/// Deterministic: identical inputs always produce identical output.
#[must_use]
pub fn evaluate(script: &ChartScript, candles: &[Candle]) -> EvaluationResult {
    let mut result = EvaluationResult::default();
    for element in &script.elements {
        result.push(element.clone());
    }

    let mut session_times = HashSet::new();
    for generator in &script.generators {
        match generator {
            ScriptGenerator::SessionVlines(config) => {
                let vlines = session_vlines(&script.id, config, candles);
                result.vlines.extend(
                    vlines
                        .into_iter()
                        .filter(|vline| session_times.insert(vline.time)),
                );
            }
            ScriptGenerator::PrevDayLevels(config) => {
                result
                    .hlines
                    .extend(prev_day_levels(&script.id, config, candles));
            }
        }
    }

    trace!(script = %script.id, elements = result.len(), "script evaluated");
    result
}

#[derive(Debug, Clone)]
struct CachedEvaluation {
    elements: Vec<ScriptElement>,
    generators: Vec<ScriptGenerator>,
    result: EvaluationResult,
}

impl CachedEvaluation {
    fn new(script: &ChartScript, result: EvaluationResult) -> Self {
        Self {
            elements: script.elements.clone(),
            generators: script.generators.clone(),
            result,
        }
    }

    fn is_fresh_for(&self, script: &ChartScript) -> bool {
        self.elements == script.elements && self.generators == script.generators
    }
}

/// Memoising evaluator owning the current candle series.
///
/// A script is re-evaluated only when its elements or generators change, or
/// when a structurally different candle series is installed.
#[derive(Debug, Clone, Default)]
pub struct ScriptEvaluator {
    candles: Vec<Candle>,
    cache: HashMap<String, CachedEvaluation>,
    evaluations: u64,
}

impl ScriptEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Installs a candle series; returns `false` when it equals the current one.
    pub fn set_candles(&mut self, candles: Vec<Candle>) -> bool {
        if self.candles == candles {
            return false;
        }
        debug!(count = candles.len(), "candle series replaced");
        self.candles = candles;
        self.cache.clear();
        true
    }

    /// Number of evaluations actually run (cache misses).
    #[must_use]
    pub fn evaluation_count(&self) -> u64 {
        self.evaluations
    }

    #[must_use]
    pub fn cached(&self, script_id: &str) -> Option<&EvaluationResult> {
        self.cache.get(script_id).map(|cached| &cached.result)
    }

    pub fn forget(&mut self, script_id: &str) {
        self.cache.remove(script_id);
    }

    pub fn evaluate(&mut self, script: &ChartScript) -> &EvaluationResult {
        let cached = match self.cache.entry(script.id.clone()) {
            Entry::Occupied(entry) if entry.get().is_fresh_for(script) => entry.into_mut(),
            Entry::Occupied(mut entry) => {
                self.evaluations += 1;
                entry.insert(CachedEvaluation::new(script, evaluate(script, &self.candles)));
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.evaluations += 1;
                entry.insert(CachedEvaluation::new(script, evaluate(script, &self.candles)))
            }
        };
        &cached.result
    }

    /// Refreshes every stale script in one pass.
    ///
    /// With the `parallel-evaluation` feature stale scripts are evaluated on
    /// the rayon pool; results are identical to sequential evaluation.
    pub fn refresh<'a>(&mut self, scripts: impl IntoIterator<Item = &'a ChartScript>) {
        let stale: Vec<&ChartScript> = scripts
            .into_iter()
            .filter(|script| {
                !self
                    .cache
                    .get(&script.id)
                    .is_some_and(|cached| cached.is_fresh_for(script))
            })
            .collect();
        if stale.is_empty() {
            return;
        }

        let results = evaluate_batch(&stale, &self.candles);
        self.evaluations += results.len() as u64;
        for (script, result) in stale.into_iter().zip(results) {
            self.cache
                .insert(script.id.clone(), CachedEvaluation::new(script, result));
        }
    }
}

#[cfg(feature = "parallel-evaluation")]
fn evaluate_batch(scripts: &[&ChartScript], candles: &[Candle]) -> Vec<EvaluationResult> {
    scripts
        .par_iter()
        .map(|script| evaluate(script, candles))
        .collect()
}

#[cfg(not(feature = "parallel-evaluation"))]
fn evaluate_batch(scripts: &[&ChartScript], candles: &[Candle]) -> Vec<EvaluationResult> {
    scripts
        .iter()
        .map(|script| evaluate(script, candles))
        .collect()
}
