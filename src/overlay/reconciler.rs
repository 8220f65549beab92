use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::core::{NativeSeriesConfig, NativeSeriesHost};
use crate::drawing::DEFAULT_DRAWING_COLOR;
use crate::script::LineElement;

const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub removed: Vec<String>,
    pub pushed: Vec<String>,
    /// Element ids whose create, remove or push failed this pass.
    pub failed: Vec<String>,
}

impl ReconcileReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
struct RealizedSeries<H> {
    handle: H,
    config: NativeSeriesConfig,
}

/// Keeps native chart series in sync with the current set of script lines.
///
/// Each element is processed independently: a failing create/remove/push
/// is logged and skipped, and a missing series is retried on the next pass.
#[derive(Debug, Clone)]
pub struct OverlayReconciler<H> {
    realized: IndexMap<String, RealizedSeries<H>>,
}

impl<H> Default for OverlayReconciler<H> {
    fn default() -> Self {
        Self {
            realized: IndexMap::new(),
        }
    }
}

/// Native series configuration derived from a script line.
#[must_use]
pub fn native_series_config(line: &LineElement) -> NativeSeriesConfig {
    NativeSeriesConfig {
        id: line.id.clone(),
        color: line
            .color
            .clone()
            .unwrap_or_else(|| DEFAULT_DRAWING_COLOR.to_owned()),
        line_width: line
            .line_width
            .filter(|width| width.is_finite() && *width > 0.0)
            .unwrap_or(DEFAULT_LINE_WIDTH),
        line_style: line.line_style,
    }
}

impl<H: Clone + std::fmt::Debug> OverlayReconciler<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.realized.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.realized.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.realized.contains_key(id)
    }

    #[must_use]
    pub fn handle(&self, id: &str) -> Option<&H> {
        self.realized.get(id).map(|series| &series.handle)
    }

    pub fn reconcile<S>(&mut self, host: &mut S, lines: &[LineElement]) -> ReconcileReport
    where
        S: NativeSeriesHost<Handle = H> + ?Sized,
    {
        let mut report = ReconcileReport::default();

        let stale: Vec<String> = self
            .realized
            .keys()
            .filter(|id| !lines.iter().any(|line| &line.id == *id))
            .cloned()
            .collect();
        for id in stale {
            if let Some(series) = self.realized.shift_remove(&id) {
                remove_series(host, &id, &series.handle, &mut report);
            }
        }

        for line in lines {
            let config = native_series_config(line);
            let outdated = self
                .realized
                .get(&line.id)
                .is_some_and(|series| series.config != config);
            if outdated {
                if let Some(series) = self.realized.shift_remove(&line.id) {
                    remove_series(host, &line.id, &series.handle, &mut report);
                }
            }

            if !self.realized.contains_key(&line.id) {
                match host.create_native_series(&config) {
                    Ok(handle) => {
                        report.created.push(line.id.clone());
                        self.realized
                            .insert(line.id.clone(), RealizedSeries { handle, config });
                    }
                    Err(err) => {
                        warn!(id = %line.id, error = %err, "native series creation failed");
                        report.failed.push(line.id.clone());
                        continue;
                    }
                }
            }

            let Some(series) = self.realized.get(&line.id) else {
                continue;
            };
            match host.push_series_data(&series.handle, &line.samples) {
                Ok(()) => report.pushed.push(line.id.clone()),
                Err(err) => {
                    warn!(id = %line.id, error = %err, "native series data push failed");
                    report.failed.push(line.id.clone());
                }
            }
        }

        debug!(
            created = report.created.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            "overlay reconciled"
        );
        report
    }

    /// Removes every realized series, ignoring failures.
    pub fn clear<S>(&mut self, host: &mut S) -> ReconcileReport
    where
        S: NativeSeriesHost<Handle = H> + ?Sized,
    {
        let mut report = ReconcileReport::default();
        for (id, series) in std::mem::take(&mut self.realized) {
            remove_series(host, &id, &series.handle, &mut report);
        }
        report
    }
}

fn remove_series<S, H>(host: &mut S, id: &str, handle: &H, report: &mut ReconcileReport)
where
    S: NativeSeriesHost<Handle = H> + ?Sized,
{
    match host.remove_native_series(handle) {
        Ok(()) => report.removed.push(id.to_owned()),
        Err(err) => {
            warn!(id = %id, error = %err, "native series removal failed");
            report.failed.push(id.to_owned());
        }
    }
}
