//! Collaborator contracts offered by the host chart surface, plus a headless
//! implementation used by tests and server-side rendering.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{
    CoordinateTransform, LineStyle, SeriesSample, Viewport, ViewportTransform, VisibleRange,
};
use crate::error::{AnnotationError, AnnotationResult};

/// Callback invoked by the surface whenever its visible time range changes.
pub type RangeListener = Box<dyn FnMut(VisibleRange)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// Lifecycle and notification capabilities of the chart surface.
pub trait ChartSurface: CoordinateTransform {
    fn is_alive(&self) -> bool;

    fn subscribe_visible_range_change(
        &mut self,
        listener: RangeListener,
    ) -> AnnotationResult<SubscriptionId>;

    fn unsubscribe_visible_range_change(&mut self, id: SubscriptionId);
}

/// Configuration for a native line series created on behalf of a script line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeSeriesConfig {
    pub id: String,
    pub color: String,
    pub line_width: f64,
    pub line_style: LineStyle,
}

/// Native series management. Every call may fail with
/// [`AnnotationError::SurfaceDisposed`] when the surface was torn down.
pub trait NativeSeriesHost {
    type Handle: Clone + fmt::Debug;

    fn create_native_series(&mut self, config: &NativeSeriesConfig)
    -> AnnotationResult<Self::Handle>;

    fn remove_native_series(&mut self, handle: &Self::Handle) -> AnnotationResult<()>;

    fn push_series_data(
        &mut self,
        handle: &Self::Handle,
        samples: &[SeriesSample],
    ) -> AnnotationResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadlessSeriesHandle(u64);

/// Native series materialized on a [`HeadlessSurface`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSeries {
    pub config: NativeSeriesConfig,
    pub samples: Vec<SeriesSample>,
}

/// Call counters kept by [`HeadlessSurface`] for assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeadlessSurfaceStats {
    pub create_calls: usize,
    pub remove_calls: usize,
    pub push_calls: usize,
}

/// In-memory chart surface backed by a [`ViewportTransform`].
pub struct HeadlessSurface {
    transform: ViewportTransform,
    listeners: Vec<(SubscriptionId, RangeListener)>,
    next_subscription: u64,
    series: IndexMap<HeadlessSeriesHandle, HeadlessSeries>,
    next_series: u64,
    failing_series: HashSet<String>,
    stats: HeadlessSurfaceStats,
}

impl fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessSurface")
            .field("transform", &self.transform)
            .field("listeners", &self.listeners.len())
            .field("series", &self.series.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl HeadlessSurface {
    #[must_use]
    pub fn new(transform: ViewportTransform) -> Self {
        Self {
            transform,
            listeners: Vec::new(),
            next_subscription: 1,
            series: IndexMap::new(),
            next_series: 1,
            failing_series: HashSet::new(),
            stats: HeadlessSurfaceStats::default(),
        }
    }

    pub fn with_ranges(
        viewport: Viewport,
        visible_range: VisibleRange,
        price_min: f64,
        price_max: f64,
    ) -> AnnotationResult<Self> {
        Ok(Self::new(ViewportTransform::new(
            viewport,
            visible_range,
            price_min,
            price_max,
        )?))
    }

    #[must_use]
    pub fn transform(&self) -> &ViewportTransform {
        &self.transform
    }

    /// Applies a pan/zoom and notifies every subscriber synchronously.
    pub fn set_visible_range(&mut self, range: VisibleRange) -> AnnotationResult<()> {
        self.transform.set_visible_range(range)?;
        for (_, listener) in &mut self.listeners {
            listener(range);
        }
        Ok(())
    }

    pub fn set_price_range(&mut self, price_min: f64, price_max: f64) -> AnnotationResult<()> {
        self.transform.set_price_range(price_min, price_max)
    }

    pub fn resize(&mut self, viewport: Viewport) -> AnnotationResult<()> {
        self.transform.resize(viewport)
    }

    /// Tears the surface down: transforms stop resolving and series calls fail.
    pub fn dispose(&mut self) {
        self.transform.dispose();
        self.listeners.clear();
    }

    /// Makes every series operation for `series_id` fail until cleared.
    pub fn fail_series(&mut self, series_id: impl Into<String>) {
        self.failing_series.insert(series_id.into());
    }

    pub fn clear_failures(&mut self) {
        self.failing_series.clear();
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn series_by_id(&self, series_id: &str) -> Option<&HeadlessSeries> {
        self.series
            .values()
            .find(|series| series.config.id == series_id)
    }

    #[must_use]
    pub fn stats(&self) -> HeadlessSurfaceStats {
        self.stats
    }

    fn check_series(&self, series_id: &str) -> AnnotationResult<()> {
        if !self.transform.is_alive() {
            return Err(AnnotationError::SurfaceDisposed);
        }
        if self.failing_series.contains(series_id) {
            return Err(AnnotationError::SurfaceDisposed);
        }
        Ok(())
    }
}

impl CoordinateTransform for HeadlessSurface {
    fn time_to_pixel_x(&self, time: i64) -> Option<f64> {
        self.transform.time_to_pixel_x(time)
    }

    fn price_to_pixel_y(&self, price: f64) -> Option<f64> {
        self.transform.price_to_pixel_y(price)
    }

    fn pixel_x_to_time(&self, x: f64) -> Option<i64> {
        self.transform.pixel_x_to_time(x)
    }

    fn pixel_y_to_price(&self, y: f64) -> Option<f64> {
        self.transform.pixel_y_to_price(y)
    }

    fn viewport(&self) -> Option<Viewport> {
        self.transform.viewport()
    }
}

impl ChartSurface for HeadlessSurface {
    fn is_alive(&self) -> bool {
        self.transform.is_alive()
    }

    fn subscribe_visible_range_change(
        &mut self,
        listener: RangeListener,
    ) -> AnnotationResult<SubscriptionId> {
        if !self.transform.is_alive() {
            return Err(AnnotationError::SurfaceDisposed);
        }
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        Ok(id)
    }

    fn unsubscribe_visible_range_change(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(existing, _)| *existing != id);
    }
}

impl NativeSeriesHost for HeadlessSurface {
    type Handle = HeadlessSeriesHandle;

    fn create_native_series(
        &mut self,
        config: &NativeSeriesConfig,
    ) -> AnnotationResult<Self::Handle> {
        self.stats.create_calls += 1;
        self.check_series(&config.id)?;
        let handle = HeadlessSeriesHandle(self.next_series);
        self.next_series += 1;
        trace!(series_id = %config.id, "create headless series");
        self.series.insert(
            handle,
            HeadlessSeries {
                config: config.clone(),
                samples: Vec::new(),
            },
        );
        Ok(handle)
    }

    fn remove_native_series(&mut self, handle: &Self::Handle) -> AnnotationResult<()> {
        self.stats.remove_calls += 1;
        let series_id = self
            .series
            .get(handle)
            .map(|series| series.config.id.clone())
            .ok_or_else(|| AnnotationError::NotFound(format!("{handle:?}")))?;
        self.check_series(&series_id)?;
        self.series.shift_remove(handle);
        Ok(())
    }

    fn push_series_data(
        &mut self,
        handle: &Self::Handle,
        samples: &[SeriesSample],
    ) -> AnnotationResult<()> {
        self.stats.push_calls += 1;
        let series_id = self
            .series
            .get(handle)
            .map(|series| series.config.id.clone())
            .ok_or_else(|| AnnotationError::NotFound(format!("{handle:?}")))?;
        self.check_series(&series_id)?;
        if let Some(series) = self.series.get_mut(handle) {
            series.samples = samples.to_vec();
        }
        Ok(())
    }
}
