use crate::core::{LinearScale, PixelPoint, Point, Viewport, VisibleRange};
use crate::error::{AnnotationError, AnnotationResult};

/// Domain <-> pixel conversion offered by a live chart surface.
///
/// Every method returns `None` when the surface cannot resolve the request on
/// this frame (off-screen, mid-teardown, price scale not ready). Callers treat
/// `None` as "skip this element", never as an error.
pub trait CoordinateTransform {
    fn time_to_pixel_x(&self, time: i64) -> Option<f64>;
    fn price_to_pixel_y(&self, price: f64) -> Option<f64>;
    fn pixel_x_to_time(&self, x: f64) -> Option<i64>;
    fn pixel_y_to_price(&self, y: f64) -> Option<f64>;

    /// Current drawable area, `None` while the surface is not laid out.
    fn viewport(&self) -> Option<Viewport>;

    fn point_to_pixel(&self, point: Point) -> Option<PixelPoint> {
        Some(PixelPoint::new(
            self.time_to_pixel_x(point.time)?,
            self.price_to_pixel_y(point.price)?,
        ))
    }

    fn pixel_to_point(&self, pixel: PixelPoint) -> Option<Point> {
        Some(Point::new(
            self.pixel_x_to_time(pixel.x)?,
            self.pixel_y_to_price(pixel.y)?,
        ))
    }
}

/// Headless linear transform over a visible time window and price window.
///
/// Forward conversions extrapolate beyond the visible window; inverse
/// conversions only resolve pixels inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    viewport: Viewport,
    time_scale: LinearScale,
    price_scale: Option<LinearScale>,
    alive: bool,
}

impl ViewportTransform {
    pub fn new(
        viewport: Viewport,
        visible_range: VisibleRange,
        price_min: f64,
        price_max: f64,
    ) -> AnnotationResult<Self> {
        let mut transform = Self::without_price_scale(viewport, visible_range)?;
        transform.set_price_range(price_min, price_max)?;
        Ok(transform)
    }

    /// Builds a transform whose price scale is not initialized yet.
    pub fn without_price_scale(
        viewport: Viewport,
        visible_range: VisibleRange,
    ) -> AnnotationResult<Self> {
        validate_viewport(viewport)?;
        Ok(Self {
            viewport,
            time_scale: LinearScale::new(visible_range.from, visible_range.to)?,
            price_scale: None,
            alive: true,
        })
    }

    pub fn set_visible_range(&mut self, range: VisibleRange) -> AnnotationResult<()> {
        self.time_scale = LinearScale::new(range.from, range.to)?;
        Ok(())
    }

    #[must_use]
    pub fn visible_range(&self) -> VisibleRange {
        let (from, to) = self.time_scale.domain();
        VisibleRange::new(from, to)
    }

    pub fn set_price_range(&mut self, price_min: f64, price_max: f64) -> AnnotationResult<()> {
        if price_min >= price_max {
            return Err(AnnotationError::InvalidData(
                "price range must satisfy min < max".to_owned(),
            ));
        }
        self.price_scale = Some(LinearScale::new(price_min, price_max)?);
        Ok(())
    }

    pub fn resize(&mut self, viewport: Viewport) -> AnnotationResult<()> {
        validate_viewport(viewport)?;
        self.viewport = viewport;
        Ok(())
    }

    /// Marks the surface as torn down; every conversion resolves to `None`.
    pub fn dispose(&mut self) {
        self.alive = false;
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

impl CoordinateTransform for ViewportTransform {
    fn time_to_pixel_x(&self, time: i64) -> Option<f64> {
        if !self.alive {
            return None;
        }
        self.time_scale
            .domain_to_pixel(time as f64, self.viewport.width_px())
            .ok()
            .filter(|x| x.is_finite())
    }

    fn price_to_pixel_y(&self, price: f64) -> Option<f64> {
        if !self.alive {
            return None;
        }
        let height = self.viewport.height_px();
        let from_bottom = self.price_scale?.domain_to_pixel(price, height).ok()?;
        Some(height - from_bottom).filter(|y| y.is_finite())
    }

    fn pixel_x_to_time(&self, x: f64) -> Option<i64> {
        if !self.alive || !(0.0..=self.viewport.width_px()).contains(&x) {
            return None;
        }
        let time = self
            .time_scale
            .pixel_to_domain(x, self.viewport.width_px())
            .ok()?
            .round();
        if time < i64::MIN as f64 || time > i64::MAX as f64 {
            return None;
        }
        Some(time as i64)
    }

    fn pixel_y_to_price(&self, y: f64) -> Option<f64> {
        let height = self.viewport.height_px();
        if !self.alive || !(0.0..=height).contains(&y) {
            return None;
        }
        self.price_scale?.pixel_to_domain(height - y, height).ok()
    }

    fn viewport(&self) -> Option<Viewport> {
        self.alive.then_some(self.viewport)
    }
}

fn validate_viewport(viewport: Viewport) -> AnnotationResult<()> {
    if !viewport.is_valid() {
        return Err(AnnotationError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    Ok(())
}
