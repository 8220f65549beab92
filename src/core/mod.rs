pub mod candle;
pub mod primitives;
pub mod scale;
pub mod surface;
pub mod transform;
pub mod types;

pub use candle::{Candle, infer_bar_interval};
pub use scale::LinearScale;
pub use surface::{
    ChartSurface, HeadlessSeries, HeadlessSeriesHandle, HeadlessSurface, HeadlessSurfaceStats,
    NativeSeriesConfig, NativeSeriesHost, RangeListener, SubscriptionId,
};
pub use transform::{CoordinateTransform, ViewportTransform};
pub use types::{LineStyle, PixelPoint, Point, SeriesSample, Viewport, VisibleRange};
