use std::collections::HashMap;

use tracing::warn;

use crate::core::{Candle, CoordinateTransform, PixelPoint, Point, Viewport, infer_bar_interval};
use crate::drawing::{
    DEFAULT_DRAWING_COLOR, Drawing, DrawingGeometry, DrawingKind, MeasureStats, PixelRect,
    PixelSegment, TextMetrics, drawing_geometry, resize_handles,
};
use crate::render::{
    Color, LinePrimitive, LineStrokeStyle, OverlayFrame, PolylinePrimitive, RectPrimitive,
    TextHAlign, TextPrimitive,
};
use crate::script::{
    MarkerElement, MarkerPlacementConfig, MarkerShape, MergedElements, PlacedMarker, place_markers,
};

const DEFAULT_SCRIPT_COLOR: Color = Color::rgb(120.0 / 255.0, 123.0 / 255.0, 134.0 / 255.0);
const ARROW_HEAD_PX: f64 = 10.0;

/// Presentation constants for frame building.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStyle {
    pub text_metrics: TextMetrics,
    pub handle_size_px: f64,
    pub handle_fill: Color,
    pub label_font_size_px: f64,
    pub box_fill_opacity: f64,
    pub shade_opacity: f64,
    pub marker_placement: MarkerPlacementConfig,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            text_metrics: TextMetrics::default(),
            handle_size_px: 8.0,
            handle_fill: Color::rgb(1.0, 1.0, 1.0),
            label_font_size_px: 11.0,
            box_fill_opacity: 0.2,
            shade_opacity: 0.15,
            marker_placement: MarkerPlacementConfig::default(),
        }
    }
}

/// Everything one overlay frame is built from.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    pub drawings: &'a [Drawing],
    pub selected: Option<&'a str>,
    /// In-progress placement, drawn above everything else.
    pub preview: Option<&'a Drawing>,
    pub scripts: &'a MergedElements,
    pub candles: &'a [Candle],
}

/// Materializes script elements and drawings into one overlay frame.
///
/// Script elements render beneath drawings; drawings keep z-order and the
/// selected drawing adds its resize handles on top. Elements whose
/// coordinates cannot be resolved this frame are skipped. Returns `None`
/// when the surface cannot resolve a viewport at all.
#[must_use]
pub fn build_overlay_frame(
    inputs: &FrameInputs<'_>,
    transform: &dyn CoordinateTransform,
    style: &FrameStyle,
) -> Option<OverlayFrame> {
    let viewport = transform.viewport()?;
    let mut frame = OverlayFrame::new(viewport);

    push_script_elements(&mut frame, inputs.scripts, inputs.candles, transform, style);

    let bar_interval = infer_bar_interval(inputs.candles);
    for drawing in inputs.drawings.iter().filter(|drawing| drawing.visible) {
        push_drawing(&mut frame, drawing, bar_interval, transform, style);
    }

    if let Some(drawing) = inputs
        .selected
        .and_then(|id| inputs.drawings.iter().find(|drawing| drawing.id == id))
        .filter(|drawing| drawing.visible)
    {
        push_handles(&mut frame, drawing, transform, style);
    }

    if let Some(preview) = inputs.preview {
        push_drawing(&mut frame, preview, bar_interval, transform, style);
    }

    Some(frame)
}

fn push_script_elements(
    frame: &mut OverlayFrame,
    scripts: &MergedElements,
    candles: &[Candle],
    transform: &dyn CoordinateTransform,
    style: &FrameStyle,
) {
    let viewport = frame.viewport;
    let color_of = |color: &Option<String>| Color::parse_or(color.as_deref(), DEFAULT_SCRIPT_COLOR);

    for shade in &scripts.shades {
        let (Some(x1), Some(x2)) = (
            transform.time_to_pixel_x(shade.start_time),
            transform.time_to_pixel_x(shade.end_time),
        ) else {
            continue;
        };
        let opacity = shade.opacity.unwrap_or(style.shade_opacity);
        frame.rects.push(RectPrimitive::new(
            x1.min(x2),
            0.0,
            (x2 - x1).abs(),
            viewport.height_px(),
            color_of(&shade.color).with_alpha(opacity),
        ));
    }

    for element in &scripts.boxes {
        let (Some(a), Some(b)) = (
            transform.point_to_pixel(Point::new(element.start_time, element.high)),
            transform.point_to_pixel(Point::new(element.end_time, element.low)),
        ) else {
            continue;
        };
        let rect = PixelRect::from_corners(a, b);
        let color = color_of(&element.color);
        let opacity = element.fill_opacity.unwrap_or(style.box_fill_opacity);
        frame.rects.push(
            RectPrimitive::new(rect.left, rect.top, rect.width(), rect.height(), color.with_alpha(opacity))
                .with_border(1.0, color),
        );
        if let Some(label) = element.label.as_deref().filter(|label| !label.is_empty()) {
            frame.texts.push(TextPrimitive::new(
                label,
                rect.left + 4.0,
                rect.top + style.label_font_size_px + 2.0,
                style.label_font_size_px,
                color,
                TextHAlign::Left,
            ));
        }
    }

    for hline in &scripts.hlines {
        let Some(y) = transform.price_to_pixel_y(hline.price) else {
            continue;
        };
        let color = color_of(&hline.color);
        frame.lines.push(
            LinePrimitive::new(0.0, y, viewport.width_px(), y, 1.0, color)
                .with_stroke_style(hline.line_style.into()),
        );
        if let Some(label) = hline.label.as_deref().filter(|label| !label.is_empty()) {
            frame.texts.push(TextPrimitive::new(
                label,
                viewport.width_px() - 4.0,
                y - 2.0,
                style.label_font_size_px,
                color,
                TextHAlign::Right,
            ));
        }
    }

    for vline in &scripts.vlines {
        let Some(x) = transform.time_to_pixel_x(vline.time) else {
            continue;
        };
        let color = color_of(&vline.color);
        frame.lines.push(
            LinePrimitive::new(x, 0.0, x, viewport.height_px(), 1.0, color)
                .with_stroke_style(vline.line_style.into()),
        );
        if let Some(label) = vline.label.as_deref().filter(|label| !label.is_empty()) {
            frame.texts.push(TextPrimitive::new(
                label,
                x + 4.0,
                style.label_font_size_px + 2.0,
                style.label_font_size_px,
                color,
                TextHAlign::Left,
            ));
        }
    }

    for label in scripts.labels.iter().filter(|label| !label.text.is_empty()) {
        let Some(anchor) = transform.point_to_pixel(Point::new(label.time, label.price)) else {
            continue;
        };
        frame.texts.push(TextPrimitive::new(
            label.text.as_str(),
            anchor.x,
            anchor.y,
            style.label_font_size_px,
            color_of(&label.color),
            TextHAlign::Center,
        ));
    }

    let placed = match place_markers(&scripts.markers, candles, transform, style.marker_placement) {
        Ok(placed) => placed,
        Err(err) => {
            warn!(error = %err, "skipping script markers");
            Vec::new()
        }
    };
    let by_id: HashMap<&str, &MarkerElement> = scripts
        .markers
        .iter()
        .map(|marker| (marker.id.as_str(), marker))
        .collect();
    for marker in &placed {
        if let Some(element) = by_id.get(marker.id.as_str()) {
            push_marker(frame, marker, element, style);
        }
    }
}

fn push_marker(frame: &mut OverlayFrame, placed: &PlacedMarker, element: &MarkerElement, style: &FrameStyle) {
    let color = Color::parse_or(element.color.as_deref(), DEFAULT_SCRIPT_COLOR);
    let size = style.marker_placement.marker_size_px;
    let half = size * 0.5;
    let (x, y) = (placed.x, placed.y);
    match element.shape {
        MarkerShape::Circle | MarkerShape::Square => {
            frame
                .rects
                .push(RectPrimitive::new(x - half, y - half, size, size, color));
        }
        MarkerShape::ArrowUp | MarkerShape::ArrowDown => {
            let tip_dy = if element.shape == MarkerShape::ArrowUp { -half } else { half };
            let tip = PixelPoint::new(x, y + tip_dy);
            let left = PixelPoint::new(x - half, y - tip_dy);
            let right = PixelPoint::new(x + half, y - tip_dy);
            frame.polylines.push(
                PolylinePrimitive::new(vec![tip, left, right], 1.0, color).with_fill(color),
            );
        }
    }
    if let Some(label) = &placed.label {
        frame.texts.push(TextPrimitive::new(
            label.text.as_str(),
            x,
            label.top_px + label.height_px,
            style.label_font_size_px,
            color,
            TextHAlign::Center,
        ));
    }
}

fn push_drawing(
    frame: &mut OverlayFrame,
    drawing: &Drawing,
    bar_interval: Option<i64>,
    transform: &dyn CoordinateTransform,
    style: &FrameStyle,
) {
    let Some(geometry) = drawing_geometry(drawing, transform, style.text_metrics) else {
        return;
    };
    let color = Color::parse_or(
        Some(drawing.style.color.as_str()),
        Color::parse_or(Some(DEFAULT_DRAWING_COLOR), DEFAULT_SCRIPT_COLOR),
    );
    let width = drawing.style.line_width;
    let stroke_style = LineStrokeStyle::from(drawing.style.line_style);
    let fill = drawing
        .fill()
        .map(|(fill_color, opacity)| Color::parse_or(Some(fill_color), color).with_alpha(opacity));
    let stroke = |segment: PixelSegment| {
        LinePrimitive::between(segment.start, segment.end, width, color).with_stroke_style(stroke_style)
    };

    match geometry {
        DrawingGeometry::Horizontal(segment) | DrawingGeometry::Vertical(segment) => {
            frame.lines.push(stroke(segment));
        }
        DrawingGeometry::Line {
            segment,
            anchors,
            arrow_head,
        } => {
            frame.lines.push(stroke(segment));
            if arrow_head {
                push_arrow_head(frame, anchors, width, color);
            }
            if let DrawingKind::Ruler { start, end } = drawing.kind {
                push_stats_label(frame, start, end, anchors[1], bar_interval, color, style);
            }
        }
        DrawingGeometry::Channel { first, second } => {
            if let Some(fill) = fill {
                frame.polylines.push(
                    PolylinePrimitive::new(
                        vec![first.start, first.end, second.end, second.start],
                        width,
                        color,
                    )
                    .with_fill(fill),
                );
            }
            frame.lines.push(stroke(first));
            frame.lines.push(stroke(second));
        }
        DrawingGeometry::Box { rect, anchors } => {
            let fill = fill.unwrap_or(color.with_alpha(0.0));
            frame.rects.push(
                RectPrimitive::new(rect.left, rect.top, rect.width(), rect.height(), fill)
                    .with_border(width, color),
            );
            if let DrawingKind::Measure { start, end } = drawing.kind {
                push_stats_label(frame, start, end, anchors[1], bar_interval, color, style);
            }
        }
        DrawingGeometry::Fib {
            anchor_line,
            levels,
        } => {
            if let (Some(fill), Some(first), Some(last)) = (fill, levels.first(), levels.last()) {
                let top = first.line.start.y.min(last.line.start.y);
                let bottom = first.line.start.y.max(last.line.start.y);
                frame.rects.push(RectPrimitive::new(
                    first.line.start.x,
                    top,
                    (first.line.end.x - first.line.start.x).abs(),
                    bottom - top,
                    fill,
                ));
            }
            frame
                .lines
                .push(stroke(anchor_line).with_stroke_style(LineStrokeStyle::Dashed));
            for level in &levels {
                frame.lines.push(stroke(level.line));
                frame.texts.push(TextPrimitive::new(
                    format!("{} ({:.2})", level.ratio, level.price),
                    level.line.start.x + 2.0,
                    level.line.start.y - 2.0,
                    style.label_font_size_px,
                    color,
                    TextHAlign::Left,
                ));
            }
        }
        DrawingGeometry::Text { anchor, .. } => {
            if let DrawingKind::Text {
                label, font_size, ..
            } = &drawing.kind
            {
                if !label.is_empty() {
                    frame.texts.push(TextPrimitive::new(
                        label.as_str(),
                        anchor.x,
                        anchor.y,
                        *font_size,
                        color,
                        TextHAlign::Left,
                    ));
                }
            }
        }
        DrawingGeometry::Polyline(points) => {
            frame
                .polylines
                .push(PolylinePrimitive::new(points, width, color));
        }
    }
}

fn push_arrow_head(frame: &mut OverlayFrame, [start, end]: [PixelPoint; 2], width: f64, color: Color) {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = dx.hypot(dy);
    if length <= f64::EPSILON {
        return;
    }
    let (ux, uy) = (dx / length, dy / length);
    // Two barbs at +-30 degrees from the reversed direction.
    let (sin, cos) = std::f64::consts::FRAC_PI_6.sin_cos();
    for side in [-1.0, 1.0] {
        let bx = -(ux * cos - side * uy * sin);
        let by = -(uy * cos + side * ux * sin);
        frame.lines.push(LinePrimitive::new(
            end.x,
            end.y,
            end.x + bx * ARROW_HEAD_PX,
            end.y + by * ARROW_HEAD_PX,
            width,
            color,
        ));
    }
}

fn push_stats_label(
    frame: &mut OverlayFrame,
    start: Point,
    end: Point,
    at: PixelPoint,
    bar_interval: Option<i64>,
    color: Color,
    style: &FrameStyle,
) {
    let stats = MeasureStats::between(start, end, bar_interval);
    frame.texts.push(TextPrimitive::new(
        stats.label(),
        at.x + 4.0,
        at.y - 4.0,
        style.label_font_size_px,
        color,
        TextHAlign::Left,
    ));
}

fn push_handles(
    frame: &mut OverlayFrame,
    drawing: &Drawing,
    transform: &dyn CoordinateTransform,
    style: &FrameStyle,
) {
    let Some(handles) = resize_handles(drawing, transform) else {
        return;
    };
    let color = Color::parse_or(Some(drawing.style.color.as_str()), style.handle_fill);
    let size = style.handle_size_px;
    for handle in handles.iter().filter(|handle| in_bounds(frame.viewport, **handle)) {
        frame.rects.push(
            RectPrimitive::new(handle.x - size * 0.5, handle.y - size * 0.5, size, size, style.handle_fill)
                .with_border(1.0, color),
        );
    }
}

fn in_bounds(viewport: Viewport, point: PixelPoint) -> bool {
    point.x.is_finite() && point.y.is_finite() && viewport.contains(point)
}
