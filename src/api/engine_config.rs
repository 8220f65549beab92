use serde::{Deserialize, Serialize};

use crate::drawing::{DEFAULT_FIB_LEVELS, DrawingStyle, HitTester, PlacementDefaults, TextMetrics};
use crate::error::{AnnotationError, AnnotationResult};
use crate::interaction::InteractionSettings;
use crate::render::{Color, FrameStyle};
use crate::script::MarkerPlacementConfig;

/// Public engine configuration.
///
/// Serializable so hosts can persist overlay tuning next to their chart
/// setup. Missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub hit_threshold_px: f64,
    pub handle_radius_px: f64,
    pub drag_threshold_px: f64,
    pub text_char_width_ratio: f64,
    pub text_line_height_ratio: f64,
    pub min_brush_points: usize,
    pub channel_offset_px: f64,
    pub default_style: DrawingStyle,
    pub default_text_label: String,
    pub default_font_size: f64,
    pub default_fib_levels: Vec<f64>,
    pub marker_placement: MarkerPlacementConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        let metrics = TextMetrics::default();
        let placement = PlacementDefaults::default();
        Self {
            hit_threshold_px: HitTester::default().threshold_px,
            handle_radius_px: InteractionSettings::default().handle_radius_px,
            drag_threshold_px: InteractionSettings::default().drag_threshold_px,
            text_char_width_ratio: metrics.char_width_ratio,
            text_line_height_ratio: metrics.line_height_ratio,
            min_brush_points: 2,
            channel_offset_px: InteractionSettings::default().channel_offset_px,
            default_style: placement.style,
            default_text_label: placement.text_label,
            default_font_size: placement.font_size,
            default_fib_levels: DEFAULT_FIB_LEVELS.to_vec(),
            marker_placement: MarkerPlacementConfig::default(),
        }
    }
}

impl OverlayConfig {
    #[must_use]
    pub fn with_hit_threshold(mut self, hit_threshold_px: f64) -> Self {
        self.hit_threshold_px = hit_threshold_px;
        self
    }

    #[must_use]
    pub fn with_default_style(mut self, style: DrawingStyle) -> Self {
        self.default_style = style;
        self
    }

    pub fn validate(&self) -> AnnotationResult<()> {
        for (value, name) in [
            (self.hit_threshold_px, "hit_threshold_px"),
            (self.handle_radius_px, "handle_radius_px"),
            (self.drag_threshold_px, "drag_threshold_px"),
            (self.text_char_width_ratio, "text_char_width_ratio"),
            (self.text_line_height_ratio, "text_line_height_ratio"),
            (self.channel_offset_px, "channel_offset_px"),
            (self.default_font_size, "default_font_size"),
            (self.default_style.line_width, "default_style.line_width"),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AnnotationError::InvalidData(format!(
                    "overlay config `{name}` must be finite and > 0"
                )));
            }
        }
        if self.min_brush_points < 2 {
            return Err(AnnotationError::InvalidData(
                "overlay config `min_brush_points` must be >= 2".to_owned(),
            ));
        }
        if Color::from_hex(&self.default_style.color).is_none() {
            return Err(AnnotationError::InvalidData(format!(
                "overlay config `default_style.color` is not a hex color: `{}`",
                self.default_style.color
            )));
        }
        if self.default_fib_levels.iter().any(|level| !level.is_finite()) {
            return Err(AnnotationError::InvalidData(
                "overlay config `default_fib_levels` must be finite".to_owned(),
            ));
        }
        self.marker_placement.validate()?;
        Ok(())
    }

    #[must_use]
    pub fn text_metrics(&self) -> TextMetrics {
        TextMetrics {
            char_width_ratio: self.text_char_width_ratio,
            line_height_ratio: self.text_line_height_ratio,
        }
    }

    #[must_use]
    pub fn interaction_settings(&self) -> InteractionSettings {
        InteractionSettings {
            hit_tester: HitTester {
                threshold_px: self.hit_threshold_px,
                text_metrics: self.text_metrics(),
            },
            handle_radius_px: self.handle_radius_px,
            drag_threshold_px: self.drag_threshold_px,
            min_brush_points: self.min_brush_points,
            channel_offset_px: self.channel_offset_px,
            placement: PlacementDefaults {
                style: self.default_style.clone(),
                text_label: self.default_text_label.clone(),
                font_size: self.default_font_size,
                channel_offset: 0.0,
                fib_levels: self.default_fib_levels.clone(),
            },
        }
    }

    #[must_use]
    pub fn frame_style(&self) -> FrameStyle {
        FrameStyle {
            text_metrics: self.text_metrics(),
            marker_placement: self.marker_placement,
            ..FrameStyle::default()
        }
    }

    /// Serializes config to pretty JSON.
    pub fn to_json_pretty(&self) -> AnnotationResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AnnotationError::Serialization(format!("failed to serialize config: {e}")))
    }

    /// Deserializes and validates config from JSON.
    pub fn from_json_str(input: &str) -> AnnotationResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| AnnotationError::Serialization(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
