use serde::{Deserialize, Serialize};

use crate::core::{LineStyle, SeriesSample};

fn default_visible() -> bool {
    true
}

/// Named bundle of declarative elements and generator configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartScript {
    pub id: String,
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub elements: Vec<ScriptElement>,
    #[serde(default)]
    pub generators: Vec<ScriptGenerator>,
}

impl ChartScript {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            visible: true,
            elements: Vec::new(),
            generators: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_element(mut self, element: impl Into<ScriptElement>) -> Self {
        self.elements.push(element.into());
        self
    }

    #[must_use]
    pub fn with_generator(mut self, generator: ScriptGenerator) -> Self {
        self.generators.push(generator);
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Read-only element produced by generators or an authoring collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScriptElement {
    Line(LineElement),
    HLine(HLineElement),
    VLine(VLineElement),
    Box(BoxElement),
    Marker(MarkerElement),
    Label(LabelElement),
    Shade(ShadeElement),
}

impl ScriptElement {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Line(element) => &element.id,
            Self::HLine(element) => &element.id,
            Self::VLine(element) => &element.id,
            Self::Box(element) => &element.id,
            Self::Marker(element) => &element.id,
            Self::Label(element) => &element.id,
            Self::Shade(element) => &element.id,
        }
    }
}

macro_rules! into_script_element {
    ($($variant:ident($element:ty)),* $(,)?) => {
        $(
            impl From<$element> for ScriptElement {
                fn from(element: $element) -> Self {
                    Self::$variant(element)
                }
            }
        )*
    };
}

into_script_element!(
    Line(LineElement),
    HLine(HLineElement),
    VLine(VLineElement),
    Box(BoxElement),
    Marker(MarkerElement),
    Label(LabelElement),
    Shade(ShadeElement),
);

/// Full derived series realized as a native chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineElement {
    pub id: String,
    pub samples: Vec<SeriesSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(default)]
    pub line_style: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HLineElement {
    pub id: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub line_style: LineStyle,
}

impl HLineElement {
    #[must_use]
    pub fn new(id: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            price,
            label: None,
            color: None,
            line_style: LineStyle::Solid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VLineElement {
    pub id: String,
    pub time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub line_style: LineStyle,
}

impl VLineElement {
    #[must_use]
    pub fn new(id: impl Into<String>, time: i64) -> Self {
        Self {
            id: id.into(),
            time,
            label: None,
            color: None,
            line_style: LineStyle::Solid,
        }
    }
}

/// Time range x price range rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxElement {
    pub id: String,
    pub start_time: i64,
    pub end_time: i64,
    pub low: f64,
    pub high: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerPosition {
    AboveBar,
    BelowBar,
    InBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerShape {
    #[default]
    Circle,
    Square,
    ArrowUp,
    ArrowDown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerElement {
    pub id: String,
    pub time: i64,
    pub position: MarkerPosition,
    #[serde(default)]
    pub shape: MarkerShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl MarkerElement {
    #[must_use]
    pub fn new(id: impl Into<String>, time: i64, position: MarkerPosition) -> Self {
        Self {
            id: id.into(),
            time,
            position,
            shape: MarkerShape::default(),
            color: None,
            text: None,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelElement {
    pub id: String,
    pub time: i64,
    pub price: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Time range spanning the full vertical extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadeElement {
    pub id: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

/// Stateless generator configuration, evaluated fresh against each candle set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptGenerator {
    SessionVlines(SessionVlinesConfig),
    PrevDayLevels(PrevDayLevelsConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionVlinesConfig {
    /// UTC hour, `0..24`.
    pub hour: u32,
    /// UTC minute, `0..60`.
    pub minute: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<LineStyle>,
}

impl SessionVlinesConfig {
    #[must_use]
    pub fn new(hour: u32, minute: u32) -> Self {
        Self {
            hour,
            minute,
            label: None,
            color: None,
            style: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrevDayLevelsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<LineStyle>,
}
