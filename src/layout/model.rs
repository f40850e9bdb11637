use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::context::RenderContext;
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::layout::color::LayoutColor;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Box,
    Text,
    Icon,
}

/// Semantic content a text or icon element binds to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentType {
    WeatherCity,
    WeatherMinMax,
    WeatherNote,
    WeatherIcon,
    WeatherTemp,
    Forecast,
    Date,
    Joke,
    Theme,
    Device,
}

impl ContentType {
    pub const ALL: [ContentType; 10] = [
        ContentType::WeatherCity,
        ContentType::WeatherMinMax,
        ContentType::WeatherNote,
        ContentType::WeatherIcon,
        ContentType::WeatherTemp,
        ContentType::Forecast,
        ContentType::Date,
        ContentType::Joke,
        ContentType::Theme,
        ContentType::Device,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ContentType::WeatherCity => "WEATHER_CITY",
            ContentType::WeatherMinMax => "WEATHER_MINMAX",
            ContentType::WeatherNote => "WEATHER_NOTE",
            ContentType::WeatherIcon => "WEATHER_ICON",
            ContentType::WeatherTemp => "WEATHER_TEMP",
            ContentType::Forecast => "FORECAST",
            ContentType::Date => "DATE",
            ContentType::Joke => "JOKE",
            ContentType::Theme => "THEME",
            ContentType::Device => "DEVICE",
        }
    }

    /// Text bound to this content type.
    pub fn resolve(self, ctx: &RenderContext) -> String {
        match self {
            ContentType::WeatherCity => ctx.weather.city.clone(),
            ContentType::WeatherMinMax => ctx.weather.minmax(),
            ContentType::WeatherNote => ctx.weather.description.clone(),
            ContentType::WeatherIcon => ctx.weather.icon_kind.as_str().to_owned(),
            ContentType::WeatherTemp => ctx
                .weather
                .temp
                .map(|t| format!("{t}\u{b0}"))
                .unwrap_or_default(),
            ContentType::Forecast => ctx.weather.forecast_line(),
            ContentType::Date => ctx.date.clone(),
            ContentType::Joke => ctx.joke.clone(),
            ContentType::Theme => ctx.theme.clone(),
            ContentType::Device => ctx.device.clone(),
        }
    }

    /// Lines of text the element height is sized for.
    pub fn line_hint(self) -> u32 {
        match self {
            ContentType::Joke => 4,
            ContentType::WeatherNote | ContentType::Forecast => 2,
            _ => 1,
        }
    }
}

impl FromStr for ContentType {
    type Err = InkframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase().replace('-', "_");
        ContentType::ALL
            .into_iter()
            .find(|t| t.tag() == norm)
            .ok_or_else(|| InkframeError::layout(format!("unknown content type '{s}'")))
    }
}

/// Font weight hint: a CSS number or `"bold"`/`"normal"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Weight {
    Numeric(f64),
    Named(String),
}

impl Weight {
    pub fn is_bold(&self) -> bool {
        match self {
            Weight::Numeric(w) => *w >= 600.0,
            Weight::Named(n) => match n.trim().to_ascii_lowercase().as_str() {
                "bold" | "bolder" | "semibold" | "extrabold" | "black" => true,
                other => other.parse::<f64>().is_ok_and(|w| w >= 600.0),
            },
        }
    }
}

/// A positioned layout element in canvas pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<LayoutColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Weight>,
}

impl Element {
    pub fn new(kind: ElementKind, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            kind,
            x,
            y,
            w,
            h,
            role: None,
            content: None,
            text: None,
            color: None,
            weight: None,
        }
    }

    pub fn with_content(mut self, content: ContentType) -> Self {
        self.content = Some(content.tag().to_owned());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_color(mut self, color: LayoutColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.weight = Some(Weight::Numeric(700.0));
        self
    }

    /// `None` for untagged elements and unknown tags.
    pub fn content_type(&self) -> Option<ContentType> {
        self.content.as_deref().and_then(|t| t.parse().ok())
    }

    pub fn is_bold(&self) -> bool {
        self.weight.as_ref().is_some_and(Weight::is_bold)
    }

    /// The part of the element inside `canvas`, or why it cannot be drawn.
    pub fn visible_rect(&self, canvas: Canvas) -> InkframeResult<Rect> {
        let geom = [self.x, self.y, self.w, self.h];
        if geom.iter().any(|v| !v.is_finite()) {
            return Err(InkframeError::layout("element geometry is not finite"));
        }
        if self.w <= 0.0 || self.h <= 0.0 {
            return Err(InkframeError::layout("element has non-positive size"));
        }
        let rect = Rect::new(self.x, self.y, self.x + self.w, self.y + self.h);
        let clipped = rect.intersect(canvas.rect());
        if clipped.width() <= 0.0 || clipped.height() <= 0.0 {
            return Err(InkframeError::layout("element lies outside the canvas"));
        }
        Ok(clipped)
    }
}

/// A device's layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(default)]
    pub device_id: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    /// City override chosen in the designer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub elements: Vec<Element>,
}

fn default_mode() -> String {
    "default".to_owned()
}

impl LayoutDocument {
    /// Parse a stored document, dropping elements that fail to parse.
    ///
    /// Fails only if the payload is not an object with an `elements` array.
    pub fn from_json_slice(bytes: &[u8]) -> InkframeResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> InkframeResult<Self> {
        let serde_json::Value::Object(mut obj) = value else {
            return Err(InkframeError::layout("layout must be a JSON object"));
        };
        let Some(serde_json::Value::Array(raw)) = obj.remove("elements") else {
            return Err(InkframeError::layout("layout has no 'elements' array"));
        };

        let str_field = |obj: &serde_json::Map<String, serde_json::Value>, k: &str| {
            obj.get(k).and_then(|v| v.as_str()).map(str::to_owned)
        };

        let mut elements = Vec::with_capacity(raw.len());
        for (idx, item) in raw.into_iter().enumerate() {
            match serde_json::from_value::<Element>(item) {
                Ok(el) => elements.push(el),
                Err(e) => tracing::warn!(index = idx, error = %e, "dropping malformed layout element"),
            }
        }

        Ok(Self {
            device_id: str_field(&obj, "device_id").unwrap_or_default(),
            mode: str_field(&obj, "mode").unwrap_or_else(default_mode),
            city: str_field(&obj, "city").filter(|c| !c.trim().is_empty()),
            elements,
        })
    }

    /// Built-in layout for an 800x480 canvas, used when a device has none stored.
    pub fn default_for(device_id: &str) -> Self {
        use ContentType as C;
        use ElementKind as K;

        let elements = vec![
            Element::new(K::Box, 16.0, 16.0, 420.0, 72.0),
            Element::new(K::Text, 28.0, 22.0, 396.0, 60.0)
                .with_content(C::Date)
                .bold(),
            Element::new(K::Box, 16.0, 300.0, 300.0, 164.0),
            Element::new(K::Icon, 28.0, 312.0, 96.0, 96.0).with_content(C::WeatherIcon),
            Element::new(K::Text, 132.0, 312.0, 176.0, 44.0)
                .with_content(C::WeatherCity)
                .bold(),
            Element::new(K::Text, 132.0, 358.0, 176.0, 44.0).with_content(C::WeatherMinMax),
            Element::new(K::Text, 28.0, 412.0, 280.0, 48.0).with_content(C::WeatherNote),
            Element::new(K::Box, 332.0, 300.0, 452.0, 164.0),
            Element::new(K::Text, 344.0, 308.0, 428.0, 148.0).with_content(C::Joke),
        ];
        Self {
            device_id: device_id.to_owned(),
            mode: default_mode(),
            city: None,
            elements,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/model.rs"]
mod tests;
