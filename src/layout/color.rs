use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8;

/// Color as written by the layout designer.
///
/// Accepts `#RGB`, `#RRGGBB`, `#RRGGBBAA`, CSS `rgb()`/`rgba()` strings, `{r,g,b,a?}` objects and
/// `[r,g,b(,a)]` arrays. Object and array channels are `0..1`; any channel above 1 switches the
/// whole color to `0..255`. Alpha is always `0..1` except in `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// `None` when the source did not specify alpha.
    pub alpha: Option<u8>,
}

impl LayoutColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            alpha: None,
        }
    }

    /// Resolve against the alpha used when none was given.
    pub fn with_default_alpha(self, a: u8) -> Rgba8 {
        Rgba8::new(self.r, self.g, self.b, self.alpha.unwrap_or(a))
    }

    pub fn to_rgba8(self) -> Rgba8 {
        self.with_default_alpha(255)
    }

    fn from_channels(rgb: [f64; 3], a: Option<f64>) -> Result<Self, String> {
        if rgb.iter().chain(a.iter()).any(|v| !v.is_finite()) {
            return Err("color channels must be finite".to_owned());
        }
        let scale = if rgb.iter().any(|v| *v > 1.0) { 1.0 } else { 255.0 };
        let ch = |v: f64| (v * scale).round().clamp(0.0, 255.0) as u8;
        Ok(Self {
            r: ch(rgb[0]),
            g: ch(rgb[1]),
            b: ch(rgb[2]),
            alpha: a.map(unit_to_u8),
        })
    }
}

fn unit_to_u8(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Serialize for LayoutColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = match self.alpha {
            Some(a) => format!("#{:02x}{:02x}{:02x}{a:02x}", self.r, self.g, self.b),
            None => format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b),
        };
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for LayoutColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Str(String),
            RgbaObj {
                r: f64,
                g: f64,
                b: f64,
                a: Option<f64>,
            },
            Arr(Vec<f64>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Str(s) => parse_color_str(&s).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => {
                Self::from_channels([r, g, b], a).map_err(serde::de::Error::custom)
            }
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Self::from_channels([*r, *g, *b], None),
                [r, g, b, a] => Self::from_channels([*r, *g, *b], Some(*a)),
                _ => Err("color array must be [r,g,b] or [r,g,b,a]".to_owned()),
            }
            .map_err(serde::de::Error::custom),
        }
    }
}

fn parse_color_str(s: &str) -> Result<LayoutColor, String> {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();
    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_css_rgb(args);
    }
    parse_hex(s)
}

// CSS channels are always 0..255 here.
fn parse_css_rgb(args: &str) -> Result<LayoutColor, String> {
    let parts: Vec<f64> = args
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("invalid rgb() arguments \"{args}\""))?;
    let (rgb, a) = match parts.as_slice() {
        [r, g, b] => ([*r, *g, *b], None),
        [r, g, b, a] => ([*r, *g, *b], Some(*a)),
        _ => return Err("rgb() takes 3 or 4 arguments".to_owned()),
    };
    if rgb.iter().chain(a.iter()).any(|v| !v.is_finite()) {
        return Err("color channels must be finite".to_owned());
    }
    let ch = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    Ok(LayoutColor {
        r: ch(rgb[0]),
        g: ch(rgb[1]),
        b: ch(rgb[2]),
        alpha: a.map(unit_to_u8),
    })
}

fn parse_hex(s: &str) -> Result<LayoutColor, String> {
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.is_ascii() {
        return Err(format!("invalid hex color \"{s}\""));
    }

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    match s.len() {
        3 => {
            let nib = |i: usize| hex_byte(&s[i..i + 1]).map(|v| v * 17);
            Ok(LayoutColor::rgb(nib(0)?, nib(1)?, nib(2)?))
        }
        6 => Ok(LayoutColor::rgb(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Ok(LayoutColor {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
            alpha: Some(hex_byte(&s[6..8])?),
        }),
        _ => Err("hex color must be #RGB, #RRGGBB or #RRGGBBAA".to_owned()),
    }
}
