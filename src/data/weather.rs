use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Coarse condition used to pick an icon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconKind {
    Sunny,
    Partly,
    Cloudy,
    Rain,
    Storm,
    Snow,
    Fog,
}

impl IconKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IconKind::Sunny => "sunny",
            IconKind::Partly => "partly",
            IconKind::Cloudy => "cloudy",
            IconKind::Rain => "rain",
            IconKind::Storm => "storm",
            IconKind::Snow => "snow",
            IconKind::Fog => "fog",
        }
    }
}

// Earlier rows win.
const CLASSIFY_RULES: &[(IconKind, &[&str])] = &[
    (IconKind::Storm, &["storm", "thunder"]),
    (IconKind::Rain, &["rain", "drizzle", "shower"]),
    (IconKind::Snow, &["snow", "sleet", "hail"]),
    (IconKind::Fog, &["fog", "mist", "haze", "smoke", "dust"]),
    (IconKind::Partly, &["few clouds", "scattered", "partly", "broken"]),
    (IconKind::Cloudy, &["cloud", "overcast"]),
    (IconKind::Sunny, &["clear", "sun"]),
];

/// Map a free-text weather description onto an [`IconKind`].
///
/// Case-insensitive substring match; anything unrecognised is `Cloudy`.
pub fn classify(description: &str) -> IconKind {
    let d = description.to_lowercase();
    CLASSIFY_RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| d.contains(n)))
        .map(|(kind, _)| *kind)
        .unwrap_or(IconKind::Cloudy)
}

/// One upcoming day of the short-range forecast.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub min: i32,
    pub max: i32,
    pub description: String,
    pub icon_code: String,
}

/// One 3-hourly forecast sample as reported by a provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastSample {
    pub date: NaiveDate,
    pub temp: Option<f64>,
    pub description: String,
    pub icon_code: Option<String>,
}

/// Group samples by date, skip `today`, and keep the earliest `days` days.
///
/// Each day reports rounded min/max and the description of its middle sample.
pub fn summarize_forecast(samples: &[ForecastSample], today: NaiveDate, days: usize) -> Vec<ForecastDay> {
    let mut per_day: std::collections::BTreeMap<NaiveDate, Vec<&ForecastSample>> =
        std::collections::BTreeMap::new();
    for s in samples.iter().filter(|s| s.date != today) {
        per_day.entry(s.date).or_default().push(s);
    }

    per_day
        .into_iter()
        .filter_map(|(date, entries)| {
            let temps: Vec<f64> = entries.iter().filter_map(|e| e.temp).collect();
            if temps.is_empty() {
                return None;
            }
            let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
            let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mid = entries[entries.len() / 2];
            Some(ForecastDay {
                date,
                min: min.round() as i32,
                max: max.round() as i32,
                description: mid.description.clone(),
                icon_code: mid.icon_code.clone().unwrap_or_else(|| "01d".to_owned()),
            })
        })
        .take(days)
        .collect()
}

/// Raw current conditions from a weather provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub temp: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub description: String,
    pub icon_code: Option<String>,
}

/// Normalized weather fields every layout can rely on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub min: i32,
    pub max: i32,
    pub temp: Option<i32>,
    pub description: String,
    pub icon_kind: IconKind,
    pub icon_code: Option<String>,
    #[serde(default)]
    pub forecast: Vec<ForecastDay>,
}

impl WeatherSnapshot {
    /// Values used whenever live weather is unavailable.
    pub fn stub(city: &str) -> Self {
        Self {
            city: city.to_owned(),
            min: 23,
            max: 31,
            temp: Some(33),
            description: "Sunny".to_owned(),
            icon_kind: IconKind::Sunny,
            icon_code: Some("01d".to_owned()),
            forecast: Vec::new(),
        }
    }

    pub fn from_report(city: &str, report: &WeatherReport, forecast: Vec<ForecastDay>) -> Self {
        let description = capitalize(report.description.trim());
        Self {
            city: city.to_owned(),
            min: report.min.round() as i32,
            max: report.max.round() as i32,
            temp: report.temp.map(|t| t.round() as i32),
            icon_kind: classify(&description),
            description,
            icon_code: report.icon_code.clone(),
            forecast,
        }
    }

    pub fn minmax(&self) -> String {
        format!("{}\u{b0} / {}\u{b0}", self.min, self.max)
    }

    pub fn forecast_line(&self) -> String {
        self.forecast
            .iter()
            .map(|d| format!("{} {}\u{b0}/{}\u{b0}", d.date.format("%a"), d.min, d.max))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/weather.rs"]
mod tests;
