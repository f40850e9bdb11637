use chrono::NaiveDate;
use serde::Deserialize;

use crate::data::weather::{ForecastDay, ForecastSample, WeatherReport, summarize_forecast};
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::providers::http::HttpClient;
use crate::providers::{IconSource, WeatherProvider};

const API_BASE: &str = "https://api.openweathermap.org/data/2.5";
const ICON_BASE: &str = "https://openweathermap.org/img/wn";

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    weather: Vec<Condition>,
    main: MainBlock,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(default)]
    description: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastItem>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt_txt: Option<String>,
    main: Option<MainBlock>,
    #[serde(default)]
    weather: Vec<Condition>,
}

/// OpenWeather current-conditions and 5-day/3-hour forecast client.
#[derive(Debug, Clone)]
pub struct OpenWeather {
    http: HttpClient,
    api_key: String,
}

impl OpenWeather {
    pub fn new(http: HttpClient, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
        }
    }
}

impl WeatherProvider for OpenWeather {
    #[tracing::instrument(skip(self))]
    fn current(&self, city: &str, units: &str) -> InkframeResult<WeatherReport> {
        let value: serde_json::Value = self.http.get_json(
            &format!("{API_BASE}/weather"),
            &[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", units),
                ("lang", "en"),
            ],
            &[],
        )?;
        parse_current(value)
    }

    #[tracing::instrument(skip(self))]
    fn forecast(
        &self,
        city: &str,
        units: &str,
        today: NaiveDate,
        days: usize,
    ) -> InkframeResult<Vec<ForecastDay>> {
        let value: serde_json::Value = self.http.get_json(
            &format!("{API_BASE}/forecast"),
            &[("q", city), ("appid", self.api_key.as_str()), ("units", units)],
            &[],
        )?;
        parse_forecast(value, today, days)
    }
}

pub(crate) fn parse_current(value: serde_json::Value) -> InkframeResult<WeatherReport> {
    let cur: CurrentResponse = serde_json::from_value(value)?;
    let cond = cur
        .weather
        .first()
        .ok_or_else(|| InkframeError::upstream("weather response has no conditions"))?;
    let temp = cur.main.temp;
    let fallback = temp.unwrap_or(0.0);
    Ok(WeatherReport {
        temp,
        min: cur.main.temp_min.unwrap_or(fallback),
        max: cur.main.temp_max.unwrap_or(fallback),
        description: cond.description.clone(),
        icon_code: cond.icon.clone(),
    })
}

pub(crate) fn parse_forecast(
    value: serde_json::Value,
    today: NaiveDate,
    days: usize,
) -> InkframeResult<Vec<ForecastDay>> {
    let resp: ForecastResponse = serde_json::from_value(value)?;
    let samples: Vec<ForecastSample> = resp
        .list
        .into_iter()
        .filter_map(|item| {
            let date_txt = item.dt_txt?;
            let date = NaiveDate::parse_from_str(date_txt.split(' ').next()?, "%Y-%m-%d").ok()?;
            let cond = item.weather.into_iter().next()?;
            Some(ForecastSample {
                date,
                temp: item.main.and_then(|m| m.temp),
                description: title_case(&cond.description),
                icon_code: cond.icon,
            })
        })
        .collect();
    Ok(summarize_forecast(&samples, today, days))
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                Some(f) => f.to_uppercase().chain(c.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Weather icon bitmaps from the OpenWeather CDN (`{code}@2x.png`).
#[derive(Debug, Clone)]
pub struct OpenWeatherIcons {
    http: HttpClient,
}

impl OpenWeatherIcons {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

impl IconSource for OpenWeatherIcons {
    fn fetch(&self, code: &str) -> InkframeResult<Vec<u8>> {
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InkframeError::validation(format!("invalid icon code '{code}'")));
        }
        self.http
            .get_bytes(&format!("{ICON_BASE}/{code}@2x.png"), &[])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/providers/openweather.rs"]
mod tests;
