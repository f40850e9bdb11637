use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::data::context::RenderContext;
use crate::data::jokes::local_joke;
use crate::data::weather::{ForecastDay, WeatherReport, WeatherSnapshot};
use crate::foundation::error::InkframeError;
use crate::providers::{JokeProvider, WeatherProvider};
use crate::store::{ObjectStore, read_optional};

pub const FORECAST_DAYS: usize = 2;
pub const DATE_FORMAT: &str = "%A, %b %d";

/// Cache blob key for a `(city, units)` pair.
pub fn weather_cache_key(prefix: &str, city: &str, units: &str) -> String {
    let digest = Sha256::digest(format!("{}|{units}", city.trim()).as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{prefix}{}.json", &hex[..10])
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedWeather {
    fetched_at: i64,
    report: WeatherReport,
    #[serde(default)]
    forecast: Vec<ForecastDay>,
}

struct WeatherCache {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    ttl_secs: i64,
}

impl WeatherCache {
    fn load(&self, key: &str, now_ts: i64) -> Option<CachedWeather> {
        let bytes = match read_optional(self.store.as_ref(), key) {
            Ok(Some(b)) => b,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "weather cache read failed");
                return None;
            }
        };
        let cached: CachedWeather = match serde_json::from_slice(&bytes) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(key, error = %e, "weather cache blob is corrupt");
                return None;
            }
        };
        (now_ts - cached.fetched_at < self.ttl_secs).then_some(cached)
    }

    fn save(&self, key: &str, cached: &CachedWeather) {
        let result = serde_json::to_vec(cached)
            .map_err(InkframeError::from)
            .and_then(|bytes| self.store.write(key, &bytes, "application/json"));
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "weather cache write failed");
        }
    }
}

/// Inputs for one [`RenderContext`].
#[derive(Clone, Debug)]
pub struct ContextRequest<'a> {
    pub city: &'a str,
    pub units: &'a str,
    pub date: NaiveDate,
    pub theme: &'a str,
    pub device: &'a str,
    pub show_joke: bool,
}

/// Turns provider responses, or stub defaults, into a [`RenderContext`].
///
/// Building never fails: any provider error degrades to the stub weather or a local joke.
#[derive(Default)]
pub struct SnapshotBuilder {
    weather: Option<Arc<dyn WeatherProvider>>,
    jokes: Option<Arc<dyn JokeProvider>>,
    cache: Option<WeatherCache>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weather(mut self, provider: Arc<dyn WeatherProvider>) -> Self {
        self.weather = Some(provider);
        self
    }

    pub fn with_jokes(mut self, provider: Arc<dyn JokeProvider>) -> Self {
        self.jokes = Some(provider);
        self
    }

    pub fn with_cache(mut self, store: Arc<dyn ObjectStore>, prefix: &str, ttl_secs: u64) -> Self {
        self.cache = Some(WeatherCache {
            store,
            prefix: prefix.to_owned(),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        });
        self
    }

    pub fn weather(&self, city: &str, units: &str, today: NaiveDate) -> WeatherSnapshot {
        self.weather_at(city, units, today, chrono::Utc::now().timestamp())
    }

    /// Weather for `city` as seen at unix time `now_ts`.
    pub fn weather_at(&self, city: &str, units: &str, today: NaiveDate, now_ts: i64) -> WeatherSnapshot {
        let Some(provider) = &self.weather else {
            return WeatherSnapshot::stub(city);
        };

        let key = self
            .cache
            .as_ref()
            .map(|c| weather_cache_key(&c.prefix, city, units));
        if let (Some(cache), Some(key)) = (&self.cache, &key)
            && let Some(hit) = cache.load(key, now_ts)
        {
            tracing::debug!(city, key = %key, "weather cache hit");
            return WeatherSnapshot::from_report(city, &hit.report, hit.forecast);
        }

        let report = match provider.current(city, units) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(city, error = %e, "weather provider failed; using stub");
                return WeatherSnapshot::stub(city);
            }
        };
        let forecast = provider
            .forecast(city, units, today, FORECAST_DAYS)
            .unwrap_or_else(|e| {
                tracing::warn!(city, error = %e, "forecast unavailable");
                Vec::new()
            });

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            cache.save(
                key,
                &CachedWeather {
                    fetched_at: now_ts,
                    report: report.clone(),
                    forecast: forecast.clone(),
                },
            );
        }
        WeatherSnapshot::from_report(city, &report, forecast)
    }

    pub fn joke(&self, date: NaiveDate) -> String {
        if let Some(provider) = &self.jokes {
            match provider.joke() {
                Ok(j) => return j,
                Err(e) => tracing::warn!(error = %e, "joke provider failed; using local joke"),
            }
        }
        local_joke(date).to_owned()
    }

    #[tracing::instrument(skip(self))]
    pub fn build(&self, req: &ContextRequest<'_>) -> RenderContext {
        RenderContext {
            weather: self.weather(req.city, req.units, req.date),
            joke: if req.show_joke {
                self.joke(req.date)
            } else {
                String::new()
            },
            date: req.date.format(DATE_FORMAT).to_string(),
            theme: req.theme.to_owned(),
            device: req.device.to_owned(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/snapshot.rs"]
mod tests;
