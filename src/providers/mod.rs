//! Outbound collaborators, specified at their trait boundary.
//!
//! Each trait has an HTTP implementation built on [`http::HttpClient`]; tests substitute their
//! own impls.

pub mod dadjoke;
pub mod http;
pub mod huggingface;
pub mod openweather;
pub mod pexels;

use chrono::NaiveDate;

use crate::data::weather::{ForecastDay, WeatherReport};
use crate::foundation::error::InkframeResult;

pub trait WeatherProvider: Send + Sync {
    fn current(&self, city: &str, units: &str) -> InkframeResult<WeatherReport>;

    /// Up to `days` upcoming days, excluding `today`.
    fn forecast(
        &self,
        _city: &str,
        _units: &str,
        _today: NaiveDate,
        _days: usize,
    ) -> InkframeResult<Vec<ForecastDay>> {
        Ok(Vec::new())
    }
}

pub trait JokeProvider: Send + Sync {
    fn joke(&self) -> InkframeResult<String>;
}

/// A search hit from a stock-photo provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockPhoto {
    pub id: u64,
    pub url: String,
}

pub trait StockPhotoProvider: Send + Sync {
    fn search(&self, query: &str, page: u32, per_page: usize) -> InkframeResult<Vec<StockPhoto>>;

    fn download(&self, photo: &StockPhoto) -> InkframeResult<Vec<u8>>;
}

/// Text-to-image generation.
pub trait ImageGenerator: Send + Sync {
    /// Encoded image bytes for `prompt`.
    fn generate(&self, prompt: &str) -> InkframeResult<Vec<u8>>;
}

/// Encoded bitmap weather icons by provider icon code (e.g. `01d`).
pub trait IconSource: Send + Sync {
    fn fetch(&self, code: &str) -> InkframeResult<Vec<u8>>;
}
