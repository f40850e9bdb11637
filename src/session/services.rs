//! Wiring from [`InkframeConfig`] to concrete stores and HTTP providers.
//!
//! A provider is only built when its feature flag is on and, where one is needed, its API key is
//! set. `None` means "use the local fallback".

use std::sync::Arc;

use crate::foundation::config::InkframeConfig;
use crate::foundation::error::InkframeResult;
use crate::providers::dadjoke::DadJokes;
use crate::providers::http::HttpClient;
use crate::providers::huggingface::HuggingFace;
use crate::providers::openweather::{OpenWeather, OpenWeatherIcons};
use crate::providers::pexels::Pexels;
use crate::providers::{
    IconSource, ImageGenerator, JokeProvider, StockPhotoProvider, WeatherProvider,
};
use crate::store::{DirStore, ObjectStore};

/// Stock and generated images are a few MiB at most.
const IMAGE_BODY_LIMIT: u64 = 32 * 1024 * 1024;

pub fn open_store(config: &InkframeConfig) -> InkframeResult<Arc<dyn ObjectStore>> {
    Ok(Arc::new(DirStore::create(config.store_dir.clone())?))
}

fn key(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|k| !k.is_empty())
}

pub fn weather_provider(config: &InkframeConfig) -> Option<Arc<dyn WeatherProvider>> {
    if !config.features.openweather {
        return None;
    }
    let Some(api_key) = key(&config.keys.openweather) else {
        tracing::info!("no OpenWeather key configured; weather uses the stub");
        return None;
    };
    let http = HttpClient::new(config.timeouts.weather());
    Some(Arc::new(OpenWeather::new(http, api_key)))
}

pub fn joke_provider(config: &InkframeConfig) -> Option<Arc<dyn JokeProvider>> {
    config.features.jokes_api.then(|| {
        let http = HttpClient::new(config.timeouts.joke());
        Arc::new(DadJokes::new(http)) as Arc<dyn JokeProvider>
    })
}

pub fn stock_provider(config: &InkframeConfig) -> Option<Arc<dyn StockPhotoProvider>> {
    if !config.features.pexels {
        return None;
    }
    let api_key = key(&config.keys.pexels)?;
    let http = HttpClient::new(config.timeouts.photo()).with_max_body(IMAGE_BODY_LIMIT);
    Some(Arc::new(Pexels::new(http, api_key)))
}

pub fn image_generator(config: &InkframeConfig) -> Option<Arc<dyn ImageGenerator>> {
    let token = key(&config.keys.huggingface)?;
    let http = HttpClient::new(config.timeouts.generation()).with_max_body(IMAGE_BODY_LIMIT);
    Some(Arc::new(HuggingFace::new(http, token)))
}

pub fn icon_source(config: &InkframeConfig) -> Arc<dyn IconSource> {
    Arc::new(OpenWeatherIcons::new(HttpClient::new(config.timeouts.icon())))
}
