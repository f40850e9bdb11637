use serde::{Deserialize, Serialize};

use crate::data::weather::WeatherSnapshot;

/// Everything a layout can bind to for one render.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderContext {
    pub weather: WeatherSnapshot,
    pub joke: String,
    pub date: String,
    pub theme: String,
    pub device: String,
}
