use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::foundation::core::Canvas;
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::render::quantize::PaletteSpec;

/// Process-wide configuration.
///
/// Built from defaults, an optional JSON file, then `INKFRAME_*` environment overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InkframeConfig {
    pub canvas: Canvas,
    pub themes: Vec<String>,
    pub default_city: String,
    pub units: String,
    pub store_dir: PathBuf,
    pub fallback_dir: PathBuf,
    pub fonts: FontPaths,
    pub keys: ApiKeys,
    pub features: Features,
    pub timeouts: Timeouts,
    pub icon_style: IconStyle,
    pub icon_cache_capacity: usize,
    pub rotation: RotationSettings,
    pub weather_cache_ttl_secs: u64,
    pub keys_layout: KeyConventions,
    pub palette: PaletteSpec,
    /// Prompts for the weekly art job; the index of a prompt is its variant index.
    pub theme_prompts: Vec<String>,
}

impl Default for InkframeConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::DEFAULT,
            themes: ["abstract", "geometric", "kids", "photo"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            default_city: "Darwin".to_owned(),
            units: "metric".to_owned(),
            store_dir: PathBuf::from("data/store"),
            fallback_dir: PathBuf::from("assets/fallback_art"),
            fonts: FontPaths::default(),
            keys: ApiKeys::default(),
            features: Features::default(),
            timeouts: Timeouts::default(),
            icon_style: IconStyle::Procedural,
            icon_cache_capacity: 32,
            rotation: RotationSettings::default(),
            weather_cache_ttl_secs: 3600,
            keys_layout: KeyConventions::default(),
            palette: PaletteSpec::six_color(),
            theme_prompts: default_theme_prompts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontPaths {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
    /// Fall back to installed system fonts when the files above are missing.
    pub system_fallback: bool,
}

impl Default for FontPaths {
    fn default() -> Self {
        Self {
            regular: Some(PathBuf::from("assets/fonts/Roboto-Regular.ttf")),
            bold: Some(PathBuf::from("assets/fonts/Roboto-Bold.ttf")),
            system_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openweather: Option<String>,
    pub pexels: Option<String>,
    pub huggingface: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub openweather: bool,
    pub jokes_api: bool,
    pub pexels: bool,
    pub email_users: bool,
    pub persist_renders: bool,
    pub quantize: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            openweather: true,
            jokes_api: true,
            pexels: true,
            email_users: false,
            persist_renders: false,
            quantize: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub weather_secs: u64,
    pub joke_secs: u64,
    pub photo_secs: u64,
    pub icon_secs: u64,
    /// Image generation runs in the weekly batch job, never on the render path.
    pub generation_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            weather_secs: 8,
            joke_secs: 6,
            photo_secs: 8,
            icon_secs: 5,
            generation_secs: 120,
        }
    }
}

impl Timeouts {
    pub fn weather(&self) -> Duration {
        Duration::from_secs(self.weather_secs)
    }

    pub fn joke(&self) -> Duration {
        Duration::from_secs(self.joke_secs)
    }

    pub fn photo(&self) -> Duration {
        Duration::from_secs(self.photo_secs)
    }

    pub fn icon(&self) -> Duration {
        Duration::from_secs(self.icon_secs)
    }

    pub fn generation(&self) -> Duration {
        Duration::from_secs(self.generation_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconStyle {
    Procedural,
    Bitmap,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    pub per_theme: usize,
    pub max_page: u32,
    pub lock_ttl_secs: u64,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            per_theme: 8,
            max_page: 10,
            lock_ttl_secs: 600,
        }
    }
}

/// Object-store and bundled-file naming.
///
/// Deployments disagree on these, so they are configuration rather than contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConventions {
    pub weekly_prefix: String,
    pub stock_prefix: String,
    pub layouts_prefix: String,
    pub renders_prefix: String,
    pub weather_cache_prefix: String,
}

impl Default for KeyConventions {
    fn default() -> Self {
        Self {
            weekly_prefix: "weekly-art/".to_owned(),
            stock_prefix: "stock/".to_owned(),
            layouts_prefix: "layouts/".to_owned(),
            renders_prefix: "renders/".to_owned(),
            weather_cache_prefix: "cache/weather/".to_owned(),
        }
    }
}

/// One of the two stock-photo partitions kept per theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Current,
    Cache,
}

impl Partition {
    pub fn as_str(self) -> &'static str {
        match self {
            Partition::Current => "current",
            Partition::Cache => "cache",
        }
    }
}

impl KeyConventions {
    /// `weekly-art/2025-06-02_2_1.png`
    pub fn fresh_key(&self, week_start: NaiveDate, day_index: u32, variant_index: u32) -> String {
        format!(
            "{}{}_{day_index}_{variant_index}.png",
            self.weekly_prefix,
            week_start.format("%Y-%m-%d")
        )
    }

    /// Suffix any week's blob for this slot ends with.
    pub fn stale_suffix(&self, day_index: u32, variant_index: u32) -> String {
        format!("_{day_index}_{variant_index}.png")
    }

    /// Candidate bundled files, most specific first.
    pub fn local_fallback_paths(
        &self,
        root: &Path,
        theme: &str,
        day_index: u32,
        variant_index: u32,
    ) -> Vec<PathBuf> {
        let name = format!("{day_index}_{variant_index}.png");
        let mut out = Vec::with_capacity(2);
        if is_safe_theme(theme) {
            out.push(root.join(theme).join(&name));
        }
        out.push(root.join(name));
        out
    }

    pub fn stock_partition_prefix(&self, theme: &str, partition: Partition) -> String {
        format!("{}{theme}/{}/", self.stock_prefix, partition.as_str())
    }

    pub fn stock_manifest_key(&self, theme: &str, partition: Partition) -> String {
        format!("{}{theme}/{}.ids.json", self.stock_prefix, partition.as_str())
    }

    pub fn stock_lock_key(&self, theme: &str) -> String {
        format!("{}{theme}/rotation.lock", self.stock_prefix)
    }

    pub fn layout_key(&self, device: &str, username: Option<&str>, per_user: bool) -> String {
        match username.filter(|_| per_user).map(safe_email) {
            Some(user) => format!("users/{user}/devices/{device}/layouts/current.json"),
            None => format!("{}{device}.json", self.layouts_prefix),
        }
    }

    pub fn render_prefix(&self, device: &str, username: Option<&str>, per_user: bool) -> String {
        match username.filter(|_| per_user).map(safe_email) {
            Some(user) => format!("users/{user}/devices/{device}/renders/"),
            None => format!("{}{device}/", self.renders_prefix),
        }
    }
}

/// Make an email address usable as an object-store path segment.
pub fn safe_email(email: &str) -> String {
    email.replace('@', "_at_").replace('.', "_")
}

/// A theme name that stays a single path segment under any prefix or directory.
pub fn is_safe_theme(theme: &str) -> bool {
    !theme.is_empty() && !theme.contains(['/', '\\']) && !theme.contains("..")
}

fn default_theme_prompts() -> Vec<String> {
    [
        "A sunrise over a cityscape in bold geometric shapes and hard lines, a limited six colour palette of black, white and one primary colour, solid colour blocks without gradients, capturing a {day_name} morning.",
        "An abstract semi-flat landscape in dreamy pastel colour blocks, high contrast, layered shapes suggesting the weather on a {day_name} morning.",
        "A cozy hand-drawn cartoon scene looking out a window at the weather, thick outlines and warm solid fills, the comfort of a {day_name} morning.",
        "A surreal futuristic cityscape where the weather is manufactured, neon style in three distinct colours with solid fields and bold lines, the strange energy of a {day_name} morning.",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

impl InkframeConfig {
    /// Defaults, then the optional JSON file, then process environment.
    pub fn load(path: Option<&Path>) -> InkframeResult<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_json_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env_with(|k| std::env::var(k).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: &Path) -> InkframeResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)?;
        Ok(cfg)
    }

    /// Apply `INKFRAME_*` overrides read through `lookup`.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let flag = |k: &str| get(k).map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"));

        if let Some(v) = get("INKFRAME_CANVAS")
            && let Some((w, h)) = v.split_once('x')
            && let (Ok(w), Ok(h)) = (w.trim().parse(), h.trim().parse())
        {
            self.canvas = Canvas {
                width: w,
                height: h,
            };
        }
        if let Some(v) = get("INKFRAME_THEMES") {
            self.themes = v
                .split(',')
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty())
                .collect();
        }
        if let Some(v) = get("INKFRAME_DEFAULT_CITY") {
            self.default_city = v;
        }
        if let Some(v) = get("INKFRAME_UNITS") {
            self.units = v;
        }
        if let Some(v) = get("INKFRAME_STORE_DIR") {
            self.store_dir = PathBuf::from(v);
        }
        if let Some(v) = get("INKFRAME_FALLBACK_DIR") {
            self.fallback_dir = PathBuf::from(v);
        }
        if let Some(v) = get("INKFRAME_FONT_REGULAR") {
            self.fonts.regular = Some(PathBuf::from(v));
        }
        if let Some(v) = get("INKFRAME_FONT_BOLD") {
            self.fonts.bold = Some(PathBuf::from(v));
        }
        if let Some(v) = get("INKFRAME_OPENWEATHER_KEY") {
            self.keys.openweather = Some(v);
        }
        if let Some(v) = get("INKFRAME_PEXELS_KEY") {
            self.keys.pexels = Some(v);
        }
        if let Some(v) = get("INKFRAME_HF_TOKEN") {
            self.keys.huggingface = Some(v);
        }
        if let Some(v) = get("INKFRAME_ICON_STYLE") {
            match v.to_ascii_lowercase().as_str() {
                "bitmap" => self.icon_style = IconStyle::Bitmap,
                "procedural" => self.icon_style = IconStyle::Procedural,
                other => tracing::warn!(value = other, "ignoring unknown INKFRAME_ICON_STYLE"),
            }
        }
        if let Some(b) = flag("INKFRAME_ENABLE_OPENWEATHER") {
            self.features.openweather = b;
        }
        if let Some(b) = flag("INKFRAME_ENABLE_JOKES_API") {
            self.features.jokes_api = b;
        }
        if let Some(b) = flag("INKFRAME_ENABLE_PEXELS") {
            self.features.pexels = b;
        }
        if let Some(b) = flag("INKFRAME_ENABLE_EMAIL_USERS") {
            self.features.email_users = b;
        }
        if let Some(b) = flag("INKFRAME_PERSIST_RENDERS") {
            self.features.persist_renders = b;
        }
        if let Some(b) = flag("INKFRAME_QUANTIZE") {
            self.features.quantize = b;
        }
    }

    pub fn validate(&self) -> InkframeResult<()> {
        self.canvas.validate()?;
        if self.themes.is_empty() {
            return Err(InkframeError::validation("at least one theme is required"));
        }
        if self.palette.colors().is_empty() {
            return Err(InkframeError::validation("palette must not be empty"));
        }
        if self.icon_cache_capacity == 0 {
            return Err(InkframeError::validation("icon_cache_capacity must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
