use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate};
use rand::Rng;
use serde::Serialize;

use crate::assets::background::{BackgroundRequest, BackgroundResolver, SourceTier};
use crate::assets::decode::{encode_png, encode_png_rgb};
use crate::assets::normalize::normalize_to_canvas;
use crate::data::context::RenderContext;
use crate::data::snapshot::{ContextRequest, SnapshotBuilder};
use crate::foundation::config::{IconStyle, InkframeConfig, is_safe_theme};
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::layout::model::LayoutDocument;
use crate::layout::store::{LayoutSource, LayoutStore, validate_device};
use crate::providers::{IconSource, JokeProvider, WeatherProvider};
use crate::render::fonts::FontCache;
use crate::render::icons::IconCache;
use crate::render::layout::LayoutRenderer;
use crate::render::quantize::quantize;
use crate::session::services;
use crate::store::ObjectStore;

/// Device used when a request names none.
pub const DEFAULT_DEVICE: &str = "familydisplay";

/// One device's request for a frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameRequest {
    pub device_id: String,
    /// 0 = Monday.
    pub day_index: u32,
    pub variant_index: u32,
    pub city: Option<String>,
    pub units: Option<String>,
    pub theme: Option<String>,
    pub show_joke: bool,
    /// Local date to render for; today when unset.
    pub date: Option<NaiveDate>,
    pub username: Option<String>,
    /// Overrides the configured quantize feature.
    pub quantize: Option<bool>,
}

impl FrameRequest {
    /// A request for `date`, with the day slot taken from its weekday.
    pub fn for_date(device_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            device_id: device_id.into(),
            day_index: date.weekday().num_days_from_monday(),
            show_joke: true,
            date: Some(date),
            ..Self::default()
        }
    }
}

/// Where a frame's pieces came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FrameDiagnostics {
    pub tier: SourceTier,
    pub background_origin: String,
    pub theme: String,
    pub day_index: u32,
    pub variant_index: u32,
    pub quantized: bool,
    pub skipped_elements: usize,
    /// `None` when the built-in default layout was used.
    pub layout_key: Option<String>,
}

impl FrameDiagnostics {
    /// Response headers for an HTTP layer.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("X-Background-Tier", self.tier.as_str().to_owned()),
            ("X-Background-Key", self.background_origin.clone()),
            ("X-Theme", self.theme.clone()),
            (
                "X-Variant",
                format!("{}_{}", self.day_index, self.variant_index),
            ),
        ]
    }
}

/// A finished, encoded frame.
#[derive(Clone, Debug)]
pub struct RenderedFrame {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub date: NaiveDate,
    pub diagnostics: FrameDiagnostics,
}

/// Owns every long-lived piece of the pipeline and renders frames on demand.
///
/// `Send + Sync`; share one per process.
pub struct FrameComposer {
    config: InkframeConfig,
    store: Arc<dyn ObjectStore>,
    fonts: Arc<FontCache>,
    icons: IconCache,
    icon_source: Option<Arc<dyn IconSource>>,
    resolver: BackgroundResolver,
    snapshots: SnapshotBuilder,
    layouts: LayoutStore,
}

pub struct FrameComposerBuilder {
    config: InkframeConfig,
    store: Arc<dyn ObjectStore>,
    fonts: Option<Arc<FontCache>>,
    weather: Option<Arc<dyn WeatherProvider>>,
    jokes: Option<Arc<dyn JokeProvider>>,
    icon_source: Option<Arc<dyn IconSource>>,
    resolver: Option<BackgroundResolver>,
}

impl FrameComposerBuilder {
    pub fn fonts(mut self, fonts: Arc<FontCache>) -> Self {
        self.fonts = Some(fonts);
        self
    }

    pub fn weather(mut self, provider: Arc<dyn WeatherProvider>) -> Self {
        self.weather = Some(provider);
        self
    }

    pub fn jokes(mut self, provider: Arc<dyn JokeProvider>) -> Self {
        self.jokes = Some(provider);
        self
    }

    pub fn icon_source(mut self, source: Arc<dyn IconSource>) -> Self {
        self.icon_source = Some(source);
        self
    }

    /// Replace the standard tier chain.
    pub fn resolver(mut self, resolver: BackgroundResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> InkframeResult<FrameComposer> {
        let config = self.config;
        config.validate()?;

        let fonts = self
            .fonts
            .unwrap_or_else(|| Arc::new(FontCache::load(&config.fonts)));
        if fonts.is_empty() {
            tracing::warn!("no fonts available; text elements will be skipped");
        }
        let resolver = self.resolver.unwrap_or_else(|| {
            BackgroundResolver::standard(
                self.store.clone(),
                &config.keys_layout,
                config.fallback_dir.clone(),
                config.canvas,
                fonts.clone(),
            )
        });

        let mut snapshots = SnapshotBuilder::new().with_cache(
            self.store.clone(),
            &config.keys_layout.weather_cache_prefix,
            config.weather_cache_ttl_secs,
        );
        if let Some(w) = self.weather {
            snapshots = snapshots.with_weather(w);
        }
        if let Some(j) = self.jokes {
            snapshots = snapshots.with_jokes(j);
        }

        let layouts = LayoutStore::new(
            self.store.clone(),
            config.keys_layout.clone(),
            config.features.email_users,
        );

        Ok(FrameComposer {
            icons: IconCache::new(config.icon_cache_capacity),
            icon_source: self.icon_source,
            store: self.store,
            fonts,
            resolver,
            snapshots,
            layouts,
            config,
        })
    }
}

impl FrameComposer {
    pub fn builder(config: InkframeConfig, store: Arc<dyn ObjectStore>) -> FrameComposerBuilder {
        FrameComposerBuilder {
            config,
            store,
            fonts: None,
            weather: None,
            jokes: None,
            icon_source: None,
            resolver: None,
        }
    }

    /// Directory store plus whichever HTTP providers the config enables.
    pub fn from_config(config: InkframeConfig) -> InkframeResult<Self> {
        let store = services::open_store(&config)?;
        let mut builder = Self::builder(config.clone(), store);
        if let Some(w) = services::weather_provider(&config) {
            builder = builder.weather(w);
        }
        if let Some(j) = services::joke_provider(&config) {
            builder = builder.jokes(j);
        }
        if config.icon_style == IconStyle::Bitmap {
            builder = builder.icon_source(services::icon_source(&config));
        }
        builder.build()
    }

    pub fn config(&self) -> &InkframeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn layouts(&self) -> &LayoutStore {
        &self.layouts
    }

    pub fn render_frame(&self, req: &FrameRequest) -> InkframeResult<RenderedFrame> {
        self.render_frame_with(req, &mut rand::rng())
    }

    /// [`Self::render_frame`] with an explicit rng for the theme pick.
    ///
    /// Every failure degrades to a fallback except an unavailable object store.
    #[tracing::instrument(skip(self, req, rng), fields(device = %req.device_id, day = req.day_index, variant = req.variant_index))]
    pub fn render_frame_with(
        &self,
        req: &FrameRequest,
        rng: &mut impl Rng,
    ) -> InkframeResult<RenderedFrame> {
        let result = self.compose(req, rng);
        if let Err(e) = &result {
            tracing::error!(error = %e, "frame render aborted");
        }
        result
    }

    fn compose(&self, req: &FrameRequest, rng: &mut impl Rng) -> InkframeResult<RenderedFrame> {
        if req.day_index > 6 {
            return Err(InkframeError::validation(format!(
                "day_index {} is outside 0..=6",
                req.day_index
            )));
        }
        let canvas = self.config.canvas;
        let date = req.date.unwrap_or_else(|| chrono::Local::now().date_naive());
        let theme = self.pick_theme(req.theme.as_deref(), rng);

        let (doc, source) = self.layouts.load(device_or_default(req), req.username.as_deref())?;
        let ctx = self.context_for(req, &doc, &theme, date);

        let asset = self.resolver.resolve(&BackgroundRequest {
            week_start: week_start(date),
            day_index: req.day_index,
            variant_index: req.variant_index,
            theme: theme.clone(),
        })?;
        let background = normalize_to_canvas(asset.pixels, canvas);

        let mut renderer = LayoutRenderer::new(canvas, &self.fonts);
        if self.config.icon_style == IconStyle::Bitmap
            && let Some(source) = &self.icon_source
        {
            renderer = renderer.with_bitmap_icons(&self.icons, source.as_ref());
        }
        let (image, skipped) = match renderer.render(&background, &doc, &ctx) {
            Ok(out) => (out.image, out.skipped),
            Err(e) => {
                tracing::warn!(error = %e, "layout render failed; sending background only");
                (background, doc.elements.len())
            }
        };

        let quantized = req.quantize.unwrap_or(self.config.features.quantize);
        let png = if quantized {
            let rgb = image::DynamicImage::ImageRgba8(image).to_rgb8();
            encode_png_rgb(&quantize(&rgb, &self.config.palette)?)?
        } else {
            encode_png(&image)?
        };

        let frame = RenderedFrame {
            png,
            width: canvas.width,
            height: canvas.height,
            date,
            diagnostics: FrameDiagnostics {
                tier: asset.source_tier,
                background_origin: asset.origin,
                theme,
                day_index: req.day_index,
                variant_index: req.variant_index,
                quantized,
                skipped_elements: skipped,
                layout_key: match source {
                    LayoutSource::Stored(key) => Some(key),
                    LayoutSource::Default => None,
                },
            },
        };
        if self.config.features.persist_renders {
            self.persist(req, &frame);
        }
        tracing::info!(
            tier = %frame.diagnostics.tier,
            theme = %frame.diagnostics.theme,
            bytes = frame.png.len(),
            "frame rendered"
        );
        Ok(frame)
    }

    /// The data a layout would bind to, for designer previews.
    pub fn render_data(&self, req: &FrameRequest) -> InkframeResult<RenderContext> {
        let date = req.date.unwrap_or_else(|| chrono::Local::now().date_naive());
        let theme = self.pick_theme(req.theme.as_deref(), &mut rand::rng());
        let (doc, _) = self.layouts.load(device_or_default(req), req.username.as_deref())?;
        Ok(self.context_for(req, &doc, &theme, date))
    }

    fn context_for(
        &self,
        req: &FrameRequest,
        doc: &LayoutDocument,
        theme: &str,
        date: NaiveDate,
    ) -> RenderContext {
        let city = req
            .city
            .as_deref()
            .or(doc.city.as_deref())
            .unwrap_or(&self.config.default_city);
        let units = req.units.as_deref().unwrap_or(&self.config.units);
        self.snapshots.build(&ContextRequest {
            city,
            units,
            date,
            theme,
            device: device_or_default(req),
            show_joke: req.show_joke,
        })
    }

    fn pick_theme(&self, requested: Option<&str>, rng: &mut impl Rng) -> String {
        if let Some(t) = requested.map(str::trim).filter(|t| !t.is_empty()) {
            if is_safe_theme(t) {
                return t.to_owned();
            }
            tracing::warn!(theme = %t, "unsafe theme requested; picking a configured one");
        }
        let themes = &self.config.themes;
        match themes.len() {
            0 => "abstract".to_owned(),
            n => themes[rng.random_range(0..n)].clone(),
        }
    }

    fn persist(&self, req: &FrameRequest, frame: &RenderedFrame) {
        let device = device_or_default(req);
        if let Err(e) = validate_device(device) {
            tracing::warn!(error = %e, "not persisting render");
            return;
        }
        let prefix = self.config.keys_layout.render_prefix(
            device,
            req.username.as_deref(),
            self.config.features.email_users,
        );
        let dated = format!("{prefix}{}.png", frame.date.format("%Y-%m-%d"));
        for key in [format!("{prefix}latest.png"), dated] {
            if let Err(e) = self.store.write(&key, &frame.png, "image/png") {
                tracing::warn!(key = %key, error = %e, "failed to persist render");
            }
        }
    }
}

fn device_or_default(req: &FrameRequest) -> &str {
    match req.device_id.trim() {
        "" => DEFAULT_DEVICE,
        _ => &req.device_id,
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

#[cfg(test)]
#[path = "../../tests/unit/session/composer.rs"]
mod tests;
