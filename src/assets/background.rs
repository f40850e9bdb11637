//! Background resolution: an ordered chain of tiers ending in a synthesized placeholder.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::assets::decode::decode_image;
use crate::foundation::config::{KeyConventions, Partition};
use crate::foundation::core::Canvas;
use crate::foundation::error::InkframeResult;
use crate::render::fonts::FontCache;
use crate::render::placeholder::placeholder_image;
use crate::store::{ObjectStore, read_optional};

/// Which tier produced a background.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Fresh,
    LocalFallback,
    StaleRemote,
    Placeholder,
}

impl SourceTier {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceTier::Fresh => "fresh",
            SourceTier::LocalFallback => "local_fallback",
            SourceTier::StaleRemote => "stale_remote",
            SourceTier::Placeholder => "placeholder",
        }
    }
}

impl std::fmt::Display for SourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded background and where it came from.
#[derive(Clone, Debug)]
pub struct ImageAsset {
    pub pixels: RgbaImage,
    pub source_tier: SourceTier,
    /// Object key or file path; `placeholder` for the synthesized image.
    pub origin: String,
}

/// The slot being resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackgroundRequest {
    pub week_start: NaiveDate,
    pub day_index: u32,
    pub variant_index: u32,
    pub theme: String,
}

/// One step of the fallback chain.
///
/// `Ok(None)` is a miss. Errors are logged by the resolver and treated as misses, except
/// `StoreUnavailable`.
pub trait BackgroundTier: Send + Sync {
    fn tier(&self) -> SourceTier;

    fn name(&self) -> &'static str;

    fn attempt(&self, req: &BackgroundRequest) -> InkframeResult<Option<ImageAsset>>;
}

fn decoded(bytes: &[u8], tier: SourceTier, origin: String) -> Option<ImageAsset> {
    match decode_image(bytes) {
        Ok(pixels) => Some(ImageAsset {
            pixels,
            source_tier: tier,
            origin,
        }),
        Err(e) => {
            tracing::warn!(tier = %tier, key = %origin, error = %e, "background failed to decode");
            None
        }
    }
}

/// This week's generated art.
pub struct FreshRemoteTier {
    store: Arc<dyn ObjectStore>,
    keys: KeyConventions,
}

impl FreshRemoteTier {
    pub fn new(store: Arc<dyn ObjectStore>, keys: KeyConventions) -> Self {
        Self { store, keys }
    }
}

impl BackgroundTier for FreshRemoteTier {
    fn tier(&self) -> SourceTier {
        SourceTier::Fresh
    }

    fn name(&self) -> &'static str {
        "fresh_remote"
    }

    fn attempt(&self, req: &BackgroundRequest) -> InkframeResult<Option<ImageAsset>> {
        let key = self
            .keys
            .fresh_key(req.week_start, req.day_index, req.variant_index);
        let Some(bytes) = read_optional(self.store.as_ref(), &key)? else {
            tracing::debug!(key = %key, "fresh background missing");
            return Ok(None);
        };
        Ok(decoded(&bytes, self.tier(), key))
    }
}

/// Art bundled with the deployment.
pub struct LocalFallbackTier {
    root: PathBuf,
    keys: KeyConventions,
}

impl LocalFallbackTier {
    pub fn new(root: impl Into<PathBuf>, keys: KeyConventions) -> Self {
        Self {
            root: root.into(),
            keys,
        }
    }
}

impl BackgroundTier for LocalFallbackTier {
    fn tier(&self) -> SourceTier {
        SourceTier::LocalFallback
    }

    fn name(&self) -> &'static str {
        "local_fallback"
    }

    fn attempt(&self, req: &BackgroundRequest) -> InkframeResult<Option<ImageAsset>> {
        let candidates =
            self.keys
                .local_fallback_paths(&self.root, &req.theme, req.day_index, req.variant_index);
        for path in candidates {
            if !path.is_file() {
                continue;
            }
            let bytes = std::fs::read(&path)
                .with_context(|| format!("read fallback art '{}'", path.display()))?;
            if let Some(asset) = decoded(&bytes, self.tier(), path.display().to_string()) {
                return Ok(Some(asset));
            }
        }
        Ok(None)
    }
}

/// Any week's art for the same slot, then the theme's stock photos.
pub struct StaleRemoteTier {
    store: Arc<dyn ObjectStore>,
    keys: KeyConventions,
}

impl StaleRemoteTier {
    pub fn new(store: Arc<dyn ObjectStore>, keys: KeyConventions) -> Self {
        Self { store, keys }
    }

    fn first_decodable(&self, keys: impl IntoIterator<Item = String>) -> InkframeResult<Option<ImageAsset>> {
        for key in keys {
            let Some(bytes) = read_optional(self.store.as_ref(), &key)? else {
                continue;
            };
            if let Some(asset) = decoded(&bytes, SourceTier::StaleRemote, key) {
                return Ok(Some(asset));
            }
        }
        Ok(None)
    }
}

impl BackgroundTier for StaleRemoteTier {
    fn tier(&self) -> SourceTier {
        SourceTier::StaleRemote
    }

    fn name(&self) -> &'static str {
        "stale_remote"
    }

    fn attempt(&self, req: &BackgroundRequest) -> InkframeResult<Option<ImageAsset>> {
        let suffix = self.keys.stale_suffix(req.day_index, req.variant_index);
        let mut weekly: Vec<String> = self
            .store
            .list(&self.keys.weekly_prefix)?
            .into_iter()
            .filter(|k| k.ends_with(&suffix))
            .collect();
        // Keys embed the ISO week start, so descending order is newest first.
        weekly.sort_unstable_by(|a, b| b.cmp(a));
        if let Some(asset) = self.first_decodable(weekly)? {
            return Ok(Some(asset));
        }

        if req.theme.is_empty() {
            return Ok(None);
        }
        for partition in [Partition::Current, Partition::Cache] {
            let prefix = self.keys.stock_partition_prefix(&req.theme, partition);
            let pool = self.store.list(&prefix)?;
            if pool.is_empty() {
                continue;
            }
            // Deterministic per slot, starting point rotates through the pool.
            let start = (req.day_index as usize * 7 + req.variant_index as usize) % pool.len();
            let ordered = pool[start..].iter().chain(&pool[..start]).cloned();
            if let Some(asset) = self.first_decodable(ordered)? {
                return Ok(Some(asset));
            }
        }
        Ok(None)
    }
}

/// Runs the tiers in order and synthesizes a placeholder when all miss.
pub struct BackgroundResolver {
    tiers: Vec<Box<dyn BackgroundTier>>,
    canvas: Canvas,
    fonts: Arc<FontCache>,
}

impl BackgroundResolver {
    pub fn new(tiers: Vec<Box<dyn BackgroundTier>>, canvas: Canvas, fonts: Arc<FontCache>) -> Self {
        Self {
            tiers,
            canvas,
            fonts,
        }
    }

    /// Fresh remote, local fallback, stale remote.
    pub fn standard(
        store: Arc<dyn ObjectStore>,
        keys: &KeyConventions,
        fallback_dir: impl Into<PathBuf>,
        canvas: Canvas,
        fonts: Arc<FontCache>,
    ) -> Self {
        let tiers: Vec<Box<dyn BackgroundTier>> = vec![
            Box::new(FreshRemoteTier::new(store.clone(), keys.clone())),
            Box::new(LocalFallbackTier::new(fallback_dir, keys.clone())),
            Box::new(StaleRemoteTier::new(store, keys.clone())),
        ];
        Self::new(tiers, canvas, fonts)
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Resolve one background. Only `StoreUnavailable` escapes.
    #[tracing::instrument(skip(self), fields(week = %req.week_start, day = req.day_index, variant = req.variant_index))]
    pub fn resolve(&self, req: &BackgroundRequest) -> InkframeResult<ImageAsset> {
        for tier in &self.tiers {
            match tier.attempt(req) {
                Ok(Some(asset)) => {
                    tracing::info!(tier = %asset.source_tier, origin = %asset.origin, "background resolved");
                    return Ok(asset);
                }
                Ok(None) => tracing::debug!(tier = tier.name(), "background tier missed"),
                Err(e) if e.is_store_unavailable() => {
                    tracing::error!(tier = tier.name(), error = %e, "object store unavailable");
                    return Err(e);
                }
                Err(e) => tracing::warn!(tier = tier.name(), error = %e, "background tier failed"),
            }
        }

        tracing::warn!(theme = %req.theme, "all background tiers missed; using placeholder");
        Ok(ImageAsset {
            pixels: placeholder_image(self.canvas, &self.fonts, "Image unavailable"),
            source_tier: SourceTier::Placeholder,
            origin: "placeholder".to_owned(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/background.rs"]
mod tests;
