use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::foundation::config::{KeyConventions, Partition, RotationSettings, is_safe_theme};
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::providers::StockPhotoProvider;
use crate::providers::pexels::theme_query;
use crate::store::{ObjectStore, read_optional};

/// Provider ids of the photos in one partition, keyed by id.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdManifest {
    pub ids: BTreeMap<u64, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LockRecord {
    acquired_at: i64,
    pid: u32,
}

/// Outcome of one theme's rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationReport {
    pub theme: String,
    /// Objects moved from `current/` into `cache/`.
    pub rotated: usize,
    pub saved: usize,
    pub duplicates: usize,
    pub provider_error: Option<String>,
}

/// Maintains the per-theme `current/` and `cache/` stock-photo partitions.
pub struct RotationManager {
    store: Arc<dyn ObjectStore>,
    provider: Arc<dyn StockPhotoProvider>,
    keys: KeyConventions,
    settings: RotationSettings,
}

// Releases the advisory lock when the rotation ends, however it ends.
struct LockGuard<'a> {
    store: &'a dyn ObjectStore,
    key: String,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.store.delete(&self.key) {
            tracing::warn!(key = %self.key, error = %e, "failed to release rotation lock");
        }
    }
}

impl RotationManager {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        provider: Arc<dyn StockPhotoProvider>,
        keys: KeyConventions,
        settings: RotationSettings,
    ) -> Self {
        Self {
            store,
            provider,
            keys,
            settings,
        }
    }

    pub fn rotate_and_refill(&self, theme: &str) -> InkframeResult<RotationReport> {
        self.rotate_and_refill_with(theme, &mut rand::rng(), chrono::Utc::now().timestamp())
    }

    /// Rotate every theme, collecting per-theme outcomes.
    pub fn rotate_all(&self, themes: &[String]) -> Vec<(String, InkframeResult<RotationReport>)> {
        themes
            .iter()
            .map(|t| (t.clone(), self.rotate_and_refill(t)))
            .collect()
    }

    /// [`Self::rotate_and_refill`] with an explicit rng and clock.
    #[tracing::instrument(skip(self, rng))]
    pub fn rotate_and_refill_with(
        &self,
        theme: &str,
        rng: &mut impl Rng,
        now_ts: i64,
    ) -> InkframeResult<RotationReport> {
        if !is_safe_theme(theme) {
            return Err(InkframeError::validation(format!("invalid theme '{theme}'")));
        }
        let _lock = self.acquire_lock(theme, now_ts)?;

        let rotated = self.rotate_partitions(theme)?;
        let mut report = RotationReport {
            theme: theme.to_owned(),
            rotated,
            saved: 0,
            duplicates: 0,
            provider_error: None,
        };

        let page = rng.random_range(1..=self.settings.max_page.max(1));
        let query = theme_query(theme);
        let photos = match self.provider.search(query, page, self.settings.per_theme * 2) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(theme, error = %e, "stock provider failed; keeping cache");
                report.provider_error = Some(e.to_string());
                return Ok(report);
            }
        };

        let cache_manifest = self.load_manifest(theme, Partition::Cache)?;
        let mut current_manifest = self.load_manifest(theme, Partition::Current)?;
        let mut seen: HashSet<u64> = cache_manifest
            .ids
            .keys()
            .chain(current_manifest.ids.keys())
            .copied()
            .collect();

        let prefix = self.keys.stock_partition_prefix(theme, Partition::Current);
        for photo in photos {
            if report.saved >= self.settings.per_theme {
                break;
            }
            if !seen.insert(photo.id) {
                report.duplicates += 1;
                continue;
            }
            let bytes = match self.provider.download(&photo) {
                Ok(b) => b,
                Err(e) => {
                    tracing::debug!(id = photo.id, error = %e, "stock download failed");
                    continue;
                }
            };
            let key = format!("{prefix}{:016x}.jpg", rng.random::<u64>());
            if let Err(e) = self.store.write(&key, &bytes, "image/jpeg") {
                if let Err(save_err) =
                    self.save_manifest(theme, Partition::Current, &current_manifest)
                {
                    tracing::warn!(theme, error = %save_err, "failed to save partial manifest");
                }
                return Err(e);
            }
            current_manifest.ids.insert(photo.id, key);
            report.saved += 1;
        }

        self.save_manifest(theme, Partition::Current, &current_manifest)?;
        tracing::info!(
            theme,
            rotated = report.rotated,
            saved = report.saved,
            duplicates = report.duplicates,
            "stock rotation finished"
        );
        Ok(report)
    }

    fn acquire_lock(&self, theme: &str, now_ts: i64) -> InkframeResult<LockGuard<'_>> {
        let key = self.keys.stock_lock_key(theme);
        if let Some(bytes) = read_optional(self.store.as_ref(), &key)? {
            let ttl = i64::try_from(self.settings.lock_ttl_secs).unwrap_or(i64::MAX);
            match serde_json::from_slice::<LockRecord>(&bytes) {
                Ok(lock) if now_ts - lock.acquired_at < ttl => {
                    return Err(InkframeError::RotationInProgress(theme.to_owned()));
                }
                Ok(_) => tracing::warn!(key = %key, "breaking stale rotation lock"),
                Err(e) => tracing::warn!(key = %key, error = %e, "breaking unreadable rotation lock"),
            }
        }
        let record = LockRecord {
            acquired_at: now_ts,
            pid: std::process::id(),
        };
        self.store
            .write(&key, &serde_json::to_vec(&record)?, "application/json")?;
        Ok(LockGuard {
            store: self.store.as_ref(),
            key,
        })
    }

    /// Move `current/` over `cache/`; a no-op when `current/` is empty.
    fn rotate_partitions(&self, theme: &str) -> InkframeResult<usize> {
        let current_prefix = self.keys.stock_partition_prefix(theme, Partition::Current);
        let cache_prefix = self.keys.stock_partition_prefix(theme, Partition::Cache);
        let current = self.store.list(&current_prefix)?;
        if current.is_empty() {
            tracing::debug!(theme, "current partition empty; nothing to rotate");
            return Ok(0);
        }

        for key in self.store.list(&cache_prefix)? {
            self.store.delete(&key)?;
        }

        let mut manifest = self.load_manifest(theme, Partition::Current)?;
        for key in &current {
            let name = key.strip_prefix(&current_prefix).unwrap_or(key);
            let dst = format!("{cache_prefix}{name}");
            self.store.copy(key, &dst)?;
            for v in manifest.ids.values_mut().filter(|v| v.as_str() == key.as_str()) {
                v.clone_from(&dst);
            }
        }
        for key in &current {
            self.store.delete(key)?;
        }

        self.save_manifest(theme, Partition::Cache, &manifest)?;
        self.store
            .delete(&self.keys.stock_manifest_key(theme, Partition::Current))?;
        Ok(current.len())
    }

    pub fn load_manifest(&self, theme: &str, partition: Partition) -> InkframeResult<IdManifest> {
        let key = self.keys.stock_manifest_key(theme, partition);
        match read_optional(self.store.as_ref(), &key)? {
            None => Ok(IdManifest::default()),
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(m) => Ok(m),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "id manifest unreadable; starting empty");
                    Ok(IdManifest::default())
                }
            },
        }
    }

    fn save_manifest(&self, theme: &str, partition: Partition, m: &IdManifest) -> InkframeResult<()> {
        let key = self.keys.stock_manifest_key(theme, partition);
        self.store
            .write(&key, &serde_json::to_vec_pretty(m)?, "application/json")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/rotation.rs"]
mod tests;
