use std::sync::Arc;

use crate::foundation::config::KeyConventions;
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::layout::model::LayoutDocument;
use crate::store::{ObjectStore, read_optional};

/// Where a render's layout came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutSource {
    Stored(String),
    Default,
}

/// Per-device layout persistence.
pub struct LayoutStore {
    store: Arc<dyn ObjectStore>,
    keys: KeyConventions,
    per_user: bool,
}

impl LayoutStore {
    pub fn new(store: Arc<dyn ObjectStore>, keys: KeyConventions, per_user: bool) -> Self {
        Self {
            store,
            keys,
            per_user,
        }
    }

    pub fn key_for(&self, device: &str, username: Option<&str>) -> String {
        self.keys.layout_key(device, username, self.per_user)
    }

    /// The stored layout, or the built-in default.
    ///
    /// Only an unavailable store is an error; missing or unparsable documents fall back.
    #[tracing::instrument(skip(self))]
    pub fn load(
        &self,
        device: &str,
        username: Option<&str>,
    ) -> InkframeResult<(LayoutDocument, LayoutSource)> {
        if let Err(e) = validate_device(device) {
            tracing::warn!(error = %e, "unsafe device id; using default layout");
            return Ok((LayoutDocument::default_for(device), LayoutSource::Default));
        }
        let key = self.key_for(device, username);
        let bytes = match read_optional(self.store.as_ref(), &key) {
            Ok(Some(b)) => b,
            Ok(None) => {
                tracing::debug!(key = %key, "no stored layout; using default");
                return Ok((LayoutDocument::default_for(device), LayoutSource::Default));
            }
            Err(e) if e.is_store_unavailable() => return Err(e),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "layout read failed; using default");
                return Ok((LayoutDocument::default_for(device), LayoutSource::Default));
            }
        };
        match LayoutDocument::from_json_slice(&bytes) {
            Ok(mut doc) => {
                if doc.device_id.is_empty() {
                    doc.device_id = device.to_owned();
                }
                Ok((doc, LayoutSource::Stored(key)))
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "stored layout is invalid; using default");
                Ok((LayoutDocument::default_for(device), LayoutSource::Default))
            }
        }
    }

    /// Validate and persist a designer payload; returns the key written.
    #[tracing::instrument(skip(self, payload))]
    pub fn save(
        &self,
        device: &str,
        username: Option<&str>,
        payload: &serde_json::Value,
    ) -> InkframeResult<String> {
        validate_device(device)?;
        if !payload.get("elements").is_some_and(|e| e.is_array()) {
            return Err(InkframeError::validation("layout payload needs an 'elements' array"));
        }
        let key = self.key_for(device, username);
        let bytes = serde_json::to_vec_pretty(payload)?;
        self.store.write(&key, &bytes, "application/json")?;
        tracing::info!(key = %key, bytes = bytes.len(), "layout saved");
        Ok(key)
    }
}

pub(crate) fn validate_device(device: &str) -> InkframeResult<()> {
    let ok = !device.is_empty()
        && device
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && device != "."
        && device != "..";
    if ok {
        Ok(())
    } else {
        Err(InkframeError::validation(format!("invalid device id '{device}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/store.rs"]
mod tests;
