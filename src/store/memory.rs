use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{InkframeError, InkframeResult};
use crate::store::{ObjectStore, normalize_key};

#[derive(Clone, Debug)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// In-process store. Useful for tests and for running without persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a backend outage: every call fails with `StoreUnavailable` while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        let key = normalize_key(key).ok()?;
        self.objects
            .read()
            .ok()?
            .get(&key)
            .map(|o| o.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> InkframeResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(InkframeError::store_unavailable("memory store is offline"));
        }
        Ok(())
    }

    fn poisoned() -> InkframeError {
        InkframeError::store_unavailable("memory store lock poisoned")
    }
}

impl ObjectStore for MemoryStore {
    fn exists(&self, key: &str) -> InkframeResult<bool> {
        self.check_online()?;
        let key = normalize_key(key)?;
        let map = self.objects.read().map_err(|_| Self::poisoned())?;
        Ok(map.contains_key(&key))
    }

    fn read(&self, key: &str) -> InkframeResult<Vec<u8>> {
        self.check_online()?;
        let key = normalize_key(key)?;
        let map = self.objects.read().map_err(|_| Self::poisoned())?;
        map.get(&key)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| InkframeError::not_found(key))
    }

    fn write(&self, key: &str, bytes: &[u8], content_type: &str) -> InkframeResult<()> {
        self.check_online()?;
        let key = normalize_key(key)?;
        if key.is_empty() || key.ends_with('/') {
            return Err(InkframeError::validation("object key must name an object"));
        }
        let mut map = self.objects.write().map_err(|_| Self::poisoned())?;
        map.insert(
            key,
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_owned(),
            },
        );
        Ok(())
    }

    fn list(&self, prefix: &str) -> InkframeResult<Vec<String>> {
        self.check_online()?;
        let prefix = normalize_key(prefix)?;
        let map = self.objects.read().map_err(|_| Self::poisoned())?;
        Ok(map
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn delete(&self, key: &str) -> InkframeResult<()> {
        self.check_online()?;
        let key = normalize_key(key)?;
        let mut map = self.objects.write().map_err(|_| Self::poisoned())?;
        map.remove(&key);
        Ok(())
    }

    fn copy(&self, src: &str, dst: &str) -> InkframeResult<()> {
        self.check_online()?;
        let src = normalize_key(src)?;
        let dst = normalize_key(dst)?;
        let mut map = self.objects.write().map_err(|_| Self::poisoned())?;
        let obj = map
            .get(&src)
            .cloned()
            .ok_or_else(|| InkframeError::not_found(src))?;
        map.insert(dst, obj);
        Ok(())
    }
}
