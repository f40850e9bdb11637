use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{InkframeError, InkframeResult};
use crate::store::{ObjectStore, normalize_key};

/// Object store backed by a directory tree. Keys map to relative paths under `root`.
///
/// Content types are accepted for interface parity and not persisted.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open an existing directory. A missing root is a configuration error, not an empty store.
    pub fn open(root: impl Into<PathBuf>) -> InkframeResult<Self> {
        let store = Self { root: root.into() };
        store.check_root()?;
        Ok(store)
    }

    /// Create the root directory if needed, then open it.
    pub fn create(root: impl Into<PathBuf>) -> InkframeResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create store root '{}'", root.display()))?;
        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn check_root(&self) -> InkframeResult<()> {
        match std::fs::metadata(&self.root) {
            Ok(m) if m.is_dir() => Ok(()),
            Ok(_) => Err(InkframeError::store_unavailable(format!(
                "store root '{}' is not a directory",
                self.root.display()
            ))),
            Err(e) => Err(InkframeError::store_unavailable(format!(
                "store root '{}': {e}",
                self.root.display()
            ))),
        }
    }

    fn path_for(&self, key: &str) -> InkframeResult<(String, PathBuf)> {
        let key = normalize_key(key)?;
        if key.is_empty() || key.ends_with('/') {
            return Err(InkframeError::validation("object key must name an object"));
        }
        let path = self.root.join(&key);
        Ok((key, path))
    }

    fn io_error(&self, key: &str, err: std::io::Error) -> InkframeError {
        if err.kind() == ErrorKind::NotFound {
            // The root vanishing under us is an outage, a missing leaf is just a miss.
            if self.check_root().is_err() {
                return InkframeError::store_unavailable(format!(
                    "store root '{}' disappeared",
                    self.root.display()
                ));
            }
            return InkframeError::not_found(key);
        }
        InkframeError::Other(anyhow::Error::new(err).context(format!("store key '{key}'")))
    }

    fn collect_keys(&self, dir: &Path, rel: &str, out: &mut Vec<String>) -> InkframeResult<()> {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(self.io_error(rel, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| self.io_error(rel, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(".tmp-") {
                continue;
            }
            let child_rel = if rel.is_empty() {
                name
            } else {
                format!("{rel}/{name}")
            };
            let file_type = entry.file_type().map_err(|e| self.io_error(&child_rel, e))?;
            if file_type.is_dir() {
                self.collect_keys(&entry.path(), &child_rel, out)?;
            } else if file_type.is_file() {
                out.push(child_rel);
            }
        }
        Ok(())
    }
}

impl ObjectStore for DirStore {
    fn exists(&self, key: &str) -> InkframeResult<bool> {
        self.check_root()?;
        let (_, path) = self.path_for(key)?;
        Ok(path.is_file())
    }

    fn read(&self, key: &str) -> InkframeResult<Vec<u8>> {
        let (key, path) = self.path_for(key)?;
        std::fs::read(&path).map_err(|e| self.io_error(&key, e))
    }

    fn write(&self, key: &str, bytes: &[u8], _content_type: &str) -> InkframeResult<()> {
        self.check_root()?;
        let (key, path) = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(&key, e))?;
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".tmp-{}-{file_name}", std::process::id()));
        std::fs::write(&tmp, bytes).map_err(|e| self.io_error(&key, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| self.io_error(&key, e))?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> InkframeResult<Vec<String>> {
        self.check_root()?;
        let prefix = normalize_key(prefix)?;
        // Walk only the deepest directory the prefix fully names.
        let (dir_rel, _) = match prefix.rfind('/') {
            Some(i) => prefix.split_at(i),
            None => ("", prefix.as_str()),
        };
        let mut keys = Vec::new();
        self.collect_keys(&self.root.join(dir_rel), dir_rel, &mut keys)?;
        keys.retain(|k| k.starts_with(&prefix));
        keys.sort();
        Ok(keys)
    }

    fn delete(&self, key: &str) -> InkframeResult<()> {
        self.check_root()?;
        let (key, path) = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(&key, e)),
        }
    }

    fn copy(&self, src: &str, dst: &str) -> InkframeResult<()> {
        let bytes = self.read(src)?;
        self.write(dst, &bytes, "application/octet-stream")
    }
}
