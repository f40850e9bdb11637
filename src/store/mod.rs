//! Key/value blob storage the pipeline persists into.
//!
//! The real deployment talks to a cloud bucket; the crate ships an on-disk implementation and an
//! in-memory one. Both report a missing object as [`InkframeError::NotFound`] and a broken backend
//! as [`InkframeError::StoreUnavailable`].

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::MemoryStore;

use crate::foundation::error::{InkframeError, InkframeResult};

/// Blob store contract consumed by the pipeline.
pub trait ObjectStore: Send + Sync {
    fn exists(&self, key: &str) -> InkframeResult<bool>;

    /// Read a whole object. Missing keys yield [`InkframeError::NotFound`].
    fn read(&self, key: &str) -> InkframeResult<Vec<u8>>;

    fn write(&self, key: &str, bytes: &[u8], content_type: &str) -> InkframeResult<()>;

    /// Keys starting with `prefix`, in lexicographic order.
    fn list(&self, prefix: &str) -> InkframeResult<Vec<String>>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> InkframeResult<()>;

    fn copy(&self, src: &str, dst: &str) -> InkframeResult<()>;
}

/// Read `key`, mapping "not found" to `None`.
pub fn read_optional(store: &dyn ObjectStore, key: &str) -> InkframeResult<Option<Vec<u8>>> {
    match store.read(key) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Normalize and validate an object key.
///
/// The normalized result uses `/` separators, removes empty and `.` segments, and rejects parent
/// traversals (`..`). A trailing `/` is preserved so prefixes stay prefixes.
pub fn normalize_key(key: &str) -> InkframeResult<String> {
    let s = key.replace('\\', "/");
    let trailing = s.ends_with('/');

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(InkframeError::validation("object keys must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Ok(String::new());
    }

    let mut joined = out.join("/");
    if trailing {
        joined.push('/');
    }
    Ok(joined)
}

#[cfg(test)]
#[path = "../../tests/unit/store/mod.rs"]
mod tests;
