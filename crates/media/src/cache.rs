//! Content-addressable artifact cache.
//!
//! Artifacts are keyed by a SHA-256 digest of the normalized request
//! (kind, reference, and transform parameters). [`read_through`] is the only
//! way resolvers populate the cache: it serializes work per key, so two
//! resolutions of the same request never race to write different bytes.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use connect_core::DataUri;
use sha2::{Digest, Sha256};

use crate::error::MediaError;

const ENTRY_EXTENSION: &str = "datauri";

// ──────────────────────────────────────────────
// CacheKey
// ──────────────────────────────────────────────

/// Hex SHA-256 of a normalized resolution request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    fn digest(parts: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        CacheKey(format!("{:x}", hasher.finalize()))
    }

    /// Key for an image fitted inside a `size`×`size` square.
    pub fn image(reference: &str, size: u32) -> Self {
        CacheKey::digest(&["image", reference, &size.to_string()])
    }

    /// Key for an audio clip of `[start, start + duration)` seconds.
    pub fn audio(reference: &str, start: u32, duration: u32) -> Self {
        CacheKey::digest(&[
            "audio",
            reference,
            &start.to_string(),
            &duration.to_string(),
        ])
    }

    /// Key for a local image whose current bytes hash to `content`.
    pub fn local_image(path: &str, content: &str, size: u32) -> Self {
        CacheKey::digest(&["image", path, content, &size.to_string()])
    }

    /// Key for a clip of a local audio file whose bytes hash to `content`.
    pub fn local_audio(path: &str, content: &str, start: u32, duration: u32) -> Self {
        CacheKey::digest(&[
            "audio",
            path,
            content,
            &start.to_string(),
            &duration.to_string(),
        ])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hex SHA-256 of a file's contents.
pub fn content_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ──────────────────────────────────────────────
// ContentCache
// ──────────────────────────────────────────────

/// Store of previously produced artifacts.
pub trait ContentCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<DataUri>, MediaError>;

    fn put(&self, key: &CacheKey, artifact: &DataUri) -> Result<(), MediaError>;
}

/// Durable cache: one `<key>.datauri` file per artifact.
///
/// Entries are written to a temporary file in the same directory and
/// renamed into place, so a crashed run never leaves a truncated entry.
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DiskCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir
            .join(format!("{}.{}", key.as_str(), ENTRY_EXTENSION))
    }

    /// Remove every cached artifact. A missing directory is not an error.
    pub fn clear(&self) -> Result<(), MediaError> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Cache(format!(
                "cannot remove {}: {}",
                self.dir.display(),
                e
            ))),
        }
    }
}

impl ContentCache for DiskCache {
    fn get(&self, key: &CacheKey) -> Result<Option<DataUri>, MediaError> {
        let path = self.entry_path(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MediaError::Cache(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        match DataUri::parse(raw) {
            Some(uri) => Ok(Some(uri)),
            None => {
                tracing::warn!(path = %path.display(), "ignoring malformed cache entry");
                Ok(None)
            }
        }
    }

    fn put(&self, key: &CacheKey, artifact: &DataUri) -> Result<(), MediaError> {
        let cache_err = |e: std::io::Error| {
            MediaError::Cache(format!("cannot write to {}: {}", self.dir.display(), e))
        };
        std::fs::create_dir_all(&self.dir).map_err(cache_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(cache_err)?;
        tmp.write_all(artifact.as_str().as_bytes())
            .map_err(cache_err)?;
        tmp.persist(self.entry_path(key))
            .map_err(|e| cache_err(e.error))?;
        Ok(())
    }
}

/// Process-local cache, for tests and one-off runs.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, DataUri>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<DataUri>, MediaError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn put(&self, key: &CacheKey, artifact: &DataUri) -> Result<(), MediaError> {
        lock(&self.entries).insert(key.clone(), artifact.clone());
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Per-key read-through
// ──────────────────────────────────────────────

/// One mutex per cache key.
#[derive(Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        lock(&self.locks).entry(key.clone()).or_default().clone()
    }

    /// Give back a lock taken with `lock_for`, dropping the entry once no
    /// one else holds it.
    fn release(&self, key: &CacheKey, key_lock: Arc<Mutex<()>>) {
        let mut locks = lock(&self.locks);
        drop(key_lock);
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }
    }
}

/// Whether [`read_through`] served the artifact from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Hit,
    Miss,
}

/// Return the cached artifact for `key`, or run `produce` and store its
/// result. The key stays locked for the whole get-produce-put sequence.
pub fn read_through<C, F>(
    cache: &C,
    locks: &KeyLocks,
    key: &CacheKey,
    produce: F,
) -> Result<(DataUri, Lookup), MediaError>
where
    C: ContentCache + ?Sized,
    F: FnOnce() -> Result<DataUri, MediaError>,
{
    let key_lock = locks.lock_for(key);
    let result = {
        let _guard = lock(&key_lock);
        lookup_or_produce(cache, key, produce)
    };
    locks.release(key, key_lock);
    result
}

fn lookup_or_produce<C, F>(
    cache: &C,
    key: &CacheKey,
    produce: F,
) -> Result<(DataUri, Lookup), MediaError>
where
    C: ContentCache + ?Sized,
    F: FnOnce() -> Result<DataUri, MediaError>,
{
    if let Some(hit) = cache.get(key)? {
        return Ok((hit, Lookup::Hit));
    }
    let artifact = produce()?;
    cache.put(key, &artifact)?;
    Ok((artifact, Lookup::Miss))
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
