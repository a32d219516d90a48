//! Cache-backed [`MediaResolver`] used by the compiler.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use connect_core::{
    AudioRequest, DataUri, ImageRequest, MediaResolver, MediaSource, ResolveError, SourceProvider,
};

use crate::audio::AudioResolver;
use crate::cache::{content_digest, read_through, CacheKey, ContentCache, KeyLocks, Lookup};
use crate::error::MediaError;
use crate::images::ImageResolver;

/// Resolves image and audio requests through a [`ContentCache`].
///
/// Local references are resolved against `base_dir` (the script's
/// directory) and read through the [`SourceProvider`]. Their cache keys
/// carry the normalized path plus a digest of the file's current bytes,
/// so editing a file in place invalidates its cached artifacts.
pub struct CachingResolver<C: ContentCache> {
    cache: C,
    locks: KeyLocks,
    provider: Box<dyn SourceProvider>,
    base_dir: PathBuf,
    images: ImageResolver,
    audio: AudioResolver,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<C: ContentCache> CachingResolver<C> {
    pub fn new(
        cache: C,
        provider: Box<dyn SourceProvider>,
        base_dir: impl Into<PathBuf>,
        images: ImageResolver,
        audio: AudioResolver,
    ) -> Self {
        CachingResolver {
            cache,
            locks: KeyLocks::new(),
            provider,
            base_dir: base_dir.into(),
            images,
            audio,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Resolutions served from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Resolutions that had to fetch or transform.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    fn local_path(&self, reference: &str) -> PathBuf {
        self.provider.resolve(&self.base_dir, reference)
    }

    fn normalized_reference(&self, source: &MediaSource) -> String {
        match source {
            MediaSource::Remote(url) => url.clone(),
            MediaSource::Local(path) => self.local_path(path).display().to_string(),
        }
    }

    fn cached<F>(&self, kind: &str, reference: &str, key: CacheKey, produce: F) -> Result<DataUri, MediaError>
    where
        F: FnOnce() -> Result<DataUri, MediaError>,
    {
        let (artifact, lookup) = read_through(&self.cache, &self.locks, &key, produce)?;
        match lookup {
            Lookup::Hit => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::info!(kind, reference, %key, "using cached copy");
            }
            Lookup::Miss => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(kind, reference, %key, "cached");
            }
        }
        Ok(artifact)
    }

    fn read_local(&self, path: &Path) -> Result<Vec<u8>, MediaError> {
        self.provider
            .read_bytes(path)
            .map_err(|source| MediaError::Io {
                path: path.display().to_string(),
                source,
            })
    }
}

impl<C: ContentCache> MediaResolver for CachingResolver<C> {
    fn resolve_image(&self, request: &ImageRequest) -> Result<DataUri, ResolveError> {
        let reference = self.normalized_reference(&request.source);
        let size = self.images.size();
        let artifact = match &request.source {
            MediaSource::Remote(url) => {
                let key = CacheKey::image(&reference, size);
                self.cached("image", &reference, key, || self.images.fetch_remote(url))?
            }
            MediaSource::Local(_) => {
                let bytes = self.read_local(Path::new(&reference))?;
                let key = CacheKey::local_image(&reference, &content_digest(&bytes), size);
                self.cached("image", &reference, key, || {
                    self.images.transform(&reference, &bytes)
                })?
            }
        };
        Ok(artifact)
    }

    fn resolve_audio(&self, request: &AudioRequest) -> Result<DataUri, ResolveError> {
        let reference = self.normalized_reference(&request.source);
        let (start, duration) = (request.start, request.duration);
        let artifact = match &request.source {
            MediaSource::Remote(url) => {
                let key = CacheKey::audio(&reference, start, duration);
                self.cached("audio", &reference, key, || {
                    self.audio.fetch_remote(url, start, duration)
                })?
            }
            MediaSource::Local(_) => {
                let path = Path::new(&reference);
                let digest = content_digest(&self.read_local(path)?);
                let key = CacheKey::local_audio(&reference, &digest, start, duration);
                self.cached("audio", &reference, key, || {
                    self.audio.clip_local(path, start, duration)
                })?
            }
        };
        Ok(artifact)
    }
}
