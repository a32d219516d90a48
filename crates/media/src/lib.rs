//! connect-media: media resolvers and content cache for connect-maker.
//!
//! [`CachingResolver`] implements the core's
//! [`MediaResolver`](connect_core::MediaResolver) seam: images are fetched or
//! read, fitted inside a square, and embedded as PNG data URIs; audio clips
//! are trimmed by `ffmpeg` and embedded as MP3. Every artifact goes through
//! a [`ContentCache`] so unchanged references cost nothing on later runs.

pub mod audio;
pub mod cache;
pub mod error;
pub mod images;
pub mod resolver;

pub use audio::AudioResolver;
pub use cache::{content_digest, CacheKey, ContentCache, DiskCache, MemoryCache};
pub use error::MediaError;
pub use images::{ImageResolver, DEFAULT_IMAGE_SIZE};
pub use resolver::CachingResolver;
