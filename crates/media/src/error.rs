/// All errors that can be returned while resolving or caching media.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The remote resource could not be downloaded.
    #[error("failed to download {url}: {message}")]
    Fetch { url: String, message: String },

    /// The downloaded or local bytes are not a decodable image.
    #[error("failed to decode image from {reference}: {source}")]
    Decode {
        reference: String,
        #[source]
        source: image::ImageError,
    },

    /// Re-encoding the resized image failed.
    #[error("failed to encode image from {reference}: {source}")]
    Encode {
        reference: String,
        #[source]
        source: image::ImageError,
    },

    /// A local media file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg, yt-dlp) could not be run or failed.
    #[error("{tool} failed for {reference}: {message}")]
    Tool {
        tool: String,
        reference: String,
        message: String,
    },

    /// The content cache could not be read or written.
    #[error("content cache error: {0}")]
    Cache(String),
}
