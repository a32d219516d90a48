//! Image resolver: download or read, fit inside a square, re-encode as PNG.
//!
//! Uses `ureq` (sync) for remote images. Output dimensions never exceed
//! `size`×`size` and the aspect ratio is preserved.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use connect_core::DataUri;
use image::imageops::FilterType;
use image::ImageFormat;

use crate::error::MediaError;

/// Default bounding square, in pixels.
pub const DEFAULT_IMAGE_SIZE: u32 = 256;

/// Largest remote image body accepted.
const MAX_DOWNLOAD_BYTES: u64 = 32 * 1024 * 1024;

pub struct ImageResolver {
    size: u32,
    user_agent: String,
}

impl ImageResolver {
    pub fn new(size: u32, user_agent: impl Into<String>) -> Self {
        ImageResolver {
            size,
            user_agent: user_agent.into(),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Download `url` and transform it.
    pub fn fetch_remote(&self, url: &str) -> Result<DataUri, MediaError> {
        tracing::info!(url, "downloading image");
        let bytes = self.download(url)?;
        self.transform(url, &bytes)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        let fetch_err = |message: String| MediaError::Fetch {
            url: url.to_owned(),
            message,
        };
        let agent = ureq::Agent::new_with_defaults();
        let response = agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| fetch_err(e.to_string()))?;
        let mut body = response.into_body();
        body.with_config()
            .limit(MAX_DOWNLOAD_BYTES)
            .read_to_vec()
            .map_err(|e| fetch_err(format!("failed to read response body: {}", e)))
    }

    /// Decode `bytes`, fit them inside the bounding square, and encode the
    /// result as a PNG data URI. `reference` is only used in errors.
    pub fn transform(&self, reference: &str, bytes: &[u8]) -> Result<DataUri, MediaError> {
        let decoded = image::load_from_memory(bytes).map_err(|source| MediaError::Decode {
            reference: reference.to_owned(),
            source,
        })?;
        let fitted = decoded.resize(self.size, self.size, FilterType::Lanczos3);

        let mut out = Cursor::new(Vec::new());
        fitted
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|source| MediaError::Encode {
                reference: reference.to_owned(),
                source,
            })?;
        tracing::debug!(
            reference,
            width = fitted.width(),
            height = fitted.height(),
            "resized image"
        );
        Ok(encode_data_uri("image/png", out.get_ref()))
    }
}

/// Base64-encode `bytes` into a `data:` URI.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> DataUri {
    DataUri::from_base64(mime, &BASE64.encode(bytes))
}
