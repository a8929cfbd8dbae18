//! Remote image download and validation.
//!
//! The fetcher performs one GET per call and never retries; retries belong to
//! the provider client, which re-fetches on every attempt.

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::llm::provider::ImageInput;
use futures_util::StreamExt;
use std::time::Duration;

/// Image bytes downloaded from a URL and checked against the limits.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    /// Normalized media type, always starting with `image/`
    pub content_type: String,
    pub size: u64,
}

impl FetchedImage {
    /// Encode for inline transport to a provider.
    pub fn to_image_input(&self) -> ImageInput {
        ImageInput::from_bytes(&self.bytes, &self.content_type)
    }
}

/// Downloads images over http(s) with a timeout and a size cap.
pub struct ImageFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: u64,
}

impl ImageFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(config.timeout_ms),
            max_bytes: config.max_image_bytes,
        }
    }

    /// Download `url` and validate its content type and size.
    pub async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme {
                scheme: parsed.scheme().to_string(),
            });
        }

        let resp = self
            .client
            .get(parsed)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let header = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let content_type = check_content_type(header)?;

        // Reject early on the declared length, then enforce on the actual stream
        if let Some(declared) = resp.content_length() {
            check_size(declared, self.max_bytes)?;
        }

        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::Request(e.to_string()))?;
            bytes.extend_from_slice(&chunk);
            check_size(bytes.len() as u64, self.max_bytes)?;
        }

        let size = bytes.len() as u64;
        tracing::debug!("Fetched {size} bytes of {content_type} from {url}");

        Ok(FetchedImage {
            bytes,
            content_type,
            size,
        })
    }
}

/// Strip parameters and lower-case a `Content-Type` header, requiring `image/*`.
pub(crate) fn check_content_type(header: &str) -> Result<String, FetchError> {
    let media_type = header
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if media_type.starts_with("image/") && media_type.len() > "image/".len() {
        Ok(media_type)
    } else {
        Err(FetchError::NotAnImage {
            content_type: if media_type.is_empty() {
                "missing".to_string()
            } else {
                media_type
            },
        })
    }
}

pub(crate) fn check_size(size: u64, max: u64) -> Result<(), FetchError> {
    if size > max {
        Err(FetchError::TooLarge { size, max })
    } else {
        Ok(())
    }
}
