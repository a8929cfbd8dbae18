//! Error types for vision-check.
//!
//! Errors are organized by stage so that every failure carries enough context
//! (provider, HTTP status, URL) to end up as a readable `error` string in the
//! final result.

use crate::types::ProviderKind;
use thiserror::Error;

/// Top-level error type for vision-check operations.
#[derive(Error, Debug)]
pub enum VisionError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Analysis errors
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Failures while downloading and validating the image under analysis.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Unsupported URL scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { scheme: String },

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("Image download failed: {0}")]
    Request(String),

    #[error("Image download returned HTTP {status}")]
    Status { status: u16 },

    #[error("URL does not point to an image (content-type: {content_type})")]
    NotAnImage { content_type: String },

    #[error("Image too large: {size} bytes > {max} bytes")]
    TooLarge { size: u64, max: u64 },
}

/// Errors raised while analyzing a request, organized by stage.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Malformed request (bad URL scheme, description too short)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Image download or validation failed
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// Network or timeout failure while calling a provider
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: ProviderKind,
        message: String,
    },

    /// Provider answered with a retryable status (HTTP 429 by default)
    #[error("{provider} rate limited (HTTP {status}): {body}")]
    RateLimited {
        provider: ProviderKind,
        status: u16,
        body: String,
    },

    /// Provider answered with a non-retryable, non-200 status
    #[error("{provider} HTTP {status}: {body}")]
    Provider {
        provider: ProviderKind,
        status: u16,
        body: String,
    },

    /// A 200 response whose envelope could not be navigated
    #[error("Failed to parse {provider} response: {message}")]
    MalformedResponse {
        provider: ProviderKind,
        message: String,
    },

    /// The provider was requested explicitly but has no API key
    #[error("{provider} API key not set. Set {} env var.", .provider.api_key_env())]
    MissingCredential { provider: ProviderKind },
}

impl AnalysisError {
    /// Whether a provider attempt that failed with this error may be repeated
    /// after the fixed transport delay.
    ///
    /// Rate limiting is handled separately with exponential backoff.
    pub fn is_transport_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Fetch(_))
    }
}

/// Convenience type alias for vision-check results.
pub type Result<T> = std::result::Result<T, VisionError>;
