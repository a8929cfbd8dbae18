//! Vision backend trait and request types.
//!
//! Defines the interface that both remote providers implement, the immutable
//! credential set resolved once at startup, and the factory that builds a
//! backend for a provider identity.

use super::prompt;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::fetch::ImageFetcher;
use crate::types::{ProviderKind, ProviderReply};
use async_trait::async_trait;
use base64::Engine;

/// Base64-encoded image ready to send inline to an LLM API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and an `image/*` media type.
    pub fn from_bytes(bytes: &[u8], media_type: &str) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }
}

/// A request to judge one image against one challenge.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    /// Remote image location (fetched or forwarded depending on the provider)
    pub image_url: String,
    /// System instruction
    pub system: String,
    /// User prompt embedding the challenge description
    pub prompt: String,
}

impl VisionRequest {
    /// Build a verification request for a challenge description.
    pub fn verify_challenge(image_url: &str, challenge_description: &str) -> Self {
        Self {
            image_url: image_url.to_string(),
            system: prompt::SYSTEM_PROMPT.to_string(),
            prompt: prompt::challenge_prompt(challenge_description),
        }
    }
}

/// Trait that both remote providers implement.
///
/// `send` performs exactly one HTTP exchange. Any status other than 200 comes
/// back as `Ok` with the response body so the caller's retry policy can
/// classify it; transport and fetch failures come back as `Err`.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Provider identity.
    fn kind(&self) -> ProviderKind;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Perform one request.
    async fn send(&self, request: &VisionRequest) -> Result<ProviderReply, AnalysisError>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    let resolved = if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else {
        Some(value.to_string())
    };
    resolved.filter(|v| !v.trim().is_empty())
}

/// Provider API keys, resolved once and immutable afterwards.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    anthropic: Option<String>,
    openai: Option<String>,
}

impl Credentials {
    /// Resolve both keys from the provider config (reads the environment once).
    pub fn from_config(config: &Config) -> Self {
        Self {
            anthropic: resolve_env_var(&config.providers.anthropic.api_key),
            openai: resolve_env_var(&config.providers.openai.api_key),
        }
    }

    /// Build from explicit keys. Empty keys count as absent.
    pub fn new(anthropic: Option<&str>, openai: Option<&str>) -> Self {
        let keep = |k: Option<&str>| k.filter(|k| !k.trim().is_empty()).map(String::from);
        Self {
            anthropic: keep(anthropic),
            openai: keep(openai),
        }
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Anthropic => self.anthropic.as_deref(),
            ProviderKind::OpenAi => self.openai.as_deref(),
        }
    }

    /// Providers with a key, in priority order.
    pub fn available(&self) -> Vec<ProviderKind> {
        ProviderKind::PRIORITY
            .into_iter()
            .filter(|kind| self.get(*kind).is_some())
            .collect()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the keys themselves
        f.debug_struct("Credentials")
            .field("anthropic", &self.anthropic.is_some())
            .field("openai", &self.openai.is_some())
            .finish()
    }
}

/// Factory that creates the backend for a provider identity.
pub struct VisionBackendFactory;

impl VisionBackendFactory {
    /// Create a backend for `kind` using `api_key` and the provider's config section.
    pub fn create(kind: ProviderKind, config: &Config, api_key: &str) -> Box<dyn VisionBackend> {
        match kind {
            ProviderKind::Anthropic => Box::new(super::anthropic::AnthropicBackend::new(
                api_key,
                &config.providers.anthropic,
                ImageFetcher::new(&config.fetch),
            )),
            ProviderKind::OpenAi => Box::new(super::openai::OpenAiBackend::new(
                api_key,
                &config.providers.openai,
            )),
        }
    }
}
