//! Core data types for vision-check.
//!
//! These types describe a single analysis: the request coming in, the
//! provider identities it may be routed to, and the result handed back to the
//! caller as JSON.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum number of characters a challenge description must have after trimming.
pub const MIN_DESCRIPTION_CHARS: usize = 5;

/// Label used for results produced by the offline heuristic.
pub const SIMULATION_LABEL: &str = "Simulation";

/// Remote vision-language-model providers, in automatic priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Messages API (inline base64 image)
    Anthropic,
    /// OpenAI Chat Completions API (remote image URL)
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    /// Priority order used in `auto` mode.
    pub const PRIORITY: [ProviderKind; 2] = [ProviderKind::Anthropic, ProviderKind::OpenAi];

    /// Human-facing label reported in the `provider` field of a result.
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "Claude (Anthropic)",
            ProviderKind::OpenAi => "GPT-4 Vision (OpenAI)",
        }
    }

    /// Environment variable the default config reads the API key from.
    pub fn api_key_env(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Anthropic => write!(f, "Anthropic"),
            ProviderKind::OpenAi => write!(f, "OpenAI"),
        }
    }
}

/// Which provider(s) the caller wants to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderPreference {
    /// Try every provider with a credential, then fall back to the heuristic
    #[default]
    Auto,
    /// Use only this provider; its failure is returned as-is
    Only(ProviderKind),
}

/// A single analysis request. Built once and never mutated.
///
/// `new` trims both strings, so what is validated is what gets sent.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image_url: String,
    pub challenge_description: String,
    pub provider_preference: ProviderPreference,
}

impl AnalysisRequest {
    pub fn new(
        image_url: impl Into<String>,
        challenge_description: impl Into<String>,
        provider_preference: ProviderPreference,
    ) -> Self {
        Self {
            image_url: image_url.into().trim().to_string(),
            challenge_description: challenge_description.into().trim().to_string(),
            provider_preference,
        }
    }

    /// Check the request shape before any network call is made.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let url = self.image_url.trim();
        if url.is_empty() {
            return Err(AnalysisError::Validation("image_url is required".into()));
        }
        if !has_http_scheme(url) {
            return Err(AnalysisError::Validation(format!(
                "image_url must use http or https: {url}"
            )));
        }

        let chars = self.challenge_description.trim().chars().count();
        if chars < MIN_DESCRIPTION_CHARS {
            return Err(AnalysisError::Validation(format!(
                "challenge_description must have at least {MIN_DESCRIPTION_CHARS} characters (got {chars})"
            )));
        }
        Ok(())
    }
}

/// Case-insensitive check for an `http://` or `https://` prefix with a non-empty rest.
pub(crate) fn has_http_scheme(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|prefix| lower.starts_with(prefix) && lower.len() > prefix.len())
}

/// A reply decomposed into the two fields the prompt asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredResult {
    pub confidence: f64,
    pub analysis: String,
}

/// Raw reply from one provider HTTP call.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    /// Reply text (model output on 200, response body otherwise)
    pub raw_text: String,
    pub http_status: u16,
    /// Model identifier reported by the provider, if any
    pub model: Option<String>,
}

/// The single externally visible artifact of an analysis.
///
/// `confidence` and `analysis` are present exactly when `success` is true;
/// `error` is present exactly when it is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,

    /// Label of the source that produced this result
    pub provider: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    /// Model that produced the reply (absent for simulation and failures)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Provider HTTP attempts used (absent for simulation and validation failures)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

impl AnalysisResult {
    /// Successful result. Confidence is clamped to [0, 1].
    pub fn success(confidence: f64, analysis: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            success: true,
            confidence: Some(clamp_unit(confidence)),
            analysis: Some(analysis.into()),
            provider: provider.into(),
            error: None,
            warning: None,
            model: None,
            attempts: None,
        }
    }

    /// Failed result carrying an explanatory message.
    pub fn failure(error: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            success: false,
            confidence: None,
            analysis: None,
            provider: provider.into(),
            error: Some(error.into()),
            warning: None,
            model: None,
            attempts: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }
}

/// Clamp to [0, 1]; non-finite values collapse to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Round to a fixed number of decimal places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
