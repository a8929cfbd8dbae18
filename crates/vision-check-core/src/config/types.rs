//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Image download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Download timeout in milliseconds
    pub timeout_ms: u64,

    /// Maximum accepted image size in bytes
    pub max_image_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Retry policy applied to every provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per provider, including the first
    pub max_attempts: u32,

    /// First backoff delay after a retryable status, in milliseconds
    pub base_delay_ms: u64,

    /// Factor applied to the backoff delay after each retryable status
    pub backoff_multiplier: f64,

    /// Fixed delay after a transport failure, in milliseconds
    pub transport_delay_ms: u64,

    /// Upper bound for any single delay, in milliseconds
    pub max_delay_ms: u64,

    /// HTTP statuses retried with exponential backoff
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            backoff_multiplier: 2.0,
            transport_delay_ms: 1000,
            max_delay_ms: 30_000,
            retryable_statuses: vec![429],
        }
    }
}

/// Remote provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Anthropic configuration
    pub anthropic: AnthropicConfig,

    /// OpenAI configuration
    pub openai: OpenAiConfig,
}

/// Anthropic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Messages API endpoint
    pub endpoint: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: "${ANTHROPIC_API_KEY}".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            max_tokens: 1000,
            temperature: 0.1,
            timeout_ms: 45_000,
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Chat Completions endpoint
    pub endpoint: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Image detail hint ("low", "high" or "auto"); omitted when unset
    pub image_detail: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            max_tokens: 1000,
            temperature: 0.1,
            timeout_ms: 45_000,
            image_detail: None,
        }
    }
}

/// Offline heuristic settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Challenge-domain keywords, matched case-insensitively as substrings
    pub keywords: Vec<String>,

    /// Confidence with zero keyword matches
    pub base_confidence: f64,

    /// Confidence added per matched keyword
    pub per_keyword: f64,

    /// Upper bound for the keyword-driven part
    pub cap: f64,

    /// Width of the random jitter added on top, in [0, jitter)
    pub jitter: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            keywords: ["tampinha", "garrafa", "pet", "reciclar", "lixo", "coletar"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            base_confidence: 0.3,
            per_keyword: 0.15,
            cap: 0.9,
            jitter: 0.1,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print the JSON result
    pub pretty: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
