//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.timeout_ms must be > 0".into(),
            ));
        }
        if self.fetch.max_image_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.max_image_bytes must be > 0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be > 0".into(),
            ));
        }
        let multiplier = self.retry.backoff_multiplier;
        if multiplier.is_nan() || multiplier < 1.0 {
            return Err(ConfigError::ValidationError(
                "retry.backoff_multiplier must be >= 1.0".into(),
            ));
        }
        if self.providers.anthropic.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "providers.anthropic.timeout_ms must be > 0".into(),
            ));
        }
        if self.providers.openai.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "providers.openai.timeout_ms must be > 0".into(),
            ));
        }
        for (name, temperature) in [
            ("anthropic", self.providers.anthropic.temperature),
            ("openai", self.providers.openai.temperature),
        ] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{name}.temperature must be between 0.0 and 2.0"
                )));
            }
        }
        let sim = &self.simulation;
        for (name, value) in [
            ("base_confidence", sim.base_confidence),
            ("per_keyword", sim.per_keyword),
            ("cap", sim.cap),
            ("jitter", sim.jitter),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "simulation.{name} must be between 0.0 and 1.0"
                )));
            }
        }
        Ok(())
    }
}
