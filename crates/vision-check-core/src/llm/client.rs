//! Provider client: one backend plus the retry loop and reply interpretation.

use super::provider::{VisionBackend, VisionRequest};
use super::retry::{RetryDecision, RetryPolicy, Sleeper};
use crate::error::AnalysisError;
use crate::extract;
use crate::types::{round_to, AnalysisResult, ProviderKind, ProviderReply};
use std::sync::Arc;
use thiserror::Error;

/// Confidence assigned when a reply cannot be decomposed.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Maximum characters of raw reply kept in an unstructured result.
pub const EXCERPT_CHARS: usize = 300;

/// Warning attached to unstructured results.
pub const UNSTRUCTURED_WARNING: &str =
    "Provider reply was not structured JSON; neutral confidence assigned";

/// A provider call that ended without a usable reply.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct ProviderFailure {
    pub provider: ProviderKind,
    /// HTTP attempts made before giving up (0 if none reached the provider)
    pub attempts: u32,
    pub error: AnalysisError,
}

impl ProviderFailure {
    pub fn into_result(self) -> AnalysisResult {
        AnalysisResult::failure(self.error.to_string(), self.provider.label())
            .with_attempts(self.attempts)
    }
}

/// Calls one provider with bounded retries.
pub struct ProviderClient {
    backend: Box<dyn VisionBackend>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ProviderClient {
    pub fn new(backend: Box<dyn VisionBackend>, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            backend,
            policy,
            sleeper,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.backend.kind()
    }

    /// Judge `image_url` against `challenge_description`.
    ///
    /// Retries rate limits with exponential backoff and transport failures
    /// with a fixed delay; every other failure ends the sequence immediately.
    pub async fn call(
        &self,
        image_url: &str,
        challenge_description: &str,
    ) -> Result<AnalysisResult, ProviderFailure> {
        let kind = self.kind();
        let request = VisionRequest::verify_challenge(image_url, challenge_description);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            tracing::debug!(
                "{kind} attempt {attempt}/{} (model {})",
                self.policy.max_attempts,
                self.backend.model()
            );

            let error = match self.backend.send(&request).await {
                Ok(reply) if reply.http_status == 200 => {
                    return Ok(interpret_reply(kind, reply).with_attempts(attempt));
                }
                Ok(reply) => self.classify_status(kind, reply),
                Err(e) => e,
            };

            match self.policy.decide(attempt, &error) {
                RetryDecision::Retry(delay) => {
                    tracing::warn!(
                        "{kind} attempt {attempt}/{} failed: {error}. Retrying in {delay:?}",
                        self.policy.max_attempts
                    );
                    self.sleeper.sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    tracing::warn!("{kind} failed after {attempt} attempt(s): {error}");
                    return Err(ProviderFailure {
                        provider: kind,
                        attempts: attempt,
                        error,
                    });
                }
            }
        }
    }

    fn classify_status(&self, kind: ProviderKind, reply: ProviderReply) -> AnalysisError {
        let body = truncate_chars(reply.raw_text.trim(), EXCERPT_CHARS);
        if self.policy.is_retryable_status(reply.http_status) {
            AnalysisError::RateLimited {
                provider: kind,
                status: reply.http_status,
                body,
            }
        } else {
            AnalysisError::Provider {
                provider: kind,
                status: reply.http_status,
                body,
            }
        }
    }
}

/// Turn a successful reply into a result, degrading to neutral confidence
/// when it is not structured.
pub(crate) fn interpret_reply(kind: ProviderKind, reply: ProviderReply) -> AnalysisResult {
    let result = match extract::extract(&reply.raw_text) {
        Some(structured) => AnalysisResult::success(
            round_to(structured.confidence.clamp(0.0, 1.0), 3),
            structured.analysis.trim(),
            kind.label(),
        ),
        None => {
            tracing::warn!("{kind} reply was not structured, using neutral confidence");
            AnalysisResult::success(
                NEUTRAL_CONFIDENCE,
                truncate_chars(reply.raw_text.trim(), EXCERPT_CHARS),
                kind.label(),
            )
            .with_warning(UNSTRUCTURED_WARNING)
        }
    };
    result.with_model(reply.model)
}

/// Keep at most `max` characters, marking truncation with "...".
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
