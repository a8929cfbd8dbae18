//! Remote vision-model integration.
//!
//! Provides a backend abstraction over the two supported providers (Anthropic,
//! OpenAI), the shared prompt, the retry policy, and the client that ties a
//! backend to the policy and the reply extractor.

pub(crate) mod anthropic;
pub(crate) mod client;
#[cfg(test)]
pub(crate) mod mock;
pub(crate) mod openai;
pub(crate) mod prompt;
pub(crate) mod provider;
pub(crate) mod retry;

pub use client::{ProviderClient, ProviderFailure};
pub use provider::{Credentials, ImageInput, VisionBackend, VisionBackendFactory, VisionRequest};
pub use retry::{RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
