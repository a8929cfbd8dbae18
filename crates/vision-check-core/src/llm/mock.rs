//! Test doubles for backends and sleeping.

use super::provider::{VisionBackend, VisionRequest};
use super::retry::Sleeper;
use crate::error::AnalysisError;
use crate::types::{ProviderKind, ProviderReply};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type ResponseFn = Box<dyn Fn(u32) -> Result<ProviderReply, AnalysisError> + Send + Sync>;

/// A configurable mock backend.
///
/// Each call to `send()` invokes the response factory with the current call
/// index, so tests can return different results per attempt.
pub(crate) struct MockBackend {
    kind: ProviderKind,
    response_fn: ResponseFn,
    /// Tracks how many times `send` was called (shared for post-hoc assertions).
    pub(crate) call_count: Arc<AtomicU32>,
    /// Every request seen, for prompt assertions.
    pub(crate) requests: Arc<Mutex<Vec<VisionRequest>>>,
}

impl MockBackend {
    pub(crate) fn new(
        response_fn: impl Fn(u32) -> Result<ProviderReply, AnalysisError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: ProviderKind::Anthropic,
            response_fn: Box::new(response_fn),
            call_count: Arc::new(AtomicU32::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_kind(mut self, kind: ProviderKind) -> Self {
        self.kind = kind;
        self
    }

    /// Always answers 200 with `text`.
    pub(crate) fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| {
            Ok(ProviderReply {
                raw_text: text.clone(),
                http_status: 200,
                model: Some("mock-v1".to_string()),
            })
        })
    }

    /// Always answers with a non-200 status.
    pub(crate) fn status(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::new(move |_| {
            Ok(ProviderReply {
                raw_text: body.clone(),
                http_status: status,
                model: None,
            })
        })
    }
}

#[async_trait]
impl VisionBackend for MockBackend {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        "mock-v1"
    }

    async fn send(&self, request: &VisionRequest) -> Result<ProviderReply, AnalysisError> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        (self.response_fn)(idx)
    }
}

/// Records requested delays instead of waiting.
#[derive(Default)]
pub(crate) struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub(crate) fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}
