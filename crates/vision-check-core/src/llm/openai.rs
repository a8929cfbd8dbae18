//! OpenAI backend using the Chat Completions API.
//!
//! The image is passed by reference: OpenAI downloads it from the request URL.

use super::provider::{VisionBackend, VisionRequest};
use crate::config::OpenAiConfig;
use crate::error::AnalysisError;
use crate::types::{ProviderKind, ProviderReply};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI backend using Chat Completions API.
pub struct OpenAiBackend {
    api_key: String,
    model: String,
    endpoint: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    image_detail: Option<String>,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: &str, config: &OpenAiConfig) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_millis(config.timeout_ms),
            image_detail: config.image_detail.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn build_body(&self, request: &VisionRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: vec![ChatContent::Text {
                        text: request.system.clone(),
                    }],
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: vec![
                        ChatContent::Text {
                            text: request.prompt.clone(),
                        },
                        ChatContent::ImageUrl {
                            image_url: ImageUrl {
                                url: request.image_url.clone(),
                                detail: self.image_detail.clone(),
                            },
                        },
                    ],
                },
            ],
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Navigate `choices[0].message.content` in a Chat Completions body.
///
/// A missing first choice or a null content is malformed. Empty content is
/// passed on so the reply degrades to neutral.
fn reply_text(body: &str) -> Result<(String, Option<String>), AnalysisError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| AnalysisError::MalformedResponse {
            provider: ProviderKind::OpenAi,
            message: e.to_string(),
        })?;

    let malformed = |message: &str| AnalysisError::MalformedResponse {
        provider: ProviderKind::OpenAi,
        message: message.to_string(),
    };

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| malformed("empty choices array"))?;
    let text = choice
        .message
        .content
        .ok_or_else(|| malformed("choices[0].message.content is null"))?;

    Ok((text.trim().to_string(), parsed.model))
}

#[async_trait]
impl VisionBackend for OpenAiBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: &VisionRequest) -> Result<ProviderReply, AnalysisError> {
        let body = self.build_body(request);

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport {
                provider: ProviderKind::OpenAi,
                message: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| AnalysisError::Transport {
            provider: ProviderKind::OpenAi,
            message: format!("failed to read response body: {e}"),
        })?;

        if status != reqwest::StatusCode::OK {
            return Ok(ProviderReply {
                raw_text: text,
                http_status: status.as_u16(),
                model: None,
            });
        }

        let (raw_text, model) = reply_text(&text)?;
        Ok(ProviderReply {
            raw_text,
            http_status: status.as_u16(),
            model: model.or_else(|| Some(self.model.clone())),
        })
    }
}
