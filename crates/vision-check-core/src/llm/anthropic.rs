//! Anthropic backend using the Messages API.
//!
//! Downloads the image on every attempt and sends it as a base64 content block.

use super::provider::{VisionBackend, VisionRequest};
use crate::config::AnthropicConfig;
use crate::error::AnalysisError;
use crate::fetch::ImageFetcher;
use crate::types::{ProviderKind, ProviderReply};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Anthropic backend using the Messages API.
pub struct AnthropicBackend {
    api_key: String,
    model: String,
    endpoint: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    fetcher: ImageFetcher,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(api_key: &str, config: &AnthropicConfig, fetcher: ImageFetcher) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_millis(config.timeout_ms),
            fetcher,
            client: reqwest::Client::new(),
        }
    }

    fn build_body(&self, request: &VisionRequest, media_type: &str, data: String) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            system: Some(request.system.clone()),
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64".to_string(),
                            media_type: media_type.to_string(),
                            data,
                        },
                    },
                    ContentBlock::Text {
                        text: request.prompt.clone(),
                    },
                ],
            }],
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "image")]
    Image { source: ImageSource },
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
    model: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    text: Option<String>,
}

/// Concatenate the text blocks of a Messages API response body.
///
/// An envelope without any text block is malformed. Text blocks that are
/// present but empty are passed on so the reply degrades to neutral.
fn reply_text(body: &str) -> Result<(String, Option<String>), AnalysisError> {
    let parsed: MessagesResponse =
        serde_json::from_str(body).map_err(|e| AnalysisError::MalformedResponse {
            provider: ProviderKind::Anthropic,
            message: e.to_string(),
        })?;

    let blocks: Vec<String> = parsed.content.into_iter().filter_map(|c| c.text).collect();
    if blocks.is_empty() {
        return Err(AnalysisError::MalformedResponse {
            provider: ProviderKind::Anthropic,
            message: "response has no text content blocks".to_string(),
        });
    }

    Ok((blocks.concat().trim().to_string(), parsed.model))
}

#[async_trait]
impl VisionBackend for AnthropicBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: &VisionRequest) -> Result<ProviderReply, AnalysisError> {
        let image = self.fetcher.fetch(&request.image_url).await?.to_image_input();
        let body = self.build_body(request, &image.media_type, image.data);

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport {
                provider: ProviderKind::Anthropic,
                message: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| AnalysisError::Transport {
            provider: ProviderKind::Anthropic,
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
