// src/llm/anthropic.rs
// Thin Messages API client for the conversational driver. Only the
// non-streaming text path is needed here.

use std::{env, time::Duration};

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;

pub struct AnthropicClient {
    client: Client,
    api_key: String,
}

impl AnthropicClient {
    pub fn new() -> Result<Self> {
        let api_key =
            env::var("ANTHROPIC_API_KEY").context("ANTHROPIC_API_KEY must be set")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self { client, api_key })
    }

    pub async fn create_message(&self, request: MessageRequest) -> Result<MessageResponse> {
        let url = format!("{}/v1/messages", CONFIG.anthropic_base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("API error {}: {}", status, error_body));
        }

        Ok(response.json::<MessageResponse>().await?)
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct MessageRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl Default for MessageRequest {
    fn default() -> Self {
        Self {
            model: CONFIG.anthropic_model.clone(),
            messages: vec![],
            max_tokens: CONFIG.anthropic_max_tokens,
            temperature: None,
            system: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub role: String,
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

impl MessageResponse {
    pub fn get_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.clone()),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_joins_content_blocks() {
        let response: MessageResponse = serde_json::from_value(serde_json::json!({
            "id": "msg_01",
            "content": [
                {"type": "text", "text": "first"},
                {"type": "text", "text": "second"}
            ],
            "model": "claude-3-haiku-20240307",
            "role": "assistant",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }))
        .unwrap();
        assert_eq!(response.get_text(), "first\nsecond");
    }

    #[test]
    fn request_omits_unset_optional_fields() {
        let request = MessageRequest {
            model: "m".to_string(),
            messages: vec![Message::user("hi")],
            max_tokens: 16,
            temperature: None,
            system: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("temperature").is_none());
        assert!(value.get("system").is_none());
    }
}
