// src/llm/mod.rs
pub mod anthropic;

use anyhow::Result;
use async_trait::async_trait;

pub use anthropic::{AnthropicClient, Message, MessageRequest, MessageResponse};

/// Seam the conversational driver talks through. The real implementation is
/// [`AnthropicClient`]; tests substitute a scripted model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn create_message(&self, request: MessageRequest) -> Result<MessageResponse>;
}

#[async_trait]
impl ChatModel for AnthropicClient {
    async fn create_message(&self, request: MessageRequest) -> Result<MessageResponse> {
        AnthropicClient::create_message(self, request).await
    }
}
