pub mod gemini;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::{ LlmConfig, LlmType };
use self::gemini::GeminiChatClient;
use crate::error::ServiceError;

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

/// Single-turn text completion against an external provider. The trait is
/// the seam between the chat workflow and whichever backend is configured.
#[async_trait]
pub trait ChatClient: Send + Sync + std::fmt::Debug {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, ServiceError>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ServiceError> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Gemini => {
            let specific_client = GeminiChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}
