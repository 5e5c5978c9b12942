use std::sync::Arc;

use log::info;

use crate::error::ServiceError;
use crate::history::ConversationRegistry;
use crate::llm::chat::ChatClient;
use crate::models::chat::{ ChatRequest, ChatResponse, Role };

/// Orchestrates a single chat turn: validate, resolve or create the
/// conversation, append the user message, call the completion provider,
/// append the assistant message.
///
/// The user message is persisted before the provider call, so a provider
/// failure leaves it in the history (at-least-once, no rollback). The
/// provider is invoked without holding the registry lock.
pub struct ChatService {
    registry: Arc<ConversationRegistry>,
    chat_client: Arc<dyn ChatClient>,
}

impl ChatService {
    pub fn new(registry: Arc<ConversationRegistry>, chat_client: Arc<dyn ChatClient>) -> Self {
        Self { registry, chat_client }
    }

    pub async fn handle_turn(&self, request: ChatRequest) -> Result<ChatResponse, ServiceError> {
        if request.message.trim().is_empty() {
            return Err(ServiceError::Validation("Message cannot be empty".to_string()));
        }

        let existing = match request.conversation_id.as_deref() {
            Some(id) => self.registry.get(id).await,
            None => None,
        };
        let conversation = match existing {
            Some(conversation) => {
                info!("Continuing conversation: {}", conversation.id);
                conversation
            }
            None => {
                let conversation = self.registry.create(&request.message).await;
                info!("Started new conversation: {}", conversation.id);
                conversation
            }
        };

        self.registry
            .append_message(&conversation.id, Role::User, &request.message).await?;

        // Single-turn completion: only the latest user text is forwarded.
        let prompt = format!("User: {}\nAssistant:", request.message);
        let completion = self.chat_client.complete(&prompt).await?;

        let (index, message) = self.registry
            .append_message(&conversation.id, Role::Assistant, &completion.response).await?;

        Ok(ChatResponse {
            response: completion.response,
            conversation_id: conversation.id,
            message_id: index.to_string(),
            timestamp: message.timestamp,
        })
    }
}
