pub mod file;

use std::collections::HashMap;

use chrono::Utc;
use log::{ error, info };
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::chat::{
    ChatMessage,
    Conversation,
    ConversationSummary,
    MessageView,
    Role,
};
use self::file::FileStore;

const TITLE_MAX_CHARS: usize = 30;

/// In-memory source of truth for conversations during process lifetime,
/// hydrated from the file store at startup and mirrored back to it after
/// every mutation (write-through).
///
/// All read-modify-write-save sequences run under one mutex so concurrent
/// chat turns cannot clobber each other's appends. The completion provider
/// is never called while the lock is held.
pub struct ConversationRegistry {
    store: FileStore,
    conversations: Mutex<HashMap<String, Conversation>>,
}

impl ConversationRegistry {
    pub fn open(store: FileStore) -> Result<Self, ServiceError> {
        let conversations = store.load()?;
        info!("Loaded {} conversation(s) from history", conversations.len());
        Ok(Self {
            store,
            conversations: Mutex::new(conversations),
        })
    }

    pub async fn get(&self, id: &str) -> Option<Conversation> {
        self.conversations.lock().await.get(id).cloned()
    }

    /// Allocate a new conversation titled after the first user message.
    pub async fn create(&self, first_message: &str) -> Conversation {
        let now = Utc::now().to_rfc3339();
        let conversation = Conversation {
            id: Uuid::new_v4().to_string(),
            title: derive_title(first_message),
            created_at: now.clone(),
            updated_at: now,
            messages: Vec::new(),
        };

        let mut all = self.conversations.lock().await;
        all.insert(conversation.id.clone(), conversation.clone());
        self.persist(&all);
        conversation
    }

    /// Append a message with the current timestamp and advance
    /// `updated_at`. Returns the message together with its index within
    /// the conversation.
    pub async fn append_message(
        &self,
        id: &str,
        role: Role,
        content: &str
    ) -> Result<(usize, ChatMessage), ServiceError> {
        let mut all = self.conversations.lock().await;
        let conversation = all
            .get_mut(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        let message = ChatMessage {
            role,
            content: content.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };
        conversation.messages.push(message.clone());
        conversation.updated_at = message.timestamp.clone();
        let index = conversation.messages.len() - 1;

        self.persist(&all);
        Ok((index, message))
    }

    /// Enumeration projection in creation order. RFC 3339 timestamps with a
    /// fixed UTC offset sort lexicographically, ties broken by id.
    pub async fn list(&self) -> Vec<ConversationSummary> {
        let all = self.conversations.lock().await;
        let mut summaries: Vec<ConversationSummary> = all
            .values()
            .map(|c| ConversationSummary {
                id: c.id.clone(),
                title: c.title.clone(),
                created_at: c.created_at.clone(),
                updated_at: c.updated_at.clone(),
                message_count: c.messages.len(),
            })
            .collect();
        summaries.sort_by(|a, b| {
            a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
        });
        summaries
    }

    pub async fn list_messages(&self, id: &str) -> Result<Vec<MessageView>, ServiceError> {
        let all = self.conversations.lock().await;
        let conversation = all
            .get(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        Ok(
            conversation.messages
                .iter()
                .enumerate()
                .map(|(i, m)| MessageView {
                    id: i.to_string(),
                    content: m.content.clone(),
                    role: m.role,
                    timestamp: m.timestamp.clone(),
                })
                .collect()
        )
    }

    /// Write-through mirror of the full mapping. A failed save must not
    /// fail the in-flight operation; the in-memory state stays
    /// authoritative and the next successful save picks it up.
    fn persist(&self, all: &HashMap<String, Conversation>) {
        if let Err(e) = self.store.save(all) {
            error!("Failed to persist conversation history: {}", e);
        }
    }
}

fn derive_title(message: &str) -> String {
    let mut title: String = message.chars().take(TITLE_MAX_CHARS).collect();
    if message.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}
