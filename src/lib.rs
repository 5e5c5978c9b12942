pub mod chat;
pub mod cli;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod server;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use log::info;

use chat::ChatService;
use cli::Args;
use history::file::FileStore;
use history::ConversationRegistry;
use llm::chat::new_client;
use llm::{ LlmConfig, LlmType };
use server::Server;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or("adapter default"));
    info!("History Path: {}", args.history_path);
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("-------------------------");

    let llm_type: LlmType = args.chat_llm_type.parse()?;
    let chat_config = LlmConfig {
        llm_type,
        api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
        completion_model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
        request_timeout: Duration::from_secs(args.request_timeout_secs),
    };
    let chat_client = new_client(&chat_config)?;

    let store = FileStore::new(&args.history_path);
    let registry = Arc::new(ConversationRegistry::open(store)?);
    let service = Arc::new(ChatService::new(registry.clone(), chat_client));

    info!("Starting server on: {}", args.server_addr);
    let server = Server::new(args.server_addr.clone(), service, registry);
    server.run().await?;

    Ok(())
}
