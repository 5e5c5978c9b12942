pub mod api;

use std::error::Error;
use std::sync::Arc;

use crate::chat::ChatService;
use crate::history::ConversationRegistry;

pub struct Server {
    addr: String,
    service: Arc<ChatService>,
    registry: Arc<ConversationRegistry>,
}

impl Server {
    pub fn new(
        addr: String,
        service: Arc<ChatService>,
        registry: Arc<ConversationRegistry>
    ) -> Self {
        Self {
            addr,
            service,
            registry,
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(&self.addr, self.service.clone(), self.registry.clone()).await
    }
}
