use std::any::Any;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ Path, State },
    http::StatusCode,
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use log::{ error, info };
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{ Any as AllowAny, CorsLayer };

use crate::chat::ChatService;
use crate::error::ServiceError;
use crate::history::ConversationRegistry;
use crate::models::chat::{ ChatRequest, ChatResponse, Conversation, ConversationSummary, MessageView };

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ChatService>,
    pub registry: Arc<ConversationRegistry>,
}

/// Map the error taxonomy to status codes. Upstream and persistence
/// failures are logged in full here and surfaced as generic messages;
/// validation and not-found detail goes to the caller.
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::NotFound(_) =>
                (StatusCode::NOT_FOUND, "Conversation not found".to_string()),
            ServiceError::Upstream(_) => {
                error!("{}", self);
                (StatusCode::SERVICE_UNAVAILABLE, "Failed to generate response".to_string())
            }
            ServiceError::Persistence(_) | ServiceError::Config(_) => {
                error!("{}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    // Allow-any CORS also answers OPTIONS preflights on every /api route.
    let cors = CorsLayer::new()
        .allow_origin(AllowAny)
        .allow_methods(AllowAny)
        .allow_headers(AllowAny);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/conversations", get(list_conversations_handler))
        .route("/api/conversations/{id}", get(get_conversation_handler))
        .route("/api/conversations/{id}/messages", get(list_messages_handler))
        .route("/api/health", get(health_handler))
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

pub async fn start_http_server(
    addr: &str,
    service: Arc<ChatService>,
    registry: Arc<ConversationRegistry>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    info!("Starting HTTP API server on: http://{}", addr);

    let app = build_router(AppState { service, registry });
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>
) -> Result<Json<ChatResponse>, ServiceError> {
    let response = state.service.handle_turn(request).await?;
    Ok(Json(response))
}

async fn list_conversations_handler(
    State(state): State<AppState>
) -> Json<Vec<ConversationSummary>> {
    Json(state.registry.list().await)
}

async fn get_conversation_handler(
    State(state): State<AppState>,
    Path(id): Path<String>
) -> Result<Json<Conversation>, ServiceError> {
    state.registry
        .get(&id).await
        .map(Json)
        .ok_or(ServiceError::NotFound(id))
}

async fn list_messages_handler(
    State(state): State<AppState>,
    Path(id): Path<String>
) -> Result<Json<Vec<MessageView>>, ServiceError> {
    state.registry.list_messages(&id).await.map(Json)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Last-resort handler: a panicking request handler becomes a generic 500
/// instead of tearing down the connection.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(|s| s.as_str())
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Request handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal server error" })),
    ).into_response()
}
