use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{ to_bytes, Body };
use axum::http::{ Request, StatusCode };
use axum::Router;
use serde_json::{ json, Value };
use tempfile::TempDir;
use tower::ServiceExt;

use chatd::chat::ChatService;
use chatd::error::ServiceError;
use chatd::history::file::FileStore;
use chatd::history::ConversationRegistry;
use chatd::llm::chat::{ ChatClient, CompletionResponse };
use chatd::server::api::{ build_router, AppState };

#[derive(Debug)]
struct CannedClient {
    reply: String,
}

#[async_trait]
impl ChatClient for CannedClient {
    async fn complete(&self, _prompt: &str) -> Result<CompletionResponse, ServiceError> {
        Ok(CompletionResponse {
            response: self.reply.clone(),
        })
    }
}

#[derive(Debug)]
struct FailingClient;

#[async_trait]
impl ChatClient for FailingClient {
    async fn complete(&self, _prompt: &str) -> Result<CompletionResponse, ServiceError> {
        Err(ServiceError::Upstream("provider unreachable".to_string()))
    }
}

fn test_app(client: Arc<dyn ChatClient>) -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("chat_history.json"));
    let registry = Arc::new(ConversationRegistry::open(store).unwrap());
    let service = Arc::new(ChatService::new(registry.clone(), client));
    (build_router(AppState { service, registry }), dir)
}

fn canned_app() -> (Router, TempDir) {
    test_app(Arc::new(CannedClient { reply: "Hello!".to_string() }))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_chat(app: &Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap()
        ).await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_healthy() {
    let (app, _dir) = canned_app();
    let (status, body) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn chat_turn_creates_conversation_and_exposes_it() {
    let (app, _dir) = canned_app();

    let (status, body) = post_chat(&app, json!({ "message": "Hi" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Hello!");
    assert_eq!(body["message_id"], "1");
    let id = body["conversation_id"].as_str().unwrap().to_string();

    let (status, list) = get(&app, "/api/conversations").await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], id.as_str());
    assert_eq!(list[0]["title"], "Hi");
    assert_eq!(list[0]["message_count"], 2);

    let (status, conversation) = get(&app, &format!("/api/conversations/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conversation["id"], id.as_str());
    assert_eq!(conversation["messages"].as_array().unwrap().len(), 2);

    let (status, messages) = get(&app, &format!("/api/conversations/{}/messages", id)).await;
    assert_eq!(status, StatusCode::OK);
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["id"], "0");
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "Hi");
    assert_eq!(messages[1]["id"], "1");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "Hello!");
}

#[tokio::test]
async fn follow_up_turn_appends_to_the_same_conversation() {
    let (app, _dir) = canned_app();

    let (_, first) = post_chat(&app, json!({ "message": "Hi" })).await;
    let id = first["conversation_id"].as_str().unwrap().to_string();

    let (status, second) = post_chat(
        &app,
        json!({ "message": "How are you?", "conversation_id": id })
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["conversation_id"], id.as_str());
    assert_eq!(second["message_id"], "3");

    let (_, messages) = get(&app, &format!("/api/conversations/{}/messages", id)).await;
    assert_eq!(messages.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn empty_message_is_rejected_with_400() {
    let (app, _dir) = canned_app();

    for message in ["", "   ", " \n\t "] {
        let (status, body) = post_chat(&app, json!({ "message": message })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Message cannot be empty");
    }

    // No conversation was created along the way.
    let (_, list) = get(&app, "/api/conversations").await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_conversation_returns_404() {
    let (app, _dir) = canned_app();

    let (status, body) = get(&app, "/api/conversations/no-such-id").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Conversation not found");

    let (status, body) = get(&app, "/api/conversations/no-such-id/messages").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Conversation not found");
}

#[tokio::test]
async fn messages_listing_is_idempotent_between_turns() {
    let (app, _dir) = canned_app();

    let (_, body) = post_chat(&app, json!({ "message": "Hi" })).await;
    let id = body["conversation_id"].as_str().unwrap().to_string();
    let uri = format!("/api/conversations/{}/messages", id);

    let (_, first) = get(&app, &uri).await;
    let (_, second) = get(&app, &uri).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn provider_failure_returns_503_and_keeps_the_user_turn() {
    let (app, _dir) = test_app(Arc::new(FailingClient));

    let (status, body) = post_chat(&app, json!({ "message": "Hi" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Failed to generate response");

    let (_, list) = get(&app, "/api/conversations").await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["message_count"], 1);
}

#[tokio::test]
async fn cors_preflight_is_accepted() {
    let (app, _dir) = canned_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/chat")
                .header("origin", "http://localhost:3000")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap()
        ).await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin")
    );
}
