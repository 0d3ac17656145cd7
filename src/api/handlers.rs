//! HTTP request handlers

use super::assets::serve_static;
use super::types::{ErrorResponse, MessagesResponse, SendMessageRequest};
use super::AppState;
use crate::chat::ChatError;
use crate::llm::MessageRole;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/messages", post(send_message))
        // Everything else is the client app
        .fallback(serve_static)
        .with_state(state)
}

// ============================================================
// Messages
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<MessagesResponse>, AppError> {
    let Json(req) = body.map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;
    let content = validate(&req)?;

    let messages = state.session.send_user_message(content).await?;

    Ok(Json(MessagesResponse {
        success: true,
        messages,
    }))
}

/// Check the request shape and return the content to send.
/// Any non-empty role is accepted; the message is always stored as `user`.
fn validate(req: &SendMessageRequest) -> Result<&str, AppError> {
    let role = req.role.as_deref().unwrap_or_default();
    let content = req.content.as_deref().unwrap_or_default();

    if role.is_empty() || content.is_empty() {
        return Err(AppError::BadRequest("Missing role or content".to_string()));
    }
    if role != MessageRole::User.as_str() {
        tracing::debug!(role, "Storing non-user role as user");
    }

    Ok(content)
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    BadGateway(String),
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::InvalidRequest(msg) => AppError::BadRequest(msg),
            ChatError::Provider(e) => {
                tracing::error!(kind = %e.kind, error = %e.message, "Turn failed");
                AppError::BadGateway(format!("Inference provider failed: {}", e.message))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(msg) => {
                tracing::debug!(reason = %msg, "Rejected request");
                (StatusCode::BAD_REQUEST, msg).into_response()
            }
            AppError::BadGateway(msg) => {
                (StatusCode::BAD_GATEWAY, Json(ErrorResponse::new(msg))).into_response()
            }
        }
    }
}
