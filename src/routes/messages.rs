//! Direct-message endpoints: history and sending.
//!
//! Sends go through the fanout dispatcher, which persists exactly once and
//! handles live delivery; an unknown recipient rejects the request here
//! where the socket path would drop it silently.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::message::Message;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages))
        .route("/messages/with/{user_id}", get(thread_with_user))
        .route("/messages/to/{recipient_id}", post(send_message))
}

// ---------------------------------------------------------------------------
// GET /messages
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/messages",
    tag = "Messages",
    responses(
        (status = 200, description = "Direct messages involving the caller, oldest first", body = [Message]),
        (status = 401, description = "Missing or invalid token", body = ApiErrorBody),
    ),
)]
pub async fn list_messages(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.store.direct_messages(user_id).await?))
}

// ---------------------------------------------------------------------------
// GET /messages/with/{user_id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/messages/with/{user_id}",
    tag = "Messages",
    params(("user_id" = i64, Path, description = "The other participant")),
    responses(
        (status = 200, description = "Two-party thread, oldest first", body = [Message]),
        (status = 404, description = "User not found", body = ApiErrorBody),
    ),
)]
pub async fn thread_with_user(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(other_id): Path<i64>,
) -> Result<Json<Vec<Message>>, ApiError> {
    if state.store.find_user(other_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(Json(state.store.thread_between(user_id, other_id).await?))
}

// ---------------------------------------------------------------------------
// POST /messages/to/{recipient_id}
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

#[utoipa::path(
    post,
    path = "/messages/to/{recipient_id}",
    tag = "Messages",
    params(("recipient_id" = i64, Path, description = "Recipient user id")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message persisted (and delivered if the recipient is connected)", body = Message),
        (status = 404, description = "Recipient not found", body = ApiErrorBody),
    ),
)]
pub async fn send_message(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(recipient_id): Path<i64>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message = state
        .dispatcher
        .route_personal(user_id, recipient_id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
