//! Notification endpoints: listing and the one-way read transition.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::notification::NotificationResponse;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{notification_id}/read", put(mark_read))
}

// ---------------------------------------------------------------------------
// GET /notifications
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "Notifications",
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = [NotificationResponse]),
        (status = 401, description = "Missing or invalid token", body = ApiErrorBody),
    ),
)]
pub async fn list_notifications(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let notifications = state
        .store
        .notifications_for(user_id)
        .await?
        .iter()
        .map(NotificationResponse::from)
        .collect();
    Ok(Json(notifications))
}

// ---------------------------------------------------------------------------
// PUT /notifications/{notification_id}/read
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    pub status: &'static str,
}

#[utoipa::path(
    put,
    path = "/notifications/{notification_id}/read",
    tag = "Notifications",
    params(("notification_id" = i64, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked read (idempotent)", body = MarkReadResponse),
        (status = 404, description = "Notification not found", body = ApiErrorBody),
    ),
)]
pub async fn mark_read(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<i64>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    if !state
        .store
        .mark_notification_read(notification_id, user_id)
        .await?
    {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(Json(MarkReadResponse { status: "success" }))
}
