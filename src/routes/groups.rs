//! Group endpoints: CRUD, membership, and group messaging.
//!
//! Membership changes keep the connection registry's routing group set in
//! sync for connected users and push a notification through the dispatcher's
//! side-channel.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::group::{Group, GroupResponse};
use crate::models::message::Message;
use crate::models::user::UserResponse;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups", post(create_group).get(list_groups))
        .route("/groups/{group_id}", get(get_group))
        .route(
            "/groups/{group_id}/members/{user_id}",
            post(add_member).delete(remove_member),
        )
        .route(
            "/groups/{group_id}/messages",
            get(list_group_messages).post(send_group_message),
        )
}

/// Load a group and require the caller to be a member.
async fn member_group(state: &AppState, group_id: i64, user_id: i64) -> Result<Group, ApiError> {
    let group = state
        .store
        .find_group(group_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Group not found"))?;
    if !state.store.is_group_member(group_id, user_id).await? {
        return Err(ApiError::forbidden("Not a member of this group"));
    }
    Ok(group)
}

async fn group_response(state: &AppState, group: Group) -> Result<GroupResponse, ApiError> {
    let members = state
        .store
        .group_members(group.id)
        .await?
        .iter()
        .map(UserResponse::from)
        .collect();
    Ok(GroupResponse {
        id: group.id,
        name: group.name,
        members,
        created_at: group.created_at,
    })
}

// ---------------------------------------------------------------------------
// POST /groups
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<i64>,
}

#[utoipa::path(
    post,
    path = "/groups",
    tag = "Groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created; the creator is always a member", body = GroupResponse),
        (status = 400, description = "Validation failed", body = ApiErrorBody),
    ),
)]
pub async fn create_group(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation(vec![FieldError {
            field: "name".to_string(),
            message: "Group name is required".to_string(),
        }]));
    }

    let group = state.store.create_group(name).await?;
    state.store.add_group_member(group.id, user_id).await?;
    // Unknown member ids are skipped rather than failing the whole create.
    for member_id in &body.member_ids {
        if state.store.find_user(*member_id).await?.is_some() {
            state.store.add_group_member(group.id, *member_id).await?;
        }
    }

    // Connected members start routing through the new group immediately.
    for member in state.store.group_members(group.id).await? {
        state.registry.add_group(member.id, group.id);
    }

    tracing::info!(group_id = group.id, name = %group.name, "group created");
    Ok((StatusCode::CREATED, Json(group_response(&state, group).await?)))
}

// ---------------------------------------------------------------------------
// GET /groups
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/groups",
    tag = "Groups",
    responses(
        (status = 200, description = "Groups the caller belongs to", body = [GroupResponse]),
        (status = 401, description = "Missing or invalid token", body = ApiErrorBody),
    ),
)]
pub async fn list_groups(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<GroupResponse>>, ApiError> {
    let mut responses = Vec::new();
    for group in state.store.groups_for_user(user_id).await? {
        responses.push(group_response(&state, group).await?);
    }
    Ok(Json(responses))
}

// ---------------------------------------------------------------------------
// GET /groups/{group_id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/groups/{group_id}",
    tag = "Groups",
    params(("group_id" = i64, Path, description = "Group id")),
    responses(
        (status = 200, description = "The group", body = GroupResponse),
        (status = 403, description = "Caller is not a member", body = ApiErrorBody),
        (status = 404, description = "Group not found", body = ApiErrorBody),
    ),
)]
pub async fn get_group(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group = member_group(&state, group_id, user_id).await?;
    Ok(Json(group_response(&state, group).await?))
}

// ---------------------------------------------------------------------------
// POST /groups/{group_id}/members/{user_id}
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct MembershipResponse {
    pub status: &'static str,
}

#[utoipa::path(
    post,
    path = "/groups/{group_id}/members/{user_id}",
    tag = "Groups",
    params(
        ("group_id" = i64, Path, description = "Group id"),
        ("user_id" = i64, Path, description = "User to add"),
    ),
    responses(
        (status = 200, description = "Member added", body = MembershipResponse),
        (status = 403, description = "Caller is not a member", body = ApiErrorBody),
        (status = 404, description = "Group or user not found", body = ApiErrorBody),
        (status = 409, description = "Already a member", body = ApiErrorBody),
    ),
)]
pub async fn add_member(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path((group_id, target_id)): Path<(i64, i64)>,
) -> Result<Json<MembershipResponse>, ApiError> {
    let group = member_group(&state, group_id, user_id).await?;

    if state.store.find_user(target_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    if !state.store.add_group_member(group_id, target_id).await? {
        return Err(ApiError::conflict("User is already a member of this group"));
    }

    // Mirror into the routing group set if they're connected, then tell them.
    state.registry.add_group(target_id, group_id);
    state
        .dispatcher
        .notify_user(target_id, &format!("You were added to group {}", group.name))
        .await?;

    tracing::info!(group_id, user_id = target_id, "member added to group");
    Ok(Json(MembershipResponse { status: "success" }))
}

// ---------------------------------------------------------------------------
// DELETE /groups/{group_id}/members/{user_id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    delete,
    path = "/groups/{group_id}/members/{user_id}",
    tag = "Groups",
    params(
        ("group_id" = i64, Path, description = "Group id"),
        ("user_id" = i64, Path, description = "User to remove"),
    ),
    responses(
        (status = 200, description = "Member removed", body = MembershipResponse),
        (status = 400, description = "Not a member", body = ApiErrorBody),
        (status = 403, description = "Caller is not a member", body = ApiErrorBody),
        (status = 404, description = "Group or user not found", body = ApiErrorBody),
    ),
)]
pub async fn remove_member(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path((group_id, target_id)): Path<(i64, i64)>,
) -> Result<Json<MembershipResponse>, ApiError> {
    let group = member_group(&state, group_id, user_id).await?;

    if state.store.find_user(target_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    if !state.store.remove_group_member(group_id, target_id).await? {
        return Err(ApiError::bad_request("User is not a member of this group"));
    }

    state.registry.remove_group(target_id, group_id);
    state
        .dispatcher
        .notify_user(
            target_id,
            &format!("You were removed from group {}", group.name),
        )
        .await?;

    tracing::info!(group_id, user_id = target_id, "member removed from group");
    Ok(Json(MembershipResponse { status: "success" }))
}

// ---------------------------------------------------------------------------
// GET /groups/{group_id}/messages
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/groups/{group_id}/messages",
    tag = "Groups",
    params(("group_id" = i64, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group history, oldest first", body = [Message]),
        (status = 403, description = "Caller is not a member", body = ApiErrorBody),
        (status = 404, description = "Group not found", body = ApiErrorBody),
    ),
)]
pub async fn list_group_messages(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> Result<Json<Vec<Message>>, ApiError> {
    member_group(&state, group_id, user_id).await?;
    Ok(Json(state.store.group_messages(group_id).await?))
}

// ---------------------------------------------------------------------------
// POST /groups/{group_id}/messages
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendGroupMessageRequest {
    pub content: String,
}

#[utoipa::path(
    post,
    path = "/groups/{group_id}/messages",
    tag = "Groups",
    params(("group_id" = i64, Path, description = "Group id")),
    request_body = SendGroupMessageRequest,
    responses(
        (status = 201, description = "Message persisted and fanned out to connected members", body = Message),
        (status = 403, description = "Caller is not a member", body = ApiErrorBody),
        (status = 404, description = "Group not found", body = ApiErrorBody),
    ),
)]
pub async fn send_group_message(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    Json(body): Json<SendGroupMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    member_group(&state, group_id, user_id).await?;
    let message = state
        .dispatcher
        .route_group(user_id, group_id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
