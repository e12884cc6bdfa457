pub mod auth;
pub mod groups;
pub mod health;
pub mod messages;
pub mod notifications;

use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::realtime::socket::router())
        .merge(auth::router())
        .merge(messages::router())
        .merge(groups::router())
        .merge(notifications::router())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Messages
        messages::list_messages,
        messages::thread_with_user,
        messages::send_message,
        // Groups
        groups::create_group,
        groups::list_groups,
        groups::get_group,
        groups::add_member,
        groups::remove_member,
        groups::list_group_messages,
        groups::send_group_message,
        // Notifications
        notifications::list_notifications,
        notifications::mark_read,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            // Models
            crate::models::user::UserResponse,
            crate::models::group::Group,
            crate::models::group::GroupResponse,
            crate::models::message::Message,
            crate::models::notification::NotificationResponse,
            // Route request/response types
            health::HealthResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::LoginResponse,
            messages::SendMessageRequest,
            groups::CreateGroupRequest,
            groups::SendGroupMessageRequest,
            groups::MembershipResponse,
            notifications::MarkReadResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Auth", description = "Authentication"),
        (name = "Messages", description = "Direct messaging"),
        (name = "Groups", description = "Group chat"),
        (name = "Notifications", description = "Notifications"),
    )
)]
pub struct ApiDoc;
