use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::user::UserResponse;

/// A chat group. Membership lives in the store (authoritative), not here.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Group together with its resolved member list, as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupResponse {
    pub id: i64,
    pub name: String,
    pub members: Vec<UserResponse>,
    pub created_at: DateTime<Utc>,
}
