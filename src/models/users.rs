use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Local user record, provisioned lazily on first Farcaster login.
/// Never deleted in-app.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub farcaster_id: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub interests: Vec<String>,
    pub courses: Vec<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update; only the owning user's fields, all optional
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
    pub courses: Option<Vec<String>>,
    #[validate(url)]
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchUsersParams {
    pub search: Option<String>,
    /// Comma-separated interest filter, e.g. `interests=Gaming,Music`
    pub interests: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<User>,
}
