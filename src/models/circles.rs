use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Topic-based interest circle. Private circles are visible only through
/// the member-scoped listing; circles carry no member cap.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Circle {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub topic: String,
    pub created_by: Uuid,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Circle plus its member id list, as served by the API
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CircleWithMembers {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub circle: Circle,
    pub members: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCircleRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub topic: Option<String>,
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub announce_on_farcaster: bool,
    pub signer_uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCircleRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveCircleParams {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCirclesParams {
    pub user_id: Option<Uuid>,
    pub topic: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CircleResponse {
    pub success: bool,
    pub circle: CircleWithMembers,
}

#[derive(Debug, Serialize)]
pub struct CirclesResponse {
    pub success: bool,
    pub circles: Vec<CircleWithMembers>,
}

#[derive(Debug, Serialize)]
pub struct CircleMembershipResponse {
    pub success: bool,
    pub circle: CircleWithMembers,
    pub message: String,
}
