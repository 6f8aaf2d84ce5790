use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Course-based collaboration group with an optional member cap.
/// The creator is implicitly a member.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StudyGroup {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub course: String,
    pub created_by: Uuid,
    pub max_members: Option<i32>,
    pub schedule_link: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group plus its member id list, as served by the API
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StudyGroupWithMembers {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub group: StudyGroup,
    pub members: Vec<Uuid>,
}

/// Request body for creating a study group. Required fields are checked by
/// the handler so that a missing field is a 400, not a body rejection.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudyGroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub course: Option<String>,
    pub created_by: Option<Uuid>,
    #[validate(range(min = 2, max = 500))]
    pub max_members: Option<i32>,
    #[validate(url)]
    pub schedule_link: Option<String>,
    #[serde(default)]
    pub announce_on_farcaster: bool,
    pub signer_uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveGroupParams {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStudyGroupsParams {
    pub user_id: Option<Uuid>,
    pub course: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyGroupResponse {
    pub success: bool,
    pub study_group: StudyGroupWithMembers,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyGroupsResponse {
    pub success: bool,
    pub study_groups: Vec<StudyGroupWithMembers>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembershipResponse {
    pub success: bool,
    pub study_group: StudyGroupWithMembers,
    pub message: String,
}
