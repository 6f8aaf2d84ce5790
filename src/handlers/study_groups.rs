use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{is_foreign_key_violation, is_unique_violation, AppError};
use crate::models::{
    CreateStudyGroupRequest, GroupMembershipResponse, JoinGroupRequest, LeaveGroupParams,
    ListStudyGroupsParams, StudyGroup, StudyGroupResponse, StudyGroupWithMembers,
    StudyGroupsResponse,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_study_groups).post(create_study_group))
        .route("/:id", get(get_study_group))
        .route("/:id/join", post(join_study_group).delete(leave_study_group))
}

const GROUP_COLUMNS: &str = "id, name, description, course, created_by, max_members, \
     schedule_link, is_active, created_at, updated_at";

const GROUP_WITH_MEMBERS_SELECT: &str = r#"
    SELECT
        g.id, g.name, g.description, g.course, g.created_by, g.max_members,
        g.schedule_link, g.is_active, g.created_at, g.updated_at,
        COALESCE(
            ARRAY_AGG(m.user_id ORDER BY m.joined_at) FILTER (WHERE m.user_id IS NOT NULL),
            ARRAY[]::uuid[]
        ) AS members
    FROM study_groups g
    LEFT JOIN study_group_members m ON m.group_id = g.id
"#;

/// Capacity check for the join path. No cap means unlimited.
fn can_accept_member(member_count: i64, max_members: Option<i32>) -> bool {
    match max_members {
        Some(cap) => member_count < cap as i64,
        None => true,
    }
}

async fn fetch_group_with_members(
    db: &PgPool,
    group_id: Uuid,
) -> Result<Option<StudyGroupWithMembers>, AppError> {
    let group = sqlx::query_as::<_, StudyGroupWithMembers>(&format!(
        "{} WHERE g.id = $1 GROUP BY g.id",
        GROUP_WITH_MEMBERS_SELECT
    ))
    .bind(group_id)
    .fetch_optional(db)
    .await?;

    Ok(group)
}

/// GET /api/study-groups?userId=&course=&search= - active groups, newest
/// first; userId restricts to the user's own groups, search is capped at 20
async fn list_study_groups(
    State(state): State<AppState>,
    Query(params): Query<ListStudyGroupsParams>,
) -> Result<Json<StudyGroupsResponse>, AppError> {
    let search_pattern = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));

    let study_groups = sqlx::query_as::<_, StudyGroupWithMembers>(&format!(
        r#"
        {}
        WHERE g.is_active = TRUE
          AND ($1::text IS NULL OR g.course = $1)
          AND ($2::uuid IS NULL OR EXISTS (
              SELECT 1 FROM study_group_members sm
              WHERE sm.group_id = g.id AND sm.user_id = $2
          ))
          AND ($3::text IS NULL OR g.name ILIKE $3 OR g.description ILIKE $3)
        GROUP BY g.id
        ORDER BY g.created_at DESC
        LIMIT CASE WHEN $3::text IS NULL THEN NULL ELSE 20 END
        "#,
        GROUP_WITH_MEMBERS_SELECT
    ))
    .bind(&params.course)
    .bind(params.user_id)
    .bind(&search_pattern)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(StudyGroupsResponse {
        success: true,
        study_groups,
    }))
}

/// GET /api/study-groups/:id
async fn get_study_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<StudyGroupResponse>, AppError> {
    let study_group = fetch_group_with_members(&state.db, group_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Study group {} not found", group_id)))?;

    Ok(Json(StudyGroupResponse {
        success: true,
        study_group,
    }))
}

/// POST /api/study-groups - create a group with the creator as its first
/// member. The optional Farcaster announcement must never fail the request.
async fn create_study_group(
    State(state): State<AppState>,
    Json(payload): Json<CreateStudyGroupRequest>,
) -> Result<Json<StudyGroupResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Validation error: {}", e)))?;

    let name = super::required(&payload.name)?.to_string();
    let description = super::required(&payload.description)?.to_string();
    let course = super::required(&payload.course)?.to_string();
    let created_by = super::required_id(payload.created_by)?;
    let max_members = payload.max_members.unwrap_or(20);

    let mut tx = state.db.begin().await?;

    let group = sqlx::query_as::<_, StudyGroup>(&format!(
        "INSERT INTO study_groups (name, description, course, created_by, max_members, schedule_link) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        GROUP_COLUMNS
    ))
    .bind(&name)
    .bind(&description)
    .bind(&course)
    .bind(created_by)
    .bind(max_members)
    .bind(&payload.schedule_link)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            AppError::BadRequest("Unknown user".to_string())
        } else {
            e.into()
        }
    })?;

    // Creator is implicitly a member
    sqlx::query("INSERT INTO study_group_members (group_id, user_id) VALUES ($1, $2)")
        .bind(group.id)
        .bind(created_by)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if payload.announce_on_farcaster {
        if let Some(signer_uuid) = payload.signer_uuid.as_deref() {
            if let Err(e) = state
                .farcaster
                .post_study_group_announcement(signer_uuid, &name, &course, &description)
                .await
            {
                tracing::warn!("Failed to announce study group on Farcaster: {}", e);
            }
        }
    }

    Ok(Json(StudyGroupResponse {
        success: true,
        study_group: StudyGroupWithMembers {
            group,
            members: vec![created_by],
        },
    }))
}

/// POST /api/study-groups/:id/join - add a member if absent and capacity
/// allows. The group row is locked for the duration of the check so two
/// joins at the cap cannot both succeed.
async fn join_study_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<JoinGroupRequest>,
) -> Result<Json<GroupMembershipResponse>, AppError> {
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::BadRequest("User ID is required".to_string()))?;

    let mut tx = state.db.begin().await?;

    let group = sqlx::query_as::<_, StudyGroup>(&format!(
        "SELECT {} FROM study_groups WHERE id = $1 FOR UPDATE",
        GROUP_COLUMNS
    ))
    .bind(group_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Study group {} not found", group_id)))?;

    let member_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM study_group_members WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(&mut *tx)
            .await?;

    if !can_accept_member(member_count, group.max_members) {
        return Err(AppError::BadRequest("Study group is full".to_string()));
    }

    sqlx::query("INSERT INTO study_group_members (group_id, user_id) VALUES ($1, $2)")
        .bind(group_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("You are already a member of this study group".to_string())
            } else if is_foreign_key_violation(&e) {
                AppError::BadRequest("Unknown user".to_string())
            } else {
                e.into()
            }
        })?;

    tx.commit().await?;

    let study_group = fetch_group_with_members(&state.db, group_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Study group {} not found", group_id)))?;

    Ok(Json(GroupMembershipResponse {
        success: true,
        study_group,
        message: "Successfully joined study group".to_string(),
    }))
}

/// DELETE /api/study-groups/:id/join?userId= - remove the membership row if
/// present; leaving a group you are not in is a no-op
async fn leave_study_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Query(params): Query<LeaveGroupParams>,
) -> Result<Json<GroupMembershipResponse>, AppError> {
    let user_id = params
        .user_id
        .ok_or_else(|| AppError::BadRequest("User ID is required".to_string()))?;

    let study_group = fetch_group_with_members(&state.db, group_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Study group {} not found", group_id)))?;

    sqlx::query("DELETE FROM study_group_members WHERE group_id = $1 AND user_id = $2")
        .bind(group_id)
        .bind(user_id)
        .execute(&state.db)
        .await?;

    let study_group = fetch_group_with_members(&state.db, group_id)
        .await?
        .unwrap_or(study_group);

    Ok(Json(GroupMembershipResponse {
        success: true,
        study_group,
        message: "Successfully left study group".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::can_accept_member;

    #[test]
    fn uncapped_groups_always_accept() {
        assert!(can_accept_member(0, None));
        assert!(can_accept_member(10_000, None));
    }

    #[test]
    fn capped_groups_reject_at_the_boundary() {
        assert!(can_accept_member(19, Some(20)));
        assert!(!can_accept_member(20, Some(20)));
        assert!(!can_accept_member(21, Some(20)));
    }
}
