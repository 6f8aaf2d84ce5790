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
    Circle, CircleMembershipResponse, CircleResponse, CircleWithMembers, CirclesResponse,
    CreateCircleRequest, JoinCircleRequest, LeaveCircleParams, ListCirclesParams,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_circles).post(create_circle))
        .route("/:id", get(get_circle))
        .route("/:id/join", post(join_circle).delete(leave_circle))
}

const CIRCLE_COLUMNS: &str =
    "id, name, description, topic, created_by, is_private, created_at, updated_at";

const CIRCLE_WITH_MEMBERS_SELECT: &str = r#"
    SELECT
        c.id, c.name, c.description, c.topic, c.created_by, c.is_private,
        c.created_at, c.updated_at,
        COALESCE(
            ARRAY_AGG(m.user_id ORDER BY m.joined_at) FILTER (WHERE m.user_id IS NOT NULL),
            ARRAY[]::uuid[]
        ) AS members
    FROM circles c
    LEFT JOIN circle_members m ON m.circle_id = c.id
"#;

async fn fetch_circle_with_members(
    db: &PgPool,
    circle_id: Uuid,
) -> Result<Option<CircleWithMembers>, AppError> {
    let circle = sqlx::query_as::<_, CircleWithMembers>(&format!(
        "{} WHERE c.id = $1 GROUP BY c.id",
        CIRCLE_WITH_MEMBERS_SELECT
    ))
    .bind(circle_id)
    .fetch_optional(db)
    .await?;

    Ok(circle)
}

/// GET /api/circles?userId=&topic=&search= - newest first. Private circles
/// only show up in the member-scoped (userId) listing.
async fn list_circles(
    State(state): State<AppState>,
    Query(params): Query<ListCirclesParams>,
) -> Result<Json<CirclesResponse>, AppError> {
    let search_pattern = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));

    let circles = sqlx::query_as::<_, CircleWithMembers>(&format!(
        r#"
        {}
        WHERE ($1::text IS NULL OR c.topic = $1)
          AND (CASE WHEN $2::uuid IS NULL THEN c.is_private = FALSE
               ELSE EXISTS (
                   SELECT 1 FROM circle_members cm
                   WHERE cm.circle_id = c.id AND cm.user_id = $2
               ) END)
          AND ($3::text IS NULL OR c.name ILIKE $3 OR c.description ILIKE $3)
        GROUP BY c.id
        ORDER BY c.created_at DESC
        LIMIT CASE WHEN $3::text IS NULL THEN NULL ELSE 20 END
        "#,
        CIRCLE_WITH_MEMBERS_SELECT
    ))
    .bind(&params.topic)
    .bind(params.user_id)
    .bind(&search_pattern)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(CirclesResponse {
        success: true,
        circles,
    }))
}

/// GET /api/circles/:id
async fn get_circle(
    State(state): State<AppState>,
    Path(circle_id): Path<Uuid>,
) -> Result<Json<CircleResponse>, AppError> {
    let circle = fetch_circle_with_members(&state.db, circle_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Circle {} not found", circle_id)))?;

    Ok(Json(CircleResponse {
        success: true,
        circle,
    }))
}

/// POST /api/circles - create a circle with the creator as its first
/// member. Invites are only cast for public circles, and never fail the
/// request.
async fn create_circle(
    State(state): State<AppState>,
    Json(payload): Json<CreateCircleRequest>,
) -> Result<Json<CircleResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Validation error: {}", e)))?;

    let name = super::required(&payload.name)?.to_string();
    let description = super::required(&payload.description)?.to_string();
    let topic = super::required(&payload.topic)?.to_string();
    let created_by = super::required_id(payload.created_by)?;

    let mut tx = state.db.begin().await?;

    let circle = sqlx::query_as::<_, Circle>(&format!(
        "INSERT INTO circles (name, description, topic, created_by, is_private) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        CIRCLE_COLUMNS
    ))
    .bind(&name)
    .bind(&description)
    .bind(&topic)
    .bind(created_by)
    .bind(payload.is_private)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            AppError::BadRequest("Unknown user".to_string())
        } else {
            e.into()
        }
    })?;

    sqlx::query("INSERT INTO circle_members (circle_id, user_id) VALUES ($1, $2)")
        .bind(circle.id)
        .bind(created_by)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if payload.announce_on_farcaster && !payload.is_private {
        if let Some(signer_uuid) = payload.signer_uuid.as_deref() {
            if let Err(e) = state
                .farcaster
                .post_circle_invite(signer_uuid, &name, &topic, &description)
                .await
            {
                tracing::warn!("Failed to announce circle on Farcaster: {}", e);
            }
        }
    }

    Ok(Json(CircleResponse {
        success: true,
        circle: CircleWithMembers {
            circle,
            members: vec![created_by],
        },
    }))
}

/// POST /api/circles/:id/join - circles have no member cap; duplicate
/// membership is still a conflict
async fn join_circle(
    State(state): State<AppState>,
    Path(circle_id): Path<Uuid>,
    Json(payload): Json<JoinCircleRequest>,
) -> Result<Json<CircleMembershipResponse>, AppError> {
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::BadRequest("User ID is required".to_string()))?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM circles WHERE id = $1)")
        .bind(circle_id)
        .fetch_one(&state.db)
        .await?;
    if !exists {
        return Err(AppError::NotFound(format!("Circle {} not found", circle_id)));
    }

    sqlx::query("INSERT INTO circle_members (circle_id, user_id) VALUES ($1, $2)")
        .bind(circle_id)
        .bind(user_id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("You are already a member of this circle".to_string())
            } else if is_foreign_key_violation(&e) {
                AppError::BadRequest("Unknown user".to_string())
            } else {
                e.into()
            }
        })?;

    let circle = fetch_circle_with_members(&state.db, circle_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Circle {} not found", circle_id)))?;

    Ok(Json(CircleMembershipResponse {
        success: true,
        circle,
        message: "Successfully joined circle".to_string(),
    }))
}

/// DELETE /api/circles/:id/join?userId=
async fn leave_circle(
    State(state): State<AppState>,
    Path(circle_id): Path<Uuid>,
    Query(params): Query<LeaveCircleParams>,
) -> Result<Json<CircleMembershipResponse>, AppError> {
    let user_id = params
        .user_id
        .ok_or_else(|| AppError::BadRequest("User ID is required".to_string()))?;

    let circle = fetch_circle_with_members(&state.db, circle_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Circle {} not found", circle_id)))?;

    sqlx::query("DELETE FROM circle_members WHERE circle_id = $1 AND user_id = $2")
        .bind(circle_id)
        .bind(user_id)
        .execute(&state.db)
        .await?;

    let circle = fetch_circle_with_members(&state.db, circle_id)
        .await?
        .unwrap_or(circle);

    Ok(Json(CircleMembershipResponse {
        success: true,
        circle,
        message: "Successfully left circle".to_string(),
    }))
}
