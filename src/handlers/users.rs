use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::{SearchUsersParams, UpdateUserRequest, User, UserResponse, UsersResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_users))
        .route("/:id", get(get_user).put(update_user))
}

const USER_COLUMNS: &str =
    "id, farcaster_id, display_name, bio, interests, courses, avatar, created_at, updated_at";

/// GET /api/users/:id
async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// PUT /api/users/:id - partial profile update by the owning user
async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Validation error: {}", e)))?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET
            display_name = COALESCE($2::text, display_name),
            bio = COALESCE($3::text, bio),
            interests = COALESCE($4::text[], interests),
            courses = COALESCE($5::text[], courses),
            avatar = COALESCE($6::text, avatar),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(user_id)
    .bind(&payload.display_name)
    .bind(&payload.bio)
    .bind(&payload.interests)
    .bind(&payload.courses)
    .bind(&payload.avatar)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// GET /api/users?search=&interests= - name/bio substring search with an
/// optional interest overlap filter, capped at 20 rows
async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchUsersParams>,
) -> Result<Json<UsersResponse>, AppError> {
    let query = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search query is required".to_string()))?;

    let interests: Option<Vec<String>> = params.interests.as_deref().and_then(|raw| {
        let parsed: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        (!parsed.is_empty()).then_some(parsed)
    });

    let pattern = format!("%{}%", query);
    let users = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {}
        FROM users
        WHERE (display_name ILIKE $1 OR bio ILIKE $1)
          AND ($2::text[] IS NULL OR interests && $2)
        ORDER BY display_name
        LIMIT 20
        "#,
        USER_COLUMNS
    ))
    .bind(&pattern)
    .bind(&interests)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}
