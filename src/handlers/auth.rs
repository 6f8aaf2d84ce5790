use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::errors::{is_unique_violation, AppError};
use crate::models::{User, UserResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FarcasterAuthRequest {
    pub fid: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FarcasterLookupParams {
    pub fid: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarcasterData {
    pub username: String,
    pub follower_count: i64,
    pub following_count: i64,
    pub verified: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub user: User,
    pub farcaster_data: FarcasterData,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/farcaster", post(login).get(lookup))
}

const USER_COLUMNS: &str =
    "id, farcaster_id, display_name, bio, interests, courses, avatar, created_at, updated_at";

/// POST /api/auth/farcaster - resolve a fid against the social graph and
/// lazily provision a local user record on first sight
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<FarcasterAuthRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let fid = payload
        .fid
        .ok_or_else(|| AppError::BadRequest("Farcaster ID is required".to_string()))?;

    let profile = state
        .farcaster
        .get_user_by_fid(fid)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found on Farcaster".to_string()))?;

    let farcaster_id = profile.fid.to_string();

    let existing = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE farcaster_id = $1",
        USER_COLUMNS
    ))
    .bind(&farcaster_id)
    .fetch_optional(&state.db)
    .await?;

    let user = match existing {
        Some(user) => user,
        None => {
            tracing::info!("Provisioning local user for fid {}", fid);
            let inserted = sqlx::query_as::<_, User>(&format!(
                "INSERT INTO users (farcaster_id, display_name, bio, avatar) \
                 VALUES ($1, $2, $3, $4) RETURNING {}",
                USER_COLUMNS
            ))
            .bind(&farcaster_id)
            .bind(&profile.display_name)
            .bind(profile.bio_text())
            .bind(&profile.pfp_url)
            .fetch_one(&state.db)
            .await;

            match inserted {
                Ok(user) => user,
                // Lost a concurrent first-login race; the row exists now
                Err(e) if is_unique_violation(&e) => {
                    sqlx::query_as::<_, User>(&format!(
                        "SELECT {} FROM users WHERE farcaster_id = $1",
                        USER_COLUMNS
                    ))
                    .bind(&farcaster_id)
                    .fetch_one(&state.db)
                    .await?
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    Ok(Json(AuthResponse {
        success: true,
        user,
        farcaster_data: FarcasterData {
            username: profile.username.clone(),
            follower_count: profile.follower_count,
            following_count: profile.following_count,
            verified: profile.verified(),
        },
    }))
}

/// GET /api/auth/farcaster?fid= - look up an already-provisioned user
async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<FarcasterLookupParams>,
) -> Result<Json<UserResponse>, AppError> {
    let fid = params
        .fid
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Farcaster ID is required".to_string()))?;

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE farcaster_id = $1",
        USER_COLUMNS
    ))
    .bind(fid)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}
