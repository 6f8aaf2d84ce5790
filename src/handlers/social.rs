use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::farcaster::FarcasterUser;
use crate::AppState;

/// Pass-through surface over the social graph: user discovery, follows and
/// cast reactions. Nothing here touches the local store.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/search", get(search_farcaster_users))
        .route("/users/:username", get(get_farcaster_user))
        .route("/follows", post(follow).delete(unfollow))
        .route("/reactions", post(react))
}

#[derive(Debug, Deserialize)]
pub struct SocialSearchParams {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SocialUsersResponse {
    pub success: bool,
    pub users: Vec<FarcasterUser>,
}

#[derive(Debug, Serialize)]
pub struct SocialUserResponse {
    pub success: bool,
    pub user: FarcasterUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub signer_uuid: Option<String>,
    pub target_fid: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    pub signer_uuid: Option<String>,
    pub reaction_type: Option<String>,
    pub target: Option<String>,
}

/// GET /api/social/users/search?q=&limit=
async fn search_farcaster_users(
    State(state): State<AppState>,
    Query(params): Query<SocialSearchParams>,
) -> Result<Json<SocialUsersResponse>, AppError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search query is required".to_string()))?;
    let limit = params.limit.unwrap_or(10).clamp(1, 25);

    let users = state.farcaster.search_users(query, limit).await?;

    Ok(Json(SocialUsersResponse {
        success: true,
        users,
    }))
}

/// GET /api/social/users/:username
async fn get_farcaster_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<SocialUserResponse>, AppError> {
    let user = state
        .farcaster
        .get_user_by_username(username.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found on Farcaster", username)))?;

    Ok(Json(SocialUserResponse {
        success: true,
        user,
    }))
}

fn follow_fields(payload: &FollowRequest) -> Result<(&str, i64), AppError> {
    let signer_uuid = payload
        .signer_uuid
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Signer UUID is required".to_string()))?;
    let target_fid = payload
        .target_fid
        .ok_or_else(|| AppError::BadRequest("Target fid is required".to_string()))?;
    Ok((signer_uuid, target_fid))
}

/// POST /api/social/follows
async fn follow(
    State(state): State<AppState>,
    Json(payload): Json<FollowRequest>,
) -> Result<Json<Value>, AppError> {
    let (signer_uuid, target_fid) = follow_fields(&payload)?;
    state.farcaster.follow_user(signer_uuid, target_fid).await?;
    Ok(Json(json!({ "success": true })))
}

/// DELETE /api/social/follows
async fn unfollow(
    State(state): State<AppState>,
    Json(payload): Json<FollowRequest>,
) -> Result<Json<Value>, AppError> {
    let (signer_uuid, target_fid) = follow_fields(&payload)?;
    state
        .farcaster
        .unfollow_user(signer_uuid, target_fid)
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// POST /api/social/reactions - like or recast a cast by hash
async fn react(
    State(state): State<AppState>,
    Json(payload): Json<ReactionRequest>,
) -> Result<Json<Value>, AppError> {
    let signer_uuid = payload
        .signer_uuid
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Signer UUID is required".to_string()))?;
    let target = payload
        .target
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Target cast hash is required".to_string()))?;

    match payload.reaction_type.as_deref() {
        Some("like") => state.farcaster.like_cast(signer_uuid, target).await?,
        Some("recast") => state.farcaster.recast_cast(signer_uuid, target).await?,
        _ => {
            return Err(AppError::BadRequest(
                "Reaction type must be 'like' or 'recast'".to_string(),
            ))
        }
    }

    Ok(Json(json!({ "success": true })))
}
