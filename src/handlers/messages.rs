use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::errors::AppError;
use crate::models::{
    ListMessagesParams, Message, MessageResponse, MessageType, MessagesResponse,
    SendMessageRequest,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_messages).post(send_message))
}

const MESSAGE_COLUMNS: &str = r#"id, sender_id, group_id, content, "type", created_at"#;

/// POST /api/messages - senders must belong to the target group
async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Validation error: {}", e)))?;

    let sender_id = super::required_id(payload.sender_id)?;
    let group_id = super::required_id(payload.group_id)?;
    let content = super::required(&payload.content)?.to_string();
    let message_type = match payload.message_type.as_deref() {
        Some(raw) => raw.parse::<MessageType>().map_err(AppError::BadRequest)?,
        None => MessageType::Text,
    };

    let group_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM study_groups WHERE id = $1)")
            .bind(group_id)
            .fetch_one(&state.db)
            .await?;
    if !group_exists {
        return Err(AppError::NotFound(format!(
            "Study group {} not found",
            group_id
        )));
    }

    let is_member: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM study_group_members WHERE group_id = $1 AND user_id = $2)",
    )
    .bind(group_id)
    .bind(sender_id)
    .fetch_one(&state.db)
    .await?;
    if !is_member {
        return Err(AppError::BadRequest(
            "Sender is not a member of this study group".to_string(),
        ));
    }

    let message = sqlx::query_as::<_, Message>(&format!(
        r#"INSERT INTO messages (sender_id, group_id, content, "type")
           VALUES ($1, $2, $3, $4) RETURNING {}"#,
        MESSAGE_COLUMNS
    ))
    .bind(sender_id)
    .bind(group_id)
    .bind(&content)
    .bind(message_type)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(MessageResponse {
        success: true,
        message,
    }))
}

/// GET /api/messages?groupId=&limit= - newest first, capped at 50
async fn list_messages(
    State(state): State<AppState>,
    Query(params): Query<ListMessagesParams>,
) -> Result<Json<MessagesResponse>, AppError> {
    let group_id = params
        .group_id
        .ok_or_else(|| AppError::BadRequest("Group ID is required".to_string()))?;
    let limit = params.limit.unwrap_or(50).clamp(1, 50);

    let messages = sqlx::query_as::<_, Message>(&format!(
        "SELECT {} FROM messages WHERE group_id = $1 ORDER BY created_at DESC LIMIT $2",
        MESSAGE_COLUMNS
    ))
    .bind(group_id)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(MessagesResponse {
        success: true,
        messages,
    }))
}
