use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{is_foreign_key_violation, AppError};
use crate::models::{
    AddHelpResponseRequest, CreateHelpRequest, HelpRequest, HelpRequestResponse,
    HelpRequestWithResponses, HelpRequestsResponse, HelpResponse, HelpResponseEnvelope,
    HelpStatus, ListHelpRequestsParams, UpdateHelpStatusRequest, Urgency,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_help_requests).post(create_help_request))
        .route("/:id/responses", post(add_help_response))
        .route("/:id/status", put(update_help_status))
        .route(
            "/:id/responses/:response_id/accept",
            put(accept_help_response),
        )
}

const REQUEST_COLUMNS: &str = "id, user_id, title, description, course, subject, \
     urgency, status, created_at, updated_at";

const RESPONSE_COLUMNS: &str = "id, request_id, helper_id, content, is_accepted, created_at";

async fn load_responses(
    db: &PgPool,
    request_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<HelpResponse>>, AppError> {
    let rows = sqlx::query_as::<_, HelpResponse>(&format!(
        "SELECT {} FROM help_responses WHERE request_id = ANY($1) ORDER BY created_at",
        RESPONSE_COLUMNS
    ))
    .bind(request_ids)
    .fetch_all(db)
    .await?;

    let mut by_request: HashMap<Uuid, Vec<HelpResponse>> = HashMap::new();
    for row in rows {
        by_request.entry(row.request_id).or_default().push(row);
    }
    Ok(by_request)
}

async fn fetch_request_with_responses(
    db: &PgPool,
    request_id: Uuid,
) -> Result<Option<HelpRequestWithResponses>, AppError> {
    let request = sqlx::query_as::<_, HelpRequest>(&format!(
        "SELECT {} FROM help_requests WHERE id = $1",
        REQUEST_COLUMNS
    ))
    .bind(request_id)
    .fetch_optional(db)
    .await?;

    let Some(request) = request else {
        return Ok(None);
    };

    let mut responses = load_responses(db, &[request_id]).await?;
    Ok(Some(HelpRequestWithResponses {
        responses: responses.remove(&request_id).unwrap_or_default(),
        request,
    }))
}

/// GET /api/help-requests?status=&course= - newest first, each request
/// carrying its response thread
async fn list_help_requests(
    State(state): State<AppState>,
    Query(params): Query<ListHelpRequestsParams>,
) -> Result<Json<HelpRequestsResponse>, AppError> {
    let status = params
        .status
        .as_deref()
        .map(|s| s.parse::<HelpStatus>())
        .transpose()
        .map_err(AppError::BadRequest)?;

    let requests = sqlx::query_as::<_, HelpRequest>(&format!(
        r#"
        SELECT {}
        FROM help_requests
        WHERE ($1::help_status IS NULL OR status = $1)
          AND ($2::text IS NULL OR course = $2)
        ORDER BY created_at DESC
        "#,
        REQUEST_COLUMNS
    ))
    .bind(status)
    .bind(&params.course)
    .fetch_all(&state.db)
    .await?;

    let ids: Vec<Uuid> = requests.iter().map(|r| r.id).collect();
    let mut responses = load_responses(&state.db, &ids).await?;

    let help_requests = requests
        .into_iter()
        .map(|request| HelpRequestWithResponses {
            responses: responses.remove(&request.id).unwrap_or_default(),
            request,
        })
        .collect();

    Ok(Json(HelpRequestsResponse {
        success: true,
        help_requests,
    }))
}

/// POST /api/help-requests - status starts open; the optional Farcaster
/// post is swallowed on failure
async fn create_help_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateHelpRequest>,
) -> Result<Json<HelpRequestResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Validation error: {}", e)))?;

    let user_id = super::required_id(payload.user_id)?;
    let title = super::required(&payload.title)?.to_string();
    let description = super::required(&payload.description)?.to_string();
    let subject = super::required(&payload.subject)?.to_string();
    let urgency = super::required(&payload.urgency)?
        .parse::<Urgency>()
        .map_err(AppError::BadRequest)?;

    let request = sqlx::query_as::<_, HelpRequest>(&format!(
        "INSERT INTO help_requests (user_id, title, description, course, subject, urgency) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        REQUEST_COLUMNS
    ))
    .bind(user_id)
    .bind(&title)
    .bind(&description)
    .bind(&payload.course)
    .bind(&subject)
    .bind(urgency)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            AppError::BadRequest("Unknown user".to_string())
        } else {
            e.into()
        }
    })?;

    if payload.post_on_farcaster {
        if let Some(signer_uuid) = payload.signer_uuid.as_deref() {
            if let Err(e) = state
                .farcaster
                .post_help_request(signer_uuid, &subject, &description, urgency.as_str())
                .await
            {
                tracing::warn!("Failed to post help request on Farcaster: {}", e);
            }
        }
    }

    Ok(Json(HelpRequestResponse {
        success: true,
        help_request: HelpRequestWithResponses {
            request,
            responses: vec![],
        },
    }))
}

/// POST /api/help-requests/:id/responses
async fn add_help_response(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<AddHelpResponseRequest>,
) -> Result<Json<HelpResponseEnvelope>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Validation error: {}", e)))?;

    let helper_id = super::required_id(payload.helper_id)?;
    let content = super::required(&payload.content)?.to_string();

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM help_requests WHERE id = $1)")
            .bind(request_id)
            .fetch_one(&state.db)
            .await?;
    if !exists {
        return Err(AppError::NotFound(format!(
            "Help request {} not found",
            request_id
        )));
    }

    let response = sqlx::query_as::<_, HelpResponse>(&format!(
        "INSERT INTO help_responses (request_id, helper_id, content) \
         VALUES ($1, $2, $3) RETURNING {}",
        RESPONSE_COLUMNS
    ))
    .bind(request_id)
    .bind(helper_id)
    .bind(&content)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            AppError::BadRequest("Unknown user".to_string())
        } else {
            e.into()
        }
    })?;

    Ok(Json(HelpResponseEnvelope {
        success: true,
        response,
    }))
}

/// PUT /api/help-requests/:id/status
async fn update_help_status(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<UpdateHelpStatusRequest>,
) -> Result<Json<HelpRequestResponse>, AppError> {
    let status = payload
        .status
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Status is required".to_string()))?
        .parse::<HelpStatus>()
        .map_err(AppError::BadRequest)?;

    let updated = sqlx::query_scalar::<_, Uuid>(
        "UPDATE help_requests SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING id",
    )
    .bind(request_id)
    .bind(status)
    .fetch_optional(&state.db)
    .await?;

    if updated.is_none() {
        return Err(AppError::NotFound(format!(
            "Help request {} not found",
            request_id
        )));
    }

    let help_request = fetch_request_with_responses(&state.db, request_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Help request {} not found", request_id)))?;

    Ok(Json(HelpRequestResponse {
        success: true,
        help_request,
    }))
}

/// PUT /api/help-requests/:id/responses/:response_id/accept - marks the
/// response accepted; a previously accepted response is left untouched
async fn accept_help_response(
    State(state): State<AppState>,
    Path((request_id, response_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<HelpResponseEnvelope>, AppError> {
    let response = sqlx::query_as::<_, HelpResponse>(&format!(
        "UPDATE help_responses SET is_accepted = TRUE \
         WHERE id = $1 AND request_id = $2 RETURNING {}",
        RESPONSE_COLUMNS
    ))
    .bind(response_id)
    .bind(request_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "Response {} not found for help request {}",
            response_id, request_id
        ))
    })?;

    Ok(Json(HelpResponseEnvelope {
        success: true,
        response,
    }))
}
