use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "urgency_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            other => Err(format!("Invalid urgency: {}", other)),
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "help_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HelpStatus {
    Open,
    InProgress,
    Resolved,
}

impl FromStr for HelpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(HelpStatus::Open),
            "in_progress" => Ok(HelpStatus::InProgress),
            "resolved" => Ok(HelpStatus::Resolved),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

/// Help request row. Responses hang off `help_responses`.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub course: Option<String>,
    pub subject: String,
    pub urgency: Urgency,
    pub status: HelpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Threaded answer to a help request. `is_accepted` is a plain flag;
/// "one accepted response per request" is not enforced.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HelpResponse {
    pub id: Uuid,
    pub request_id: Uuid,
    pub helper_id: Uuid,
    pub content: String,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestWithResponses {
    #[serde(flatten)]
    pub request: HelpRequest,
    pub responses: Vec<HelpResponse>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHelpRequest {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub course: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub subject: Option<String>,
    pub urgency: Option<String>,
    #[serde(default)]
    pub post_on_farcaster: bool,
    pub signer_uuid: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddHelpResponseRequest {
    pub helper_id: Option<Uuid>,
    #[validate(length(min = 1, max = 5000))]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHelpStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListHelpRequestsParams {
    pub status: Option<String>,
    pub course: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestResponse {
    pub success: bool,
    pub help_request: HelpRequestWithResponses,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestsResponse {
    pub success: bool,
    pub help_requests: Vec<HelpRequestWithResponses>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpResponseEnvelope {
    pub success: bool,
    pub response: HelpResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_parses_known_levels() {
        assert_eq!("high".parse::<Urgency>().unwrap(), Urgency::High);
        assert!("urgent".parse::<Urgency>().is_err());
    }

    #[test]
    fn status_parses_snake_case() {
        assert_eq!(
            "in_progress".parse::<HelpStatus>().unwrap(),
            HelpStatus::InProgress
        );
        assert!("in-progress".parse::<HelpStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&HelpStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
