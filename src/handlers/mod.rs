pub mod auth;
pub mod circles;
pub mod help_requests;
pub mod messages;
pub mod payments;
pub mod social;
pub mod study_groups;
pub mod users;

use uuid::Uuid;

use crate::errors::AppError;

/// Required string field: present and non-blank, or the create-route 400
pub(crate) fn required(value: &Option<String>) -> Result<&str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing required fields".to_string()))
}

pub(crate) fn required_id(value: Option<Uuid>) -> Result<Uuid, AppError> {
    value.ok_or_else(|| AppError::BadRequest("Missing required fields".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_count_as_missing() {
        assert!(required(&None).is_err());
        assert!(required(&Some("   ".to_string())).is_err());
        assert_eq!(required(&Some(" ok ".to_string())).unwrap(), "ok");
    }
}
