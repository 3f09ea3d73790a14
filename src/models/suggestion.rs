use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'suggestions' table: community quiz ideas with a
/// tri-state review status.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggestion_id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub status: String, // 'pending', 'approved', 'rejected'
    pub reviewer_id: Option<i64>,
    pub reviewed_at: Option<chrono::NaiveDateTime>,
    pub created_at: Option<chrono::NaiveDateTime>,
}

/// A suggestion joined with submitter and reviewer usernames for the
/// staff review screen.
#[derive(Debug, Serialize, FromRow)]
pub struct SuggestionWithNames {
    pub suggestion_id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub reviewer_id: Option<i64>,
    pub reviewed_at: Option<chrono::NaiveDateTime>,
    pub created_at: Option<chrono::NaiveDateTime>,
    pub username: Option<String>,
    pub reviewer_username: Option<String>,
}

/// DTO for submitting a suggestion.
///
/// Both fields are required; they are optional here only so the handler
/// can turn an absent field into a 400 instead of a deserialize failure.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSuggestionRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title length must be between 1 and 100 characters."
    ))]
    pub title: Option<String>,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "Description length must be between 1 and 2000 characters."
    ))]
    pub description: Option<String>,
}

/// DTO for reviewing a suggestion.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSuggestionStatusRequest {
    #[validate(custom(function = validate_status))]
    pub status: String,
}

/// Restricts the status to the three review states.
fn validate_status(status: &str) -> Result<(), validator::ValidationError> {
    match status {
        "pending" | "approved" | "rejected" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_status")),
    }
}
