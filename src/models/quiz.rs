// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::question::CreateQuestionRequest;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub quiz_id: i64,
    pub quiz_name: String,
    pub user_id: i64,
    pub category_id: i64,
    pub difficulty_id: i64,
    pub question_count: i64,
    /// Suggested total duration in seconds.
    pub duration: i64,
    pub is_customizable: bool,
    pub created_at: Option<chrono::NaiveDateTime>,
}

/// A quiz row joined for listing: category/difficulty names, creator
/// username, like count, and whether the requesting user has liked it.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizSummary {
    pub quiz_id: i64,
    pub quiz_name: String,
    pub question_count: i64,
    pub duration: i64,
    pub is_customizable: bool,
    pub created_at: Option<chrono::NaiveDateTime>,
    pub category_name: String,
    pub difficulty: String,
    pub creator: String,
    pub likes: i64,
    pub user_has_liked: bool,
}

/// DTO for creating a quiz together with its questions and options.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Quiz name length must be between 1 and 100 characters."
    ))]
    pub quiz_name: String,

    pub category_id: i64,

    pub difficulty_id: i64,

    /// Suggested total duration in seconds.
    pub duration: Option<i64>,

    pub is_customizable: Option<bool>,

    #[validate(length(min = 1, message = "A quiz needs at least one question."), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

/// DTO for updating quiz metadata. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateQuizRequest {
    pub quiz_name: Option<String>,
    pub category_id: Option<i64>,
    pub difficulty_id: Option<i64>,
    pub duration: Option<i64>,
    pub is_customizable: Option<bool>,
}

/// Query parameters for the paginated quiz listing.
#[derive(Debug, Deserialize)]
pub struct QuizListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category_id: Option<i64>,
    pub difficulty_id: Option<i64>,
    /// Quiz name substring filter.
    pub search: Option<String>,
}
