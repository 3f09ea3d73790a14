// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'quiz_attempts' table: one row per submission event.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub attempt_id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub score: i64,
    pub started_at: Option<chrono::NaiveDateTime>,
    pub finished_at: Option<chrono::NaiveDateTime>,
}

/// One answer the user gave within an attempt, kept for per-question
/// analytics.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttemptAnswer {
    pub attempt_answer_id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub answer_id: i64,
    pub is_correct: bool,
    pub time_taken: Option<i64>,
}

/// DTO for submitting quiz answers.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub answer_id: i64,
    /// Seconds the player spent on this question, when the client tracks it.
    pub time_taken: Option<i64>,
}

/// A per-quiz leaderboard row; rank is computed live by the query.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuizLeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub score: i64,
    pub rank: i64,
}
