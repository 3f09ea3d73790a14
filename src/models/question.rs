// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub question_id: i64,

    pub quiz_id: i64,

    /// The text content of the question.
    pub question_text: String,

    /// Question type: 'multiple' (multiple choice) or 'boolean' (true/false).
    pub question_type: String,

    /// Order of the question within its quiz.
    pub position: i64,

    /// Per-question time limit in seconds.
    pub time_limit: i64,
}

/// Represents the 'answer_options' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerOption {
    pub answer_id: i64,
    pub question_id: i64,
    pub answer_text: String,
    pub is_correct: bool,
}

/// Wire shape for playing a quiz: a question with its options attached.
#[derive(Debug, Serialize)]
pub struct QuestionWithAnswers {
    pub question_id: i64,
    pub question_text: String,
    pub time_limit: i64,
    #[serde(rename = "type")]
    pub question_type: String,
    pub answers: Vec<AnswerEntry>,
}

#[derive(Debug, Serialize)]
pub struct AnswerEntry {
    pub answer_id: i64,
    pub answer_text: String,
    pub is_correct: bool,
}

/// DTO for a new answer option inside quiz creation.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateAnswerRequest {
    #[validate(length(min = 1, max = 500))]
    pub answer_text: String,
    pub is_correct: bool,
}

/// DTO for a new question inside quiz creation.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question_text: String,

    #[validate(custom(function = validate_question_type))]
    pub question_type: String,

    pub position: Option<i64>,

    pub time_limit: Option<i64>,

    #[validate(nested, custom(function = validate_answers))]
    pub answers: Vec<CreateAnswerRequest>,
}

/// DTO for updating an existing answer option.
#[derive(Debug, Deserialize)]
pub struct UpdateAnswerRequest {
    pub answer_id: i64,
    pub answer_text: String,
    pub is_correct: bool,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub question_text: Option<String>,
    pub question_type: Option<String>,
    pub position: Option<i64>,
    pub time_limit: Option<i64>,
    pub answers: Option<Vec<UpdateAnswerRequest>>,
}

/// Restricts the question type to 'multiple' or 'boolean'.
fn validate_question_type(q_type: &str) -> Result<(), validator::ValidationError> {
    if q_type != "multiple" && q_type != "boolean" {
        return Err(validator::ValidationError::new("invalid_question_type"));
    }
    Ok(())
}

/// Every question needs at least one option, and at least one of them
/// must be marked correct.
fn validate_answers(answers: &[CreateAnswerRequest]) -> Result<(), validator::ValidationError> {
    if answers.is_empty() {
        return Err(validator::ValidationError::new("answers_cannot_be_empty"));
    }
    if !answers.iter().any(|a| a.is_correct) {
        return Err(validator::ValidationError::new(
            "at_least_one_answer_must_be_correct",
        ));
    }
    Ok(())
}
