// src/handlers/question.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        question::UpdateQuestionRequest,
        user::{ROLE_ADMIN, ROLE_MANAGEMENT},
    },
    utils::jwt::Claims,
};

/// Loads a question together with the owning quiz's creator and checks
/// that the caller may edit it (quiz owner or staff).
async fn authorize_question_access(
    pool: &SqlitePool,
    claims: &Claims,
    question_id: i64,
) -> Result<(i64, i64), AppError> {
    let row: Option<(i64, i64, i64)> = sqlx::query_as(
        r#"
        SELECT q.question_id, q.quiz_id, quiz.user_id
        FROM questions q
        JOIN quizzes quiz ON quiz.quiz_id = q.quiz_id
        WHERE q.question_id = ?
        "#,
    )
    .bind(question_id)
    .fetch_optional(pool)
    .await?;

    let (_, quiz_id, owner_id) = row.ok_or(AppError::NotFound("Question not found".to_string()))?;

    let user_id = claims.sub.parse::<i64>().unwrap_or(0);
    let is_staff = claims.role_id == ROLE_ADMIN || claims.role_id == ROLE_MANAGEMENT;
    if owner_id != user_id && !is_staff {
        return Err(AppError::Forbidden(
            "You are not allowed to modify this question".to_string(),
        ));
    }

    Ok((quiz_id, owner_id))
}

/// Updates a question and/or its answer options.
///
/// When options are submitted, at least one of them must stay correct —
/// a question without a correct answer is unplayable.
pub async fn update_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<Response, AppError> {
    authorize_question_access(&pool, &claims, id).await?;

    if payload.question_text.is_none()
        && payload.question_type.is_none()
        && payload.position.is_none()
        && payload.time_limit.is_none()
        && payload.answers.is_none()
    {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    if let Some(answers) = &payload.answers {
        if !answers.iter().any(|a| a.is_correct) {
            return Err(AppError::BadRequest(
                "At least one answer must be correct".to_string(),
            ));
        }
    }

    let has_field_updates = payload.question_text.is_some()
        || payload.question_type.is_some()
        || payload.position.is_some()
        || payload.time_limit.is_some();

    let mut tx = pool.begin().await?;

    if has_field_updates {
        let mut builder: sqlx::QueryBuilder<sqlx::Sqlite> =
            sqlx::QueryBuilder::new("UPDATE questions SET ");
        let mut separated = builder.separated(", ");

        if let Some(question_text) = payload.question_text {
            separated.push("question_text = ");
            separated.push_bind_unseparated(question_text);
        }

        if let Some(question_type) = payload.question_type {
            separated.push("question_type = ");
            separated.push_bind_unseparated(question_type);
        }

        if let Some(position) = payload.position {
            separated.push("position = ");
            separated.push_bind_unseparated(position);
        }

        if let Some(time_limit) = payload.time_limit {
            separated.push("time_limit = ");
            separated.push_bind_unseparated(time_limit);
        }

        builder.push(" WHERE question_id = ");
        builder.push_bind(id);

        builder.build().execute(&mut *tx).await.map_err(|e| {
            tracing::error!("Failed to update question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;
    }

    if let Some(answers) = &payload.answers {
        for answer in answers {
            // The question_id guard keeps options of other questions out
            // of reach even if the client sends a foreign answer_id.
            sqlx::query(
                r#"
                UPDATE answer_options
                SET answer_text = ?, is_correct = ?
                WHERE answer_id = ? AND question_id = ?
                "#,
            )
            .bind(&answer.answer_text)
            .bind(answer.is_correct)
            .bind(answer.answer_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    Ok(Json(json!({"message": "Question updated successfully"})).into_response())
}

/// Deletes a question with its options and recorded attempt answers, and
/// keeps the owning quiz's question_count in step.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (quiz_id, _) = authorize_question_access(&pool, &claims, id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM attempt_answers WHERE question_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM answer_options WHERE question_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM questions WHERE question_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE quizzes SET question_count = MAX(0, question_count - 1) WHERE quiz_id = ?",
    )
    .bind(quiz_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to delete question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(json!({"message": "Question deleted successfully"})))
}
