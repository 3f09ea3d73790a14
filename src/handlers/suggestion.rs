// src/handlers/suggestion.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::suggestion::{
        CreateSuggestionRequest, SuggestionWithNames, UpdateSuggestionStatusRequest,
    },
    utils::{html::clean_text, jwt::Claims},
};

/// Submits a new quiz suggestion. Any authenticated user.
pub async fn create_suggestion(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSuggestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let (Some(title), Some(description)) = (&payload.title, &payload.description) else {
        return Err(AppError::BadRequest(
            "Title and description are required".to_string(),
        ));
    };

    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    // Free-form text shown back to staff and other users.
    let title = clean_text(title);
    let description = clean_text(description);

    let suggestion_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO suggestions (user_id, title, description)
        VALUES (?, ?, ?)
        RETURNING suggestion_id
        "#,
    )
    .bind(user_id)
    .bind(&title)
    .bind(&description)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to submit suggestion: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Suggestion submitted successfully",
            "suggestion_id": suggestion_id,
        })),
    ))
}

/// Lists all suggestions with submitter and reviewer usernames, newest
/// first. Staff only.
pub async fn list_suggestions(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let suggestions = sqlx::query_as::<_, SuggestionWithNames>(
        r#"
        SELECT s.suggestion_id, s.user_id, s.title, s.description, s.status,
               s.reviewer_id, s.reviewed_at, s.created_at,
               u1.username, u2.username AS reviewer_username
        FROM suggestions s
        LEFT JOIN users u1 ON s.user_id = u1.user_id
        LEFT JOIN users u2 ON s.reviewer_id = u2.user_id
        ORDER BY s.suggestion_id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch suggestions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(suggestions))
}

/// Reviews a suggestion. Staff only.
///
/// Approving or rejecting stamps the reviewer and timestamp; resetting
/// back to pending clears both.
pub async fn update_suggestion_status(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSuggestionStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let reviewer_id = claims.sub.parse::<i64>().unwrap_or(0);
    let is_reset = payload.status == "pending";

    let result = if is_reset {
        sqlx::query(
            r#"
            UPDATE suggestions
            SET status = ?, reviewed_at = NULL, reviewer_id = NULL
            WHERE suggestion_id = ?
            "#,
        )
        .bind(&payload.status)
        .bind(id)
        .execute(&pool)
        .await?
    } else {
        sqlx::query(
            r#"
            UPDATE suggestions
            SET status = ?, reviewed_at = CURRENT_TIMESTAMP, reviewer_id = ?
            WHERE suggestion_id = ?
            "#,
        )
        .bind(&payload.status)
        .bind(reviewer_id)
        .bind(id)
        .execute(&pool)
        .await?
    };

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Suggestion not found".to_string()));
    }

    Ok(Json(json!({
        "message": format!("Status updated to {}", payload.status),
        "status": payload.status,
    })))
}
