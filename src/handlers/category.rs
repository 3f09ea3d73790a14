// src/handlers/category.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::category::{Category, CreateCategoryRequest},
};

/// Lists all categories ordered by name. Public.
/// Returns 204 when no categories exist yet.
pub async fn list_categories(State(pool): State<SqlitePool>) -> Result<Response, AppError> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT category_id, category_name, times_chosen
        FROM categories
        ORDER BY category_name ASC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch categories: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if categories.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(Json(categories).into_response())
}

/// Creates a new category. Staff only.
/// Category names are unique case-insensitively.
pub async fn create_category(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let trimmed_name = payload.category_name.trim().to_string();
    if trimmed_name.is_empty() {
        return Err(AppError::BadRequest("Invalid category_name".to_string()));
    }

    let existing: Option<(i64,)> = sqlx::query_as(
        "SELECT category_id FROM categories WHERE LOWER(category_name) = LOWER(?)",
    )
    .bind(&trimmed_name)
    .fetch_optional(&pool)
    .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Category already exists".to_string()));
    }

    let category_id: i64 = sqlx::query_scalar(
        "INSERT INTO categories (category_name) VALUES (?) RETURNING category_id",
    )
    .bind(&trimmed_name)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create category: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "category_id": category_id,
            "category_name": trimmed_name,
        })),
    ))
}

/// Renames a category by ID. Staff only.
pub async fn update_category(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let trimmed_name = payload.category_name.trim().to_string();
    if trimmed_name.is_empty() {
        return Err(AppError::BadRequest("Invalid category_name".to_string()));
    }

    let category: Option<(i64,)> =
        sqlx::query_as("SELECT category_id FROM categories WHERE category_id = ?")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

    if category.is_none() {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    let existing: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT category_id
        FROM categories
        WHERE LOWER(category_name) = LOWER(?) AND category_id != ?
        "#,
    )
    .bind(&trimmed_name)
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "Category name already exists".to_string(),
        ));
    }

    sqlx::query("UPDATE categories SET category_name = ? WHERE category_id = ?")
        .bind(&trimmed_name)
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update category: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(json!({
        "category_id": id,
        "category_name": trimmed_name,
    })))
}

/// Deletes a category by ID. Staff only.
/// A category referenced by any quiz cannot be deleted.
pub async fn delete_category(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let category: Option<(i64,)> =
        sqlx::query_as("SELECT category_id FROM categories WHERE category_id = ?")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

    if category.is_none() {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    let usage: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE category_id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await?;

    if usage > 0 {
        return Err(AppError::Conflict(
            "Category is in use and cannot be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM categories WHERE category_id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete category: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(json!({"message": "Category deleted successfully"})))
}
