// src/handlers/user.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{
        AttemptHistoryEntry, LeaderboardEntry, ROLE_ADMIN, StaffCreateUserRequest,
        StaffUpdateUserRequest, UserListParams, UserWithRole,
    },
    utils::{
        hash::hash_password,
        jwt::{Claims, optional_claims},
        ranking::recompute_user_ranks,
    },
};

/// Lists users with pagination and an optional username filter.
/// Staff only. Ordered by rank, best first.
pub async fn list_users(
    State(pool): State<SqlitePool>,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * limit;
    let search = params.search.map(|s| format!("%{}%", s));

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE (? IS NULL OR username LIKE ?)",
    )
    .bind(&search)
    .bind(&search)
    .fetch_one(&pool)
    .await?;

    let users = sqlx::query_as::<_, UserWithRole>(
        r#"
        SELECT u.user_id, u.username, u.email, u.verified, u.rank, u.total_score,
               r.role_id, r.name AS role_name
        FROM users u
        JOIN user_roles r ON r.role_id = u.role_id
        WHERE (? IS NULL OR u.username LIKE ?)
        ORDER BY u.rank ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&search)
    .bind(&search)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(json!({
        "data": users,
        "total": total,
        "page": page,
        "totalPages": (total + limit - 1) / limit,
    })))
}

/// Creates a new user with a specific role.
/// Staff only.
pub async fn create_user(
    State(pool): State<SqlitePool>,
    Json(payload): Json<StaffCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let role: Option<(i64,)> =
        sqlx::query_as("SELECT role_id FROM user_roles WHERE role_id = ?")
            .bind(payload.role_id)
            .fetch_optional(&pool)
            .await?;

    if role.is_none() {
        return Err(AppError::NotFound("Role not found".to_string()));
    }

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT user_id FROM users WHERE username = ? OR email = ?")
            .bind(&payload.username)
            .bind(&payload.email)
            .fetch_optional(&pool)
            .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (role_id, username, email, password_hash, verified, rank, total_score)
        VALUES (?, ?, ?, ?, ?, 0, 0)
        RETURNING user_id
        "#,
    )
    .bind(payload.role_id)
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(payload.verified.unwrap_or(false))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create user: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    recompute_user_ranks(&pool).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "User created successfully", "user_id": user_id})),
    ))
}

/// Retrieves a single user by username, joined with the role name.
/// Staff only.
pub async fn get_user(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, UserWithRole>(
        r#"
        SELECT u.user_id, u.username, u.email, u.verified, u.rank, u.total_score,
               r.role_id, r.name AS role_name
        FROM users u
        JOIN user_roles r ON r.role_id = u.role_id
        WHERE u.username = ?
        "#,
    )
    .bind(&username)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Updates a user's email, role or verification flag.
/// Staff only. A verification change is written to the audit log with the
/// performer's name.
pub async fn update_user(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
    Json(payload): Json<StaffUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let target: Option<(i64, bool)> =
        sqlx::query_as("SELECT user_id, verified FROM users WHERE username = ?")
            .bind(&username)
            .fetch_optional(&pool)
            .await?;

    let (target_id, was_verified) =
        target.ok_or(AppError::NotFound("User not found".to_string()))?;

    if payload.email.is_none() && payload.role_id.is_none() && payload.verified.is_none() {
        return Err(AppError::BadRequest(
            "No fields provided for update".to_string(),
        ));
    }

    let mut builder: sqlx::QueryBuilder<sqlx::Sqlite> = sqlx::QueryBuilder::new("UPDATE users SET ");
    let mut separated = builder.separated(", ");

    if let Some(email) = &payload.email {
        separated.push("email = ");
        separated.push_bind_unseparated(email);
    }

    if let Some(role_id) = payload.role_id {
        separated.push("role_id = ");
        separated.push_bind_unseparated(role_id);
    }

    if let Some(verified) = payload.verified {
        separated.push("verified = ");
        separated.push_bind_unseparated(verified);
    }

    builder.push(" WHERE user_id = ");
    builder.push_bind(target_id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update user: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // Verification flips are staff actions worth an audit trail entry.
    if let Some(verified) = payload.verified {
        if verified != was_verified {
            let action_type = if verified { "verified" } else { "unverified" };
            let action = format!(
                "{} made {} a {} user.",
                claims.username, username, action_type
            );

            sqlx::query(
                r#"
                INSERT INTO logs (action_performer, action, user_id, quiz_id)
                VALUES (?, ?, ?, NULL)
                "#,
            )
            .bind(&claims.username)
            .bind(&action)
            .bind(target_id)
            .execute(&pool)
            .await?;
        }
    }

    Ok(Json(json!({
        "message": "User updated successfully",
        "verified": payload.verified,
    })))
}

/// Deletes a user by username.
/// Staff only. Administrator accounts cannot be deleted, and nobody can
/// delete themselves.
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let target: Option<(i64, i64)> =
        sqlx::query_as("SELECT user_id, role_id FROM users WHERE username = ?")
            .bind(&username)
            .fetch_optional(&pool)
            .await?;

    let (target_id, target_role) =
        target.ok_or(AppError::NotFound("User not found".to_string()))?;

    let current_user_id = claims.sub.parse::<i64>().unwrap_or(0);
    if target_id == current_user_id {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    if target_role == ROLE_ADMIN {
        return Err(AppError::Forbidden(
            "Cannot delete administrator".to_string(),
        ));
    }

    sqlx::query("DELETE FROM users WHERE user_id = ?")
        .bind(target_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(json!({"message": "User deleted successfully"})))
}

/// Global leaderboard projection: top 10 users by stored rank, plus the
/// caller's own standing when they are authenticated and sit outside the
/// top 10. Public, read-only, idempotent.
pub async fn global_leaderboard(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let top10 = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT user_id, username, total_score, rank
        FROM users
        WHERE rank > 0
        ORDER BY rank ASC
        LIMIT 10
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let mut current_user: Option<LeaderboardEntry> = None;
    if let Some(claims) = optional_claims(&headers, &config.jwt_secret) {
        let user_id = claims.sub.parse::<i64>().unwrap_or(0);
        let row = sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT user_id, username, total_score, rank FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&pool)
        .await?;

        // Already visible in the top 10: no separate row needed.
        current_user = row.filter(|r| r.rank > 10);
    }

    Ok(Json(json!({
        "top10": top10,
        "currentUser": current_user,
    })))
}

/// The caller's own attempt history with aggregate totals.
pub async fn my_stats(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let attempts = sqlx::query_as::<_, AttemptHistoryEntry>(
        r#"
        SELECT q.quiz_id, q.quiz_name, a.score, a.finished_at
        FROM quiz_attempts a
        JOIN quizzes q ON q.quiz_id = a.quiz_id
        WHERE a.user_id = ?
        ORDER BY a.finished_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let total_attempts = attempts.len();
    let total_points: i64 = attempts.iter().map(|a| a.score).sum();

    Ok(Json(json!({
        "attempts": attempts,
        "total_attempts": total_attempts,
        "total_points": total_points,
    })))
}
