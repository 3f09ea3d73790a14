// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Static role ids, seeded by migration 0002.
pub const ROLE_ADMIN: i64 = 1;
pub const ROLE_MANAGEMENT: i64 = 2;
pub const ROLE_VERIFIED: i64 = 3;
pub const ROLE_REGULAR: i64 = 4;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,

    pub role_id: i64,

    /// Unique username.
    pub username: String,

    pub email: Option<String>,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    /// Whether a staff member has marked the account as verified.
    pub verified: bool,

    /// Dense 1-based position among all users, cached by rank recomputation.
    pub rank: i64,

    /// Cumulative score across all quiz attempts.
    pub total_score: i64,

    pub created_at: Option<chrono::NaiveDateTime>,
}

/// A user row joined with its role name, as served to staff listings.
#[derive(Debug, Serialize, FromRow)]
pub struct UserWithRole {
    pub user_id: i64,
    pub username: String,
    pub email: Option<String>,
    pub verified: bool,
    pub rank: i64,
    pub total_score: i64,
    pub role_id: i64,
    pub role_name: String,
}

/// A single leaderboard row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub total_score: i64,
    pub rank: i64,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,

    #[validate(email(message = "Invalid email address."))]
    pub email: Option<String>,

    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for staff creating a user (can specify role and verification).
#[derive(Debug, Deserialize, Validate)]
pub struct StaffCreateUserRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,

    #[validate(email(message = "Invalid email address."))]
    pub email: Option<String>,

    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,

    pub role_id: i64,

    pub verified: Option<bool>,
}

/// DTO for staff updating a user. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct StaffUpdateUserRequest {
    pub email: Option<String>,
    pub role_id: Option<i64>,
    pub verified: Option<bool>,
}

/// Query parameters for the paginated user listing.
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Username substring filter.
    pub search: Option<String>,
}

/// One row of the caller's attempt history.
#[derive(Debug, Serialize, FromRow)]
pub struct AttemptHistoryEntry {
    pub quiz_id: i64,
    pub quiz_name: String,
    pub score: i64,
    pub finished_at: Option<chrono::NaiveDateTime>,
}
