use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'categories' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub category_id: i64,
    pub category_name: String,
    /// How many quizzes have been created in this category.
    pub times_chosen: i64,
}

/// DTO for creating or renaming a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(
        min = 1,
        max = 50,
        message = "Category name length must be between 1 and 50 characters."
    ))]
    pub category_name: String,
}

/// Represents the 'difficulties' lookup table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Difficulty {
    pub difficulty_id: i64,
    pub name: String,
}
