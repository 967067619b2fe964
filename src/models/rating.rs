use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'ratings' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub recipe_id: i64,
    /// Always within 1..=5.
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

/// DTO for rating a recipe. The rater is the authenticated caller.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRatingRequest {
    #[validate(range(min = 1, message = "recipe_id must be a positive integer"))]
    pub recipe_id: i64,
    #[validate(range(min = 1, max = 5, message = "score must be between 1 and 5"))]
    pub score: i64,
}
