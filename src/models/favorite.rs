use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A favorite (unique per user and recipe) joined with the recipe title,
/// for the user's favorites listing.
#[derive(Debug, Serialize, FromRow)]
pub struct FavoriteRecipe {
    pub id: i64,
    pub recipe_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFavoriteRequest {
    #[validate(range(min = 1, message = "recipe_id must be a positive integer"))]
    pub recipe_id: i64,
}
