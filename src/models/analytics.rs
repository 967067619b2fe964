use serde::Serialize;
use sqlx::FromRow;

/// Row of the top-rated ranking.
#[derive(Debug, Serialize, FromRow, PartialEq)]
pub struct TopRatedRecipe {
    pub recipe_id: i64,
    pub title: String,
    pub average: f64,
    pub total_votes: i64,
}

/// Row of the most-favorited ranking.
#[derive(Debug, Serialize, FromRow, PartialEq)]
pub struct PopularRecipe {
    pub id: i64,
    pub title: String,
    pub favorite_count: i64,
}
