//! Analytics rankings over ratings and favorites.

use sqlx::SqlitePool;

use crate::{
    models::analytics::{PopularRecipe, TopRatedRecipe},
    services::pagination::Pagination,
};

/// Recipes by average score, best first. Unrated recipes are left out.
pub async fn top_rated(
    pool: &SqlitePool,
    page: Pagination,
) -> Result<Vec<TopRatedRecipe>, sqlx::Error> {
    sqlx::query_as::<_, TopRatedRecipe>(
        r#"
        SELECT
            recipes.id AS recipe_id,
            recipes.title AS title,
            CAST(AVG(ratings.score) AS REAL) AS average,
            COUNT(ratings.id) AS total_votes
        FROM recipes
        JOIN ratings ON ratings.recipe_id = recipes.id
        GROUP BY recipes.id, recipes.title
        ORDER BY average DESC, recipes.id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await
}

/// Recipes by number of favorites, most first. Recipes nobody favorited
/// are included with a count of zero.
pub async fn most_popular(
    pool: &SqlitePool,
    page: Pagination,
) -> Result<Vec<PopularRecipe>, sqlx::Error> {
    sqlx::query_as::<_, PopularRecipe>(
        r#"
        SELECT
            recipes.id AS id,
            recipes.title AS title,
            COUNT(favorites.id) AS favorite_count
        FROM recipes
        LEFT JOIN favorites ON favorites.recipe_id = recipes.id
        GROUP BY recipes.id, recipes.title
        ORDER BY favorite_count DESC, recipes.id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await
}
