//! Recipe write paths that span several tables.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    error::AppError,
    models::{
        image::EntityKind,
        ingredient::{Ingredient, IngredientInput},
        recipe::{Recipe, RecipeDetail, RecipePayload},
        taxonomy::{CATEGORIES, TAGS, Taxonomy, TaxonomyItem},
    },
    services::images::ImageService,
};

pub async fn find_recipe(pool: &SqlitePool, recipe_id: i64) -> Result<Recipe, AppError> {
    sqlx::query_as::<_, Recipe>(
        "SELECT id, title, body, user_id, created_at, updated_at FROM recipes WHERE id = ?",
    )
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("recipe not found".to_string()))
}

/// Loads the recipe and checks that `user_id` owns it.
pub async fn find_owned_recipe(
    pool: &SqlitePool,
    recipe_id: i64,
    user_id: i64,
) -> Result<Recipe, AppError> {
    let recipe = find_recipe(pool, recipe_id).await?;
    if recipe.user_id != user_id {
        return Err(AppError::not_owner());
    }
    Ok(recipe)
}

pub async fn list_ingredients(
    pool: &SqlitePool,
    recipe_id: i64,
) -> Result<Vec<Ingredient>, sqlx::Error> {
    sqlx::query_as::<_, Ingredient>(
        "SELECT id, name, amount, recipe_id FROM ingredients WHERE recipe_id = ? ORDER BY id ASC",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
}

async fn list_labels(
    pool: &SqlitePool,
    taxonomy: Taxonomy,
    recipe_id: i64,
) -> Result<Vec<TaxonomyItem>, sqlx::Error> {
    let sql = format!(
        "SELECT t.id, t.name, t.created_at FROM {table} t \
         JOIN {join} j ON j.{column} = t.id \
         WHERE j.recipe_id = ? ORDER BY t.name ASC, t.id ASC",
        table = taxonomy.table,
        join = taxonomy.join_table,
        column = taxonomy.join_column,
    );
    sqlx::query_as::<_, TaxonomyItem>(&sql)
        .bind(recipe_id)
        .fetch_all(pool)
        .await
}

/// The recipe with its ingredients, labels and images.
pub async fn load_detail(
    pool: &SqlitePool,
    images: &ImageService<'_>,
    recipe: Recipe,
) -> Result<RecipeDetail, AppError> {
    let ingredients = list_ingredients(pool, recipe.id).await?;
    let categories = list_labels(pool, CATEGORIES, recipe.id).await?;
    let tags = list_labels(pool, TAGS, recipe.id).await?;
    let images = images.list_for_entity(EntityKind::Recipe, recipe.id).await?;

    Ok(RecipeDetail {
        recipe,
        ingredients,
        categories,
        tags,
        images,
    })
}

async fn insert_ingredients(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    items: &[IngredientInput],
) -> Result<(), sqlx::Error> {
    for item in items {
        sqlx::query("INSERT INTO ingredients (name, amount, recipe_id) VALUES (?, ?, ?)")
            .bind(&item.name)
            .bind(&item.amount)
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Inserts a recipe and its ingredients in one transaction. Returns the new id.
pub async fn create_recipe(
    pool: &SqlitePool,
    user_id: i64,
    payload: &RecipePayload,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    let recipe_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO recipes (title, body, user_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.text)
    .bind(user_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    insert_ingredients(&mut tx, recipe_id, &payload.ingridient).await?;

    tx.commit().await?;
    Ok(recipe_id)
}

/// Saves title and text and replaces the whole ingredient list.
///
/// Runs in one transaction: if any ingredient fails to insert, neither the
/// recipe fields nor the old ingredient list change.
pub async fn update_recipe(
    pool: &SqlitePool,
    recipe_id: i64,
    payload: &RecipePayload,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query("UPDATE recipes SET title = ?, body = ?, updated_at = ? WHERE id = ?")
        .bind(&payload.title)
        .bind(&payload.text)
        .bind(now)
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound("recipe not found".to_string()));
    }

    sqlx::query("DELETE FROM ingredients WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

    if let Err(e) = insert_ingredients(&mut tx, recipe_id, &payload.ingridient).await {
        tracing::error!("Rolling back update of recipe {}: {:?}", recipe_id, e);
        return Err(e.into());
    }

    tx.commit().await?;
    Ok(())
}

/// Deletes a recipe and everything that hangs off it.
///
/// Images go first through the image core (blobs, then rows); the remaining
/// dependents and the recipe itself are removed in one transaction.
pub async fn delete_recipe(
    pool: &SqlitePool,
    images: &ImageService<'_>,
    recipe_id: i64,
) -> Result<(), AppError> {
    images
        .delete_all_for_entity(EntityKind::Recipe, recipe_id)
        .await?;

    let mut tx = pool.begin().await?;

    for sql in [
        "DELETE FROM ingredients WHERE recipe_id = ?",
        "DELETE FROM comments WHERE recipe_id = ?",
        "DELETE FROM ratings WHERE recipe_id = ?",
        "DELETE FROM favorites WHERE recipe_id = ?",
        "DELETE FROM recipe_categories WHERE recipe_id = ?",
        "DELETE FROM recipe_tags WHERE recipe_id = ?",
    ] {
        sqlx::query(sql).bind(recipe_id).execute(&mut *tx).await?;
    }

    let deleted = sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("recipe not found".to_string()));
    }

    tx.commit().await?;
    tracing::info!(recipe_id, "recipe deleted");
    Ok(())
}
