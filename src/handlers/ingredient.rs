// src/handlers/ingredient.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    extractors::{AppJson, AppPath},
    models::ingredient::CreateIngredientRequest,
    services::recipes::find_owned_recipe,
    state::AppState,
    utils::jwt::Claims,
};

/// Add one ingredient to a recipe the caller owns.
pub async fn create_ingredient(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateIngredientRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    find_owned_recipe(&state.pool, payload.recipe_id, claims.sub).await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO ingredients (name, amount, recipe_id) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(&payload.name)
    .bind(&payload.amount)
    .bind(payload.recipe_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(json!({ "message": "ingredient created", "id": id })))
}

pub async fn delete_ingredient(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let recipe_id: i64 = sqlx::query_scalar("SELECT recipe_id FROM ingredients WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("ingredient not found".to_string()))?;

    find_owned_recipe(&state.pool, recipe_id, claims.sub).await?;

    sqlx::query("DELETE FROM ingredients WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "message": "ingredient deleted" })))
}
