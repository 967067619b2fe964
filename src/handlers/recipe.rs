// src/handlers/recipe.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    extractors::{AppJson, AppPath, AppQuery},
    models::{comment::Comment, recipe::{Recipe, RecipePayload}},
    services::{
        images::ImageService,
        pagination::{ListQuery, PaginationParams, paginate_and_count},
        recipes,
    },
    state::AppState,
    utils::jwt::Claims,
};

const RECIPE_COLUMNS: &str = "id, title, body, user_id, created_at, updated_at";

/// List recipes, oldest first.
pub async fn list_recipes(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.parse()?;
    let query = ListQuery {
        select: RECIPE_COLUMNS,
        from: "recipes",
        id_column: "id",
        filter: None,
        order_by: Some("id ASC"),
    };
    let page = paginate_and_count::<Recipe>(&state.pool, &query, page).await?;

    Ok(Json(json!({
        "message": "recipes retrieved",
        "data": page.data,
        "count": page.count,
    })))
}

/// Get a single recipe with its ingredients, categories, tags and images.
pub async fn get_recipe(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = recipes::find_recipe(&state.pool, id).await?;
    let images = ImageService::from_state(&state);
    let detail = recipes::load_detail(&state.pool, &images, recipe).await?;

    Ok(Json(json!({ "message": "recipe retrieved", "data": detail })))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<RecipePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id = recipes::create_recipe(&state.pool, claims.sub, &payload, state.clock.now()).await?;
    tracing::info!(recipe_id = id, user_id = claims.sub, "recipe created");

    Ok(Json(json!({ "message": "recipe created", "id": id })))
}

/// Replace title, text and the whole ingredient list. Owner only.
pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<RecipePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    recipes::find_owned_recipe(&state.pool, id, claims.sub).await?;
    recipes::update_recipe(&state.pool, id, &payload, state.clock.now()).await?;

    Ok(Json(json!({ "message": "recipe updated" })))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    recipes::find_owned_recipe(&state.pool, id, claims.sub).await?;
    recipes::delete_recipe(&state.pool, &ImageService::from_state(&state), id).await?;

    Ok(Json(json!({ "message": "recipe deleted" })))
}

pub async fn list_ingredients(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    recipes::find_recipe(&state.pool, id).await?;
    let ingredients = recipes::list_ingredients(&state.pool, id).await?;

    Ok(Json(json!({ "message": "ingredients retrieved", "data": ingredients })))
}

pub async fn list_comments(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.parse()?;
    recipes::find_recipe(&state.pool, id).await?;

    let query = ListQuery {
        select: "id, title, description, user_id, recipe_id, created_at",
        from: "comments",
        id_column: "id",
        filter: Some(("recipe_id", id)),
        order_by: Some("created_at ASC, id ASC"),
    };
    let page = paginate_and_count::<Comment>(&state.pool, &query, page).await?;

    Ok(Json(json!({
        "message": "comments retrieved",
        "data": page.data,
        "count": page.count,
    })))
}
