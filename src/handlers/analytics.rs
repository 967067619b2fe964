use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{
    error::AppError,
    extractors::AppQuery,
    services::{pagination::PaginationParams, ranking},
    state::AppState,
};

/// Recipes by average rating. Answers a bare JSON array.
pub async fn top_rated(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.parse()?;
    let recipes = ranking::top_rated(&state.pool, page).await?;
    Ok(Json(recipes))
}

/// Recipes by favorite count.
pub async fn most_popular(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.parse()?;
    let recipes = ranking::most_popular(&state.pool, page).await?;
    Ok(Json(json!({ "recipes": recipes })))
}
