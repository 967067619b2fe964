// src/handlers/interaction.rs
//
// Comments, ratings and favorites: things a signed-in user attaches to
// someone's recipe.

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    extractors::{AppJson, AppPath},
    models::{
        comment::CreateCommentRequest, favorite::CreateFavoriteRequest,
        rating::CreateRatingRequest,
    },
    services::recipes::find_recipe,
    state::AppState,
    utils::jwt::Claims,
};

async fn ensure_user_exists(pool: &SqlitePool, user_id: i64) -> Result<(), AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(AppError::NotFound("user not found".to_string()));
    }
    Ok(())
}

/// Looks up who owns row `id` of `table`; 404 when the row is missing and
/// 403 when it is not the caller's.
async fn ensure_row_owner(
    pool: &SqlitePool,
    table: &str,
    label: &str,
    id: i64,
    user_id: i64,
) -> Result<(), AppError> {
    let sql = format!("SELECT user_id FROM {table} WHERE id = ?");
    let owner: Option<i64> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match owner {
        None => Err(AppError::NotFound(format!("{label} not found"))),
        Some(owner) if owner != user_id => Err(AppError::not_owner()),
        Some(_) => Ok(()),
    }
}

async fn delete_row(pool: &SqlitePool, table: &str, id: i64) -> Result<(), AppError> {
    let sql = format!("DELETE FROM {table} WHERE id = ?");
    sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(())
}

/// Create a new comment. The author is the caller.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    ensure_user_exists(&state.pool, claims.sub).await?;
    find_recipe(&state.pool, payload.recipe_id).await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO comments (title, description, user_id, recipe_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(claims.sub)
    .bind(payload.recipe_id)
    .bind(state.clock.now())
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create comment: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(json!({ "message": "comment created", "id": id })))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_row_owner(&state.pool, "comments", "comment", id, claims.sub).await?;
    delete_row(&state.pool, "comments", id).await?;
    Ok(Json(json!({ "message": "comment deleted" })))
}

/// Rate a recipe 1 to 5. The rater is the caller.
pub async fn create_rating(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateRatingRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    ensure_user_exists(&state.pool, claims.sub).await?;
    find_recipe(&state.pool, payload.recipe_id).await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO ratings (user_id, recipe_id, score, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(claims.sub)
    .bind(payload.recipe_id)
    .bind(payload.score)
    .bind(state.clock.now())
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(json!({ "message": "rating created", "id": id })))
}

pub async fn delete_rating(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_row_owner(&state.pool, "ratings", "rating", id, claims.sub).await?;
    delete_row(&state.pool, "ratings", id).await?;
    Ok(Json(json!({ "message": "rating deleted" })))
}

/// Add a recipe to the caller's favorites. Once per recipe.
pub async fn create_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateFavoriteRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    find_recipe(&state.pool, payload.recipe_id).await?;

    let duplicate = || AppError::Conflict("recipe is already in favorites".to_string());

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = ? AND recipe_id = ?)",
    )
    .bind(claims.sub)
    .bind(payload.recipe_id)
    .fetch_one(&state.pool)
    .await?;
    if exists {
        return Err(duplicate());
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO favorites (user_id, recipe_id, created_at) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(claims.sub)
    .bind(payload.recipe_id)
    .bind(state.clock.now())
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            duplicate()
        } else {
            AppError::from(e)
        }
    })?;

    Ok(Json(json!({ "message": "favorite added", "id": id })))
}

pub async fn delete_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_row_owner(&state.pool, "favorites", "favorite", id, claims.sub).await?;
    delete_row(&state.pool, "favorites", id).await?;
    Ok(Json(json!({ "message": "favorite removed" })))
}
