use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    extractors::{AppPath, AppQuery},
    models::{
        favorite::FavoriteRecipe, image::EntityKind, rating::Rating, recipe::Recipe, user::User,
    },
    services::{
        images::ImageService,
        pagination::{ListQuery, PaginationParams, paginate_and_count},
    },
    state::AppState,
};

async fn find_user(pool: &SqlitePool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))
}

/// Public profile of a user, with their profile image if they have one.
pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user(&state.pool, id).await?;
    let image = ImageService::from_state(&state)
        .list_for_entity(EntityKind::User, id)
        .await?
        .into_iter()
        .next();

    Ok(Json(json!({
        "message": "user retrieved",
        "data": { "user": user, "image": image },
    })))
}

/// Recipes written by the user.
pub async fn list_user_recipes(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.parse()?;
    find_user(&state.pool, id).await?;

    let query = ListQuery {
        select: "id, title, body, user_id, created_at, updated_at",
        from: "recipes",
        id_column: "id",
        filter: Some(("user_id", id)),
        order_by: Some("created_at DESC, id DESC"),
    };
    let page = paginate_and_count::<Recipe>(&state.pool, &query, page).await?;

    Ok(Json(json!({
        "message": "recipes retrieved",
        "data": page.data,
        "count": page.count,
    })))
}

/// Recipes the user has favorited, most recent first.
pub async fn list_user_favorites(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.parse()?;
    find_user(&state.pool, id).await?;

    let query = ListQuery {
        select: "favorites.id, favorites.recipe_id, recipes.title, favorites.created_at",
        from: "favorites JOIN recipes ON recipes.id = favorites.recipe_id",
        id_column: "favorites.id",
        filter: Some(("favorites.user_id", id)),
        order_by: Some("favorites.created_at DESC, favorites.id DESC"),
    };
    let page = paginate_and_count::<FavoriteRecipe>(&state.pool, &query, page).await?;

    Ok(Json(json!({
        "message": "favorites retrieved",
        "data": page.data,
        "count": page.count,
    })))
}

pub async fn list_user_ratings(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.parse()?;
    find_user(&state.pool, id).await?;

    let query = ListQuery {
        select: "id, user_id, recipe_id, score, created_at",
        from: "ratings",
        id_column: "id",
        filter: Some(("user_id", id)),
        order_by: Some("created_at DESC, id DESC"),
    };
    let page = paginate_and_count::<Rating>(&state.pool, &query, page).await?;

    Ok(Json(json!({
        "message": "ratings retrieved",
        "data": page.data,
        "count": page.count,
    })))
}
