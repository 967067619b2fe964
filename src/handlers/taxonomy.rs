// src/handlers/taxonomy.rs
//
// Categories and tags share every handler; the router picks the table by
// layering an `Extension<Taxonomy>` onto each group of routes.

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    extractors::{AppJson, AppPath, AppQuery},
    models::{
        recipe::Recipe,
        taxonomy::{SortOrder, Taxonomy, TaxonomyItem, TaxonomyListParams, TaxonomyRequest},
    },
    services::{
        pagination::{ListQuery, Pagination, paginate_and_count},
        recipes::find_owned_recipe,
    },
    state::AppState,
    utils::jwt::Claims,
};

fn not_found(taxonomy: Taxonomy) -> AppError {
    AppError::NotFound(format!("{} not found", taxonomy.label))
}

fn map_write_error(taxonomy: Taxonomy, e: sqlx::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::Conflict(format!("{} with this name already exists", taxonomy.label))
    } else {
        tracing::error!("Failed to write {}: {:?}", taxonomy.label, e);
        AppError::from(e)
    }
}

async fn find_item(
    pool: &SqlitePool,
    taxonomy: Taxonomy,
    id: i64,
) -> Result<TaxonomyItem, AppError> {
    let sql = format!("SELECT id, name, created_at FROM {} WHERE id = ?", taxonomy.table);
    sqlx::query_as::<_, TaxonomyItem>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(taxonomy))
}

/// List with optional `sort` (`name_asc`, `name_desc`, `created_asc`,
/// `created_desc`) and `limit`/`offset`.
pub async fn list(
    State(state): State<AppState>,
    Extension(taxonomy): Extension<Taxonomy>,
    AppQuery(params): AppQuery<TaxonomyListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = Pagination::parse(params.limit.as_deref(), params.offset.as_deref())?;
    let sort = SortOrder::parse(params.sort.as_deref());

    let query = ListQuery {
        select: "id, name, created_at",
        from: taxonomy.table,
        id_column: "id",
        filter: None,
        order_by: Some(sort.order_by()),
    };
    let page = paginate_and_count::<TaxonomyItem>(&state.pool, &query, page).await?;

    Ok(Json(json!({
        "message": format!("{} list retrieved", taxonomy.label),
        "data": page.data,
        "count": page.count,
    })))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(taxonomy): Extension<Taxonomy>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let item = find_item(&state.pool, taxonomy, id).await?;
    Ok(Json(json!({
        "message": format!("{} retrieved", taxonomy.label),
        "data": item,
    })))
}

/// Recipes carrying this category or tag.
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(taxonomy): Extension<Taxonomy>,
    AppPath(id): AppPath<i64>,
    AppQuery(params): AppQuery<TaxonomyListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = Pagination::parse(params.limit.as_deref(), params.offset.as_deref())?;
    find_item(&state.pool, taxonomy, id).await?;

    let from = format!(
        "recipes JOIN {} link ON link.recipe_id = recipes.id",
        taxonomy.join_table
    );
    let filter_column = format!("link.{}", taxonomy.join_column);
    let query = ListQuery {
        select: "recipes.id, recipes.title, recipes.body, recipes.user_id, \
                 recipes.created_at, recipes.updated_at",
        from: from.as_str(),
        id_column: "recipes.id",
        filter: Some((filter_column.as_str(), id)),
        order_by: Some("recipes.id ASC"),
    };
    let page = paginate_and_count::<Recipe>(&state.pool, &query, page).await?;

    Ok(Json(json!({
        "message": "recipes retrieved",
        "data": page.data,
        "count": page.count,
    })))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(taxonomy): Extension<Taxonomy>,
    AppJson(payload): AppJson<TaxonomyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.trimmed();
    payload.validate()?;

    let sql = format!(
        "INSERT INTO {} (name, created_at) VALUES (?, ?) RETURNING id",
        taxonomy.table
    );
    let id: i64 = sqlx::query_scalar(&sql)
        .bind(&payload.name)
        .bind(state.clock.now())
        .fetch_one(&state.pool)
        .await
        .map_err(|e| map_write_error(taxonomy, e))?;

    Ok(Json(json!({
        "message": format!("{} created", taxonomy.label),
        "id": id,
    })))
}

pub async fn rename(
    State(state): State<AppState>,
    Extension(taxonomy): Extension<Taxonomy>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<TaxonomyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.trimmed();
    payload.validate()?;

    let sql = format!("UPDATE {} SET name = ? WHERE id = ?", taxonomy.table);
    let updated = sqlx::query(&sql)
        .bind(&payload.name)
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| map_write_error(taxonomy, e))?
        .rows_affected();

    if updated == 0 {
        return Err(not_found(taxonomy));
    }

    Ok(Json(json!({ "message": format!("{} updated", taxonomy.label) })))
}

/// Clears the recipe associations and deletes the row in one transaction.
pub async fn delete(
    State(state): State<AppState>,
    Extension(taxonomy): Extension<Taxonomy>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = state.pool.begin().await?;

    let unlink = format!(
        "DELETE FROM {} WHERE {} = ?",
        taxonomy.join_table, taxonomy.join_column
    );
    sqlx::query(&unlink).bind(id).execute(&mut *tx).await?;

    let remove = format!("DELETE FROM {} WHERE id = ?", taxonomy.table);
    let deleted = sqlx::query(&remove)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(not_found(taxonomy));
    }

    tx.commit().await?;
    Ok(Json(json!({ "message": format!("{} deleted", taxonomy.label) })))
}

/// Attach to a recipe the caller owns. Attaching twice is a no-op.
pub async fn attach(
    State(state): State<AppState>,
    Extension(taxonomy): Extension<Taxonomy>,
    Extension(claims): Extension<Claims>,
    AppPath((recipe_id, item_id)): AppPath<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    find_owned_recipe(&state.pool, recipe_id, claims.sub).await?;
    find_item(&state.pool, taxonomy, item_id).await?;

    let sql = format!(
        "INSERT OR IGNORE INTO {} (recipe_id, {}) VALUES (?, ?)",
        taxonomy.join_table, taxonomy.join_column
    );
    sqlx::query(&sql)
        .bind(recipe_id)
        .bind(item_id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({
        "message": format!("{} attached to recipe", taxonomy.label),
    })))
}

pub async fn detach(
    State(state): State<AppState>,
    Extension(taxonomy): Extension<Taxonomy>,
    Extension(claims): Extension<Claims>,
    AppPath((recipe_id, item_id)): AppPath<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    find_owned_recipe(&state.pool, recipe_id, claims.sub).await?;

    let sql = format!(
        "DELETE FROM {} WHERE recipe_id = ? AND {} = ?",
        taxonomy.join_table, taxonomy.join_column
    );
    let removed = sqlx::query(&sql)
        .bind(recipe_id)
        .bind(item_id)
        .execute(&state.pool)
        .await?
        .rows_affected();

    if removed == 0 {
        return Err(AppError::NotFound(format!(
            "{} is not attached to this recipe",
            taxonomy.label
        )));
    }

    Ok(Json(json!({
        "message": format!("{} detached from recipe", taxonomy.label),
    })))
}
