// src/handlers/image.rs
//
// The same handlers serve `/user/{id}/image` and `/recipe/{id}/image`; the
// router layers the matching `Extension<EntityKind>` onto each.

use axum::{
    Extension, Json,
    body::Body,
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use tokio_util::io::ReaderStream;

use crate::{
    error::AppError,
    extractors::{AppMultipart, AppPath},
    models::image::EntityKind,
    services::{
        images::{ImageService, UploadedImage, entity_exists},
        recipes::find_owned_recipe,
    },
    state::AppState,
    utils::jwt::Claims,
};

/// Users manage their own profile image; recipe images belong to the
/// recipe's author.
async fn authorize(
    pool: &SqlitePool,
    kind: EntityKind,
    entity_id: i64,
    claims: &Claims,
) -> Result<(), AppError> {
    match kind {
        EntityKind::Recipe => {
            find_owned_recipe(pool, entity_id, claims.sub).await?;
        }
        EntityKind::User => {
            if !entity_exists(pool, kind, entity_id).await? {
                return Err(AppError::NotFound("user not found".to_string()));
            }
            if entity_id != claims.sub {
                return Err(AppError::not_owner());
            }
        }
    }
    Ok(())
}

/// First multipart field named `image`, if any.
async fn read_image_field(multipart: &mut Multipart) -> Result<Option<UploadedImage>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let data = field.bytes().await?.to_vec();
        return Ok(Some(UploadedImage { file_name, data }));
    }
    Ok(None)
}

pub async fn upload_image(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Extension(claims): Extension<Claims>,
    AppPath(entity_id): AppPath<i64>,
    AppMultipart(mut multipart): AppMultipart,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state.pool, kind, entity_id, &claims).await?;

    let file = read_image_field(&mut multipart).await?;
    let image = ImageService::from_state(&state)
        .upload(kind, entity_id, file)
        .await?;

    Ok(Json(json!({ "image": image })))
}

/// Streams the stored bytes back with the sniffed content type.
pub async fn serve_image(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    AppPath((entity_id, image_id)): AppPath<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let service = ImageService::from_state(&state);
    let image = service.find(kind, entity_id, image_id).await?;
    let reader = service.open(&image).await?;

    let headers = [
        (header::CONTENT_TYPE, image.mime_type),
        (header::CONTENT_LENGTH, image.size.to_string()),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(reader))))
}

pub async fn delete_image(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Extension(claims): Extension<Claims>,
    AppPath((entity_id, image_id)): AppPath<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state.pool, kind, entity_id, &claims).await?;

    ImageService::from_state(&state)
        .delete(kind, entity_id, image_id)
        .await?;

    Ok(Json(json!({ "message": "image deleted" })))
}
