//! Entity image core: upload, serve and delete attachments for users and recipes.
//!
//! Blobs are written before their row and deleted before their row, so a row
//! never outlives a successful delete and a failed insert never leaves a blob.

use std::path::Path;

use image::ImageFormat;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, is_unique_violation},
    models::image::{EntityKind, Image},
    state::AppState,
    storage::{BlobStore, BoxReader, StorageError},
    utils::clock::Clock,
};

/// Only the head of the upload is inspected for magic bytes.
const SNIFF_LEN: usize = 512;

/// An image file pulled out of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// Sniffs the content type of `data` and accepts only JPEG, PNG and WebP.
pub fn sniff_image_type(data: &[u8]) -> Result<&'static str, AppError> {
    let head = &data[..data.len().min(SNIFF_LEN)];
    match image::guess_format(head) {
        Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP)) => {
            Ok(format.to_mime_type())
        }
        Ok(format) => Err(AppError::BadRequest(format!(
            "unsupported image type {}; allowed: image/jpeg, image/png, image/webp",
            format.to_mime_type()
        ))),
        Err(_) => Err(AppError::BadRequest(
            "unsupported image type; allowed: image/jpeg, image/png, image/webp".to_string(),
        )),
    }
}

/// Extension for the stored blob, with its leading dot.
///
/// The uploaded filename wins when it carries a plain alphanumeric extension;
/// otherwise it is derived from the sniffed type.
pub fn choose_extension(file_name: Option<&str>, mime_type: &str) -> String {
    let from_name = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()));

    from_name.unwrap_or_else(|| {
        match mime_type {
            "image/png" => ".png",
            "image/webp" => ".webp",
            _ => ".jpg",
        }
        .to_string()
    })
}

/// Orchestrates image rows in the store and bytes in the blob backend.
pub struct ImageService<'a> {
    pool: &'a SqlitePool,
    blobs: &'a dyn BlobStore,
    clock: &'a dyn Clock,
    max_bytes: usize,
}

impl<'a> ImageService<'a> {
    pub fn new(
        pool: &'a SqlitePool,
        blobs: &'a dyn BlobStore,
        clock: &'a dyn Clock,
        max_bytes: usize,
    ) -> Self {
        Self {
            pool,
            blobs,
            clock,
            max_bytes,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(
            &state.pool,
            state.blobs.as_ref(),
            state.clock.as_ref(),
            state.config.max_upload_bytes,
        )
    }

    /// Validates and stores an upload, then records it.
    pub async fn upload(
        &self,
        kind: EntityKind,
        entity_id: i64,
        file: Option<UploadedImage>,
    ) -> Result<Image, AppError> {
        if !entity_exists(self.pool, kind, entity_id).await? {
            return Err(AppError::NotFound(format!("{kind} not found")));
        }

        if kind == EntityKind::User && self.count_for_entity(kind, entity_id).await? >= 1 {
            return Err(profile_image_exists(entity_id));
        }

        let file = file
            .filter(|f| !f.data.is_empty())
            .ok_or_else(|| AppError::BadRequest("image file is required".to_string()))?;

        if file.data.len() > self.max_bytes {
            return Err(AppError::BadRequest(format!(
                "image too large; the limit is {} bytes",
                self.max_bytes
            )));
        }

        let mime_type = sniff_image_type(&file.data)?;
        let ext = choose_extension(file.file_name.as_deref(), mime_type);
        let path = self.store_blob(kind, entity_id, &ext, &file.data).await?;

        let size = i64::try_from(file.data.len())
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        let inserted = sqlx::query_as::<_, Image>(
            r#"
            INSERT INTO images (entity_kind, entity_id, path, mime_type, size, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, entity_kind, entity_id, path, mime_type, size, created_at
            "#,
        )
        .bind(kind)
        .bind(entity_id)
        .bind(&path)
        .bind(mime_type)
        .bind(size)
        .bind(self.clock.now())
        .fetch_one(self.pool)
        .await;

        match inserted {
            Ok(image) => {
                tracing::info!(
                    kind = %kind,
                    entity_id,
                    image_id = image.id,
                    path = %image.path,
                    "image stored"
                );
                Ok(image)
            }
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&path).await {
                    tracing::warn!("Failed to remove orphaned blob {}: {}", path, cleanup);
                }
                if kind == EntityKind::User && is_unique_violation(&e) {
                    return Err(profile_image_exists(entity_id));
                }
                tracing::error!("Failed to record image {}: {:?}", path, e);
                Err(AppError::from(e))
            }
        }
    }

    /// Looks an image up by the full (kind, entity, id) triple.
    pub async fn find(
        &self,
        kind: EntityKind,
        entity_id: i64,
        image_id: i64,
    ) -> Result<Image, AppError> {
        sqlx::query_as::<_, Image>(
            r#"
            SELECT id, entity_kind, entity_id, path, mime_type, size, created_at
            FROM images
            WHERE id = ? AND entity_kind = ? AND entity_id = ?
            "#,
        )
        .bind(image_id)
        .bind(kind)
        .bind(entity_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("image not found".to_string()))
    }

    /// Opens the stored bytes of an image for streaming.
    pub async fn open(&self, image: &Image) -> Result<BoxReader, AppError> {
        Ok(self.blobs.open(&image.path).await?)
    }

    /// All images of one entity, oldest first.
    pub async fn list_for_entity(
        &self,
        kind: EntityKind,
        entity_id: i64,
    ) -> Result<Vec<Image>, AppError> {
        let images = sqlx::query_as::<_, Image>(
            r#"
            SELECT id, entity_kind, entity_id, path, mime_type, size, created_at
            FROM images
            WHERE entity_kind = ? AND entity_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(kind)
        .bind(entity_id)
        .fetch_all(self.pool)
        .await?;
        Ok(images)
    }

    /// Deletes the blob, then the row. If the blob cannot be removed the row
    /// is left in place and the error is returned.
    pub async fn delete(
        &self,
        kind: EntityKind,
        entity_id: i64,
        image_id: i64,
    ) -> Result<(), AppError> {
        let image = self.find(kind, entity_id, image_id).await?;

        self.blobs.delete(&image.path).await.map_err(|e| {
            AppError::InternalServerError(format!("failed to delete blob {}: {}", image.path, e))
        })?;

        sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(image.id)
            .execute(self.pool)
            .await?;

        tracing::info!(kind = %kind, entity_id, image_id, "image deleted");
        Ok(())
    }

    /// Removes every image of an entity: all blobs first, then all rows in
    /// one statement. Returns how many rows were removed.
    pub async fn delete_all_for_entity(
        &self,
        kind: EntityKind,
        entity_id: i64,
    ) -> Result<u64, AppError> {
        for image in self.list_for_entity(kind, entity_id).await? {
            self.blobs.delete(&image.path).await.map_err(|e| {
                AppError::InternalServerError(format!(
                    "failed to delete blob {}: {}",
                    image.path, e
                ))
            })?;
        }

        let removed = sqlx::query("DELETE FROM images WHERE entity_kind = ? AND entity_id = ?")
            .bind(kind)
            .bind(entity_id)
            .execute(self.pool)
            .await?
            .rows_affected();

        Ok(removed)
    }

    async fn count_for_entity(&self, kind: EntityKind, entity_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(id) FROM images WHERE entity_kind = ? AND entity_id = ?",
        )
        .bind(kind)
        .bind(entity_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Saves under `<kind>/<entity-id>/<ns-timestamp><ext>`, bumping the
    /// timestamp while the backend reports the path as taken.
    async fn store_blob(
        &self,
        kind: EntityKind,
        entity_id: i64,
        ext: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        let mut stamp = self
            .clock
            .now()
            .timestamp_nanos_opt()
            .ok_or_else(|| AppError::InternalServerError("clock out of range".to_string()))?;

        loop {
            let path = format!("{}/{}/{}{}", kind.as_str(), entity_id, stamp, ext);
            match self.blobs.save(&path, data).await {
                Ok(()) => return Ok(path),
                Err(StorageError::AlreadyExists(_)) => stamp += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn profile_image_exists(user_id: i64) -> AppError {
    AppError::BadRequest(format!(
        "a profile image already exists for user ID {user_id}"
    ))
}

/// Whether the row an image would attach to exists.
pub async fn entity_exists(
    pool: &SqlitePool,
    kind: EntityKind,
    entity_id: i64,
) -> Result<bool, sqlx::Error> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", kind.table());
    sqlx::query_scalar::<_, bool>(&sql)
        .bind(entity_id)
        .fetch_one(pool)
        .await
}
