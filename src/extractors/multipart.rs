use axum::extract::{FromRequest, Multipart, Request, multipart::MultipartRejection};

use crate::error::AppError;

/// `Multipart` whose rejections (wrong content type, missing boundary) come
/// back as `{"error": ...}` instead of plain text.
pub struct AppMultipart(pub Multipart);

impl<S> FromRequest<S> for AppMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(req, state)
            .await
            .map(AppMultipart)
            .map_err(|e: MultipartRejection| AppError::BadRequest(e.body_text()))
    }
}
