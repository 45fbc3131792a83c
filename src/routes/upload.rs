//! Multipart image upload.

use axum::extract::{Multipart, State};
use axum::response::Json;
use serde::Serialize;

use crate::routes::auth::AuthUser;
use crate::routes::error::ApiError;
use crate::services::upload::UploadError;
use crate::state::AppState;

const FIELD_NAME: &str = "image";

#[derive(Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// `POST /upload`: store the `image` field and return its content URL.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;

        let stored = state
            .uploads
            .upload(&bytes, file_name.as_deref(), content_type.as_deref())
            .await?;
        tracing::debug!(user_id = %auth.user_id, url = %stored.url, "image uploaded");
        return Ok(Json(UploadResponse { url: stored.url }));
    }
    Err(UploadError::Empty.into())
}
