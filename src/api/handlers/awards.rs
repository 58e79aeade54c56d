use crate::api::error::AppError;
use crate::models::{StagedFile, UploadResponse};
use crate::services::error::UploadError;
use crate::utils::auth::Claims;
use crate::utils::paths::get_image_url;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use super::types::*;

/// Header carrying the id of the award the image belongs to.
pub const ENTITY_ID_HEADER: &str = "x-award-entity-id";

/// Multipart field holding the image.
pub const IMAGE_FIELD: &str = "award";

fn entity_id_from(headers: &HeaderMap) -> Result<String, UploadError> {
    headers
        .get(ENTITY_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(UploadError::MissingEntityId)
}

#[utoipa::path(
    post,
    path = "/api/awards/images",
    request_body(content = Multipart, description = "Single image in the `award` field"),
    params(
        ("x-award-entity-id" = String, Header, description = "Award the image belongs to")
    ),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing entity id or file"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Persistence failed"),
        (status = 504, description = "Remote store timed out")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "awards"
)]
pub async fn upload_image(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut staged: Option<StagedFile> = None;

    let result: Result<String, AppError> = async {
        let entity_id = entity_id_from(&headers)?;
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("length limit exceeded") {
                AppError::PayloadTooLarge(
                    "Request body exceeds the maximum allowed limit".to_string(),
                )
            } else {
                AppError::BadRequest(err_msg)
            }
        })? {
            if field.name() != Some(IMAGE_FIELD) || staged.is_some() {
                continue;
            }

            let original_name = field.file_name().unwrap_or("unnamed").to_string();
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();

            let reader = StreamReader::new(field.map_err(std::io::Error::other));
            staged = Some(
                state
                    .upload_service
                    .stage(&original_name, &mime_type, reader)
                    .await?,
            );
        }
        Ok(entity_id)
    }
    .await;

    let entity_id = match result {
        Ok(entity_id) => entity_id,
        Err(e) => {
            // Drain the rest of the body so the client sees our error instead of a reset.
            tracing::warn!("Upload failed early: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            if let Some(staged) = staged {
                if let Err(remove_err) = tokio::fs::remove_file(&staged.path).await {
                    tracing::warn!(
                        "Could not remove staged file {}: {}",
                        staged.path.display(),
                        remove_err
                    );
                }
            }
            return Err(e);
        }
    };

    let staged = staged.ok_or(UploadError::MissingFile)?;
    let response = state
        .upload_service
        .complete_upload(&entity_id, &claims.sub, staged)
        .await?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/awards/images/{entity_id}",
    params(
        ("entity_id" = String, Path, description = "Award entity id")
    ),
    responses(
        (status = 200, description = "Pending upload for the entity", body = UploadResponse),
        (status = 404, description = "No pending upload")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "awards"
)]
pub async fn get_image(
    State(state): State<crate::AppState>,
    Path(entity_id): Path<String>,
) -> Result<Json<UploadResponse>, AppError> {
    let entry = state
        .registry
        .get(&entity_id)
        .ok_or_else(|| AppError::NotFound(format!("No pending upload for {}", entity_id)))?;

    Ok(Json(UploadResponse {
        storage: entry.storage_kind(),
        file: entry.descriptor,
        entity_id,
    }))
}

#[utoipa::path(
    post,
    path = "/api/awards/images/{entity_id}/replace",
    request_body = ReplaceImageRequest,
    params(
        ("entity_id" = String, Path, description = "Award entity id")
    ),
    responses(
        (status = 200, description = "Upload finalized", body = ReplaceImageResponse),
        (status = 400, description = "Invalid previous image"),
        (status = 404, description = "No pending upload")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "awards"
)]
pub async fn replace_image(
    State(state): State<crate::AppState>,
    Path(entity_id): Path<String>,
    Json(req): Json<ReplaceImageRequest>,
) -> Result<Json<ReplaceImageResponse>, AppError> {
    let entry = state
        .registry
        .get(&entity_id)
        .ok_or_else(|| AppError::NotFound(format!("No pending upload for {}", entity_id)))?;

    let destination = state
        .cleanup
        .replace_file(req.previous_image.as_deref(), &entity_id, &entry)
        .await?;

    Ok(Json(ReplaceImageResponse {
        url: get_image_url(&state.config, &destination),
        destination,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/awards/images",
    params(ImageQuery),
    responses(
        (status = 204, description = "Delete attempted")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "awards"
)]
pub async fn delete_image(
    State(state): State<crate::AppState>,
    Query(query): Query<ImageQuery>,
) -> StatusCode {
    state.cleanup.delete_image(&query.image).await;
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    get,
    path = "/api/awards/images",
    params(ImageQuery),
    responses(
        (status = 200, description = "Public URL of a stored image", body = ImageUrlResponse)
    ),
    security(
        ("jwt" = [])
    ),
    tag = "awards"
)]
pub async fn image_url(
    State(state): State<crate::AppState>,
    Query(query): Query<ImageQuery>,
) -> Json<ImageUrlResponse> {
    Json(ImageUrlResponse {
        url: get_image_url(&state.config, &query.image),
    })
}
