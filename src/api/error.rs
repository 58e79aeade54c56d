use crate::services::error::UploadError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Upload(e) => match e {
                UploadError::MissingFile
                | UploadError::MissingEntityId
                | UploadError::InvalidReference(_) => StatusCode::BAD_REQUEST,
                UploadError::RemoteTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                UploadError::Staging(_)
                | UploadError::Persistence(_)
                | UploadError::StagingCleanup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Upload(e) => {
                if status.is_server_error() {
                    tracing::error!("Upload error: {:?}", e);
                }
                e.to_string()
            }
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::PayloadTooLarge(msg) => msg,
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
