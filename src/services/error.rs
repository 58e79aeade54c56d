use std::time::Duration;
use thiserror::Error;

/// Failures of the upload subsystem. Only the workflow and the HTTP layer turn
/// these into responses; cleanup failures on superseded files never get here.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Staging failed: {0}")]
    Staging(#[source] std::io::Error),

    #[error("No file provided")]
    MissingFile,

    #[error("Missing entity id header")]
    MissingEntityId,

    #[error("Invalid image reference: {0}")]
    InvalidReference(String),

    #[error("Persistence failed: {0}")]
    Persistence(#[source] anyhow::Error),

    #[error("Remote image store did not answer within {0:?}")]
    RemoteTimeout(Duration),

    #[error("Staged file cleanup failed: {0}")]
    StagingCleanup(#[source] std::io::Error),
}
