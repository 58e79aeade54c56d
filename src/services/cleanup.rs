use crate::models::{PersistedReference, RegisteredImage};
use crate::services::error::UploadError;
use crate::services::pipeline::{StepPolicy, settle};
use crate::services::registry::FileRegistry;
use std::path::PathBuf;
use std::sync::Arc;

/// Best-effort removal of superseded images and their registry entries.
pub struct CleanupCoordinator {
    registry: Arc<FileRegistry>,
    permanent_dir: PathBuf,
}

impl CleanupCoordinator {
    pub fn new(registry: Arc<FileRegistry>, permanent_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            permanent_dir: permanent_dir.into(),
        }
    }

    /// Unlinks a local file. Remote references are left alone since deleting
    /// them needs the remote store's own API. Never fails.
    pub async fn delete_stored_file(&self, reference: &PersistedReference) {
        match reference {
            PersistedReference::Remote { url, .. } => {
                tracing::debug!("Skipping delete of remote image {}", url);
            }
            PersistedReference::Local { path, .. } => {
                let result = tokio::fs::remove_file(path).await;
                if let Ok(Some(())) = settle(
                    &format!("Delete of {}", path.display()),
                    StepPolicy::BestEffort,
                    result,
                ) {
                    tracing::info!("🗑️  Deleted superseded image {}", path.display());
                }
            }
        }
    }

    /// Parses a value stored on an award (filename or URL) into a reference.
    pub fn resolve(&self, stored: &str) -> Result<PersistedReference, UploadError> {
        PersistedReference::from_stored(stored, &self.permanent_dir)
            .ok_or_else(|| UploadError::InvalidReference(stored.to_string()))
    }

    /// Deletes an image by the value stored on an award. Never fails.
    pub async fn delete_image(&self, stored: &str) {
        match self.resolve(stored) {
            Ok(reference) => self.delete_stored_file(&reference).await,
            Err(e) => tracing::warn!("Refusing to delete image: {}", e),
        }
    }

    /// Drops the previous image and the entity's registry entry, then returns
    /// the value to store for the new file. The new file must already be persisted.
    ///
    /// An unrecognised `previous_image` is rejected before anything is touched.
    pub async fn replace_file(
        &self,
        previous_image: Option<&str>,
        entity_id: &str,
        new_file: &RegisteredImage,
    ) -> Result<String, UploadError> {
        let previous = previous_image
            .filter(|p| !p.is_empty())
            .map(|p| self.resolve(p))
            .transpose()?;

        if let Some(reference) = previous {
            self.delete_stored_file(&reference).await;
        }

        self.registry.remove(entity_id);

        Ok(new_file.final_destination().to_string())
    }
}
