use crate::config::UploadConfig;
use crate::models::{RegisteredImage, StagedFile, UploadResponse};
use crate::services::error::UploadError;
use crate::services::persistence::select_strategy;
use crate::services::pipeline::{StepPolicy, settle};
use crate::services::registry::FileRegistry;
use crate::services::remote::RemoteCapability;
use crate::services::staging::TemporaryStorageProvisioner;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Per-request coordinator: stage, persist, drop the staged copy, register, respond.
pub struct UploadService {
    config: UploadConfig,
    provisioner: TemporaryStorageProvisioner,
    capability: Arc<RemoteCapability>,
    registry: Arc<FileRegistry>,
}

impl UploadService {
    pub fn new(
        config: UploadConfig,
        capability: Arc<RemoteCapability>,
        registry: Arc<FileRegistry>,
    ) -> Self {
        Self {
            provisioner: TemporaryStorageProvisioner::new(config.staging_dir.clone()),
            config,
            capability,
            registry,
        }
    }

    /// Writes an incoming body into the staging directory.
    pub async fn stage<R>(
        &self,
        original_name: &str,
        mime_type: &str,
        reader: R,
    ) -> Result<StagedFile, UploadError>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.provisioner.write(original_name, mime_type, reader).await
    }

    /// Persists a staged file for `entity_id` on behalf of user `uid`.
    ///
    /// The strategy is chosen from the remote registration at call time. The
    /// staged copy is always removed afterwards; a removal failure after a
    /// successful persist only fails the request with `strict_staging_cleanup`.
    /// Nothing is registered unless the whole pipeline succeeds.
    pub async fn complete_upload(
        &self,
        entity_id: &str,
        uid: &str,
        staged: StagedFile,
    ) -> Result<UploadResponse, UploadError> {
        let strategy = select_strategy(&self.capability, &self.config);
        tracing::info!(
            "Persisting {} for entity {} via {:?} storage",
            staged.filename,
            entity_id,
            strategy.kind()
        );

        let persisted = strategy.persist(&staged, uid).await;
        let removal = tokio::fs::remove_file(&staged.path)
            .await
            .map_err(UploadError::StagingCleanup);

        let persisted = match persisted {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::error!("❌ Persisting {} failed: {}", staged.filename, e);
                settle("Staged file cleanup", StepPolicy::BestEffort, removal)?;
                return Err(e);
            }
        };

        let policy = if self.config.strict_staging_cleanup {
            StepPolicy::Fatal
        } else {
            StepPolicy::BestEffort
        };
        settle("Staged file cleanup", policy, removal)?;

        let storage = persisted.reference.storage_kind();
        let file = persisted.descriptor.clone();

        if self
            .registry
            .put(
                entity_id,
                RegisteredImage {
                    staged,
                    reference: persisted.reference,
                    descriptor: persisted.descriptor,
                },
            )
            .is_some()
        {
            tracing::debug!("Replaced pending upload for entity {}", entity_id);
        }

        tracing::info!("✅ Stored image for entity {} ({:?})", entity_id, storage);

        Ok(UploadResponse {
            entity_id: entity_id.to_string(),
            file,
            storage,
        })
    }
}
