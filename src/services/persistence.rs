use crate::config::UploadConfig;
use crate::models::{ImageDescriptor, PersistedReference, StagedFile, StorageKind};
use crate::services::error::UploadError;
use crate::services::remote::{
    RemoteCapability, RemoteImageStore, RemoteImageUpload, RemoteUploadRequest,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a successful persist: the merged descriptor and the durable reference.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedImage {
    pub descriptor: ImageDescriptor,
    pub reference: PersistedReference,
}

/// Turns a staged file into a durable reference.
#[async_trait]
pub trait PersistenceStrategy: Send + Sync {
    fn kind(&self) -> StorageKind;

    /// `uid` is the acting user, forwarded to remote stores.
    async fn persist(&self, staged: &StagedFile, uid: &str) -> Result<PersistedImage, UploadError>;
}

/// Copies the staged bytes into the permanent upload directory.
pub struct LocalPersistence {
    permanent_dir: PathBuf,
}

impl LocalPersistence {
    pub fn new(permanent_dir: impl Into<PathBuf>) -> Self {
        Self {
            permanent_dir: permanent_dir.into(),
        }
    }
}

#[async_trait]
impl PersistenceStrategy for LocalPersistence {
    fn kind(&self) -> StorageKind {
        StorageKind::Local
    }

    async fn persist(&self, staged: &StagedFile, _uid: &str) -> Result<PersistedImage, UploadError> {
        let destination = self.permanent_dir.join(&staged.filename);

        tokio::fs::create_dir_all(&self.permanent_dir)
            .await
            .map_err(|e| UploadError::Persistence(e.into()))?;

        tokio::fs::copy(&staged.path, &destination)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Local copy failed: source={}, dest={}, error={}",
                    staged.path.display(),
                    destination.display(),
                    e
                );
                UploadError::Persistence(e.into())
            })?;

        let mut descriptor = ImageDescriptor::from_staged(staged);
        descriptor.insert("localPath", destination.to_string_lossy().into_owned());

        Ok(PersistedImage {
            descriptor,
            reference: PersistedReference::Local {
                filename: staged.filename.clone(),
                path: destination,
            },
        })
    }
}

/// Hands the staged file to a registered remote store.
pub struct RemotePersistence {
    store: Arc<dyn RemoteImageStore>,
    timeout: Option<Duration>,
}

impl RemotePersistence {
    pub fn new(store: Arc<dyn RemoteImageStore>, timeout: Option<Duration>) -> Self {
        Self { store, timeout }
    }
}

#[async_trait]
impl PersistenceStrategy for RemotePersistence {
    fn kind(&self) -> StorageKind {
        StorageKind::Remote
    }

    async fn persist(&self, staged: &StagedFile, uid: &str) -> Result<PersistedImage, UploadError> {
        let request = RemoteUploadRequest {
            image: RemoteImageUpload::from_staged(staged),
            uid: uid.to_string(),
        };

        let call = self.store.upload_image(request);
        let image = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| UploadError::RemoteTimeout(limit))?,
            None => call.await,
        }
        .map_err(UploadError::Persistence)?;

        let reference = PersistedReference::Remote {
            name: image.name.clone(),
            url: image.url.clone(),
        };

        let mut descriptor = ImageDescriptor::from_staged(staged);
        descriptor.merge(image.into_fields());

        Ok(PersistedImage {
            descriptor,
            reference,
        })
    }
}

/// Remote when a store is registered right now, local otherwise.
pub fn select_strategy(
    capability: &RemoteCapability,
    config: &UploadConfig,
) -> Box<dyn PersistenceStrategy> {
    match capability.current() {
        Some(store) => Box::new(RemotePersistence::new(store, config.remote_timeout)),
        None => Box::new(LocalPersistence::new(config.permanent_dir())),
    }
}
