use crate::models::{ImageDescriptor, StagedFile};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Image handed to a remote store: the staged descriptor plus a display `name`.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteImageUpload {
    #[serde(flatten)]
    pub descriptor: ImageDescriptor,
    pub name: String,
    /// Staged bytes to read from.
    #[serde(skip)]
    pub path: PathBuf,
}

impl RemoteImageUpload {
    pub fn from_staged(staged: &StagedFile) -> Self {
        Self {
            descriptor: ImageDescriptor::from_staged(staged),
            name: staged.original_name.clone(),
            path: staged.path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoteUploadRequest {
    pub image: RemoteImageUpload,
    pub uid: String,
}

/// What a remote store hands back. Anything besides `name` and `url` is merged
/// into the descriptor as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteImage {
    pub name: String,
    /// Fully qualified URL of the stored image.
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RemoteImage {
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = self.extra;
        fields.insert("name".to_string(), Value::String(self.name));
        fields.insert("url".to_string(), Value::String(self.url));
        fields
    }
}

/// An externally provided store that takes over persistence when registered.
#[async_trait]
pub trait RemoteImageStore: Send + Sync {
    /// Provider identifier (e.g., "s3")
    fn provider_id(&self) -> &'static str;

    async fn upload_image(&self, request: RemoteUploadRequest) -> Result<RemoteImage>;
}

/// Registration slot for the remote store.
///
/// Looked up at the start of every upload, so registering or unregistering
/// takes effect for the next request.
#[derive(Default)]
pub struct RemoteCapability {
    store: RwLock<Option<Arc<dyn RemoteImageStore>>>,
}

impl RemoteCapability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, store: Arc<dyn RemoteImageStore>) {
        tracing::info!("Remote image store registered: {}", store.provider_id());
        let mut slot = self.store.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(store);
    }

    pub fn unregister(&self) -> Option<Arc<dyn RemoteImageStore>> {
        let previous = self
            .store
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(store) = &previous {
            tracing::info!("Remote image store unregistered: {}", store.provider_id());
        }
        previous
    }

    pub fn current(&self) -> Option<Arc<dyn RemoteImageStore>> {
        self.store.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
