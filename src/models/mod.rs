use crate::utils::paths::{has_url_scheme, is_plain_filename};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

/// A file that finished uploading into the staging directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedFile {
    pub original_name: String,
    /// Generated `award-<uuid><ext>` name, reused as the permanent filename.
    pub filename: String,
    /// Original extension including the leading dot, or empty.
    pub extension: String,
    pub mime_type: String,
    pub size: u64,
    /// Location in the staging directory.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    Remote,
}

/// Durable reference produced by a persistence strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PersistedReference {
    Local { filename: String, path: PathBuf },
    Remote { name: String, url: String },
}

impl PersistedReference {
    pub fn storage_kind(&self) -> StorageKind {
        match self {
            PersistedReference::Local { .. } => StorageKind::Local,
            PersistedReference::Remote { .. } => StorageKind::Remote,
        }
    }

    /// The value an award stores as its image: the filename for local files,
    /// the fully qualified URL for remote ones.
    pub fn value(&self) -> &str {
        match self {
            PersistedReference::Local { filename, .. } => filename,
            PersistedReference::Remote { url, .. } => url,
        }
    }

    /// Rebuilds a reference from a value previously stored on an award.
    ///
    /// Values with a URL scheme are remote. Anything else must be a bare
    /// filename inside `permanent_dir`; other shapes yield `None`.
    pub fn from_stored(value: &str, permanent_dir: &Path) -> Option<Self> {
        if has_url_scheme(value) {
            let name = value
                .rsplit('/')
                .find(|segment| !segment.is_empty())
                .unwrap_or(value)
                .to_string();
            return Some(PersistedReference::Remote {
                name,
                url: value.to_string(),
            });
        }

        if !is_plain_filename(value) {
            return None;
        }

        Some(PersistedReference::Local {
            filename: value.to_string(),
            path: permanent_dir.join(value),
        })
    }
}

/// The descriptor returned to clients: staged fields merged with whatever the
/// persistence strategy added (`localPath`, or the remote `name`/`url` and extras).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageDescriptor(Map<String, Value>);

impl ImageDescriptor {
    pub fn from_staged(staged: &StagedFile) -> Self {
        match serde_json::to_value(staged) {
            Ok(Value::Object(fields)) => Self(fields),
            _ => Self::default(),
        }
    }

    /// Overwrites descriptor fields with `fields`; keys not present keep their value.
    pub fn merge(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            self.0.insert(key, value);
        }
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn url(&self) -> Option<&str> {
        self.get_str("url")
    }

    pub fn is_local(&self) -> bool {
        self.0.contains_key("localPath")
    }

    /// Filename for local files, URL for remote ones.
    pub fn final_destination(&self) -> Option<&str> {
        if self.is_local() {
            self.get_str("filename")
        } else {
            self.url()
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// What the file registry keeps per entity id.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredImage {
    pub staged: StagedFile,
    pub reference: PersistedReference,
    pub descriptor: ImageDescriptor,
}

impl RegisteredImage {
    pub fn storage_kind(&self) -> StorageKind {
        self.reference.storage_kind()
    }

    pub fn final_destination(&self) -> &str {
        self.reference.value()
    }
}

/// Body returned by the upload endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub entity_id: String,
    #[schema(value_type = Object)]
    pub file: ImageDescriptor,
    pub storage: StorageKind,
}
