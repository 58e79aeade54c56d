use crate::models::StagedFile;
use crate::services::error::UploadError;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

const FILENAME_PREFIX: &str = "award-";

/// Where an incoming file should be written before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingTarget {
    pub directory: PathBuf,
    pub filename: String,
    pub extension: String,
}

impl StagingTarget {
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}

/// Computes staging locations and generated filenames for incoming files.
#[derive(Debug, Clone)]
pub struct TemporaryStorageProvisioner {
    staging_dir: PathBuf,
}

impl TemporaryStorageProvisioner {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }

    /// `award-<uuid v4><original extension>` in the staging directory. Pure: nothing is written.
    pub fn provision(&self, original_name: &str) -> StagingTarget {
        let extension = original_extension(original_name);
        StagingTarget {
            directory: self.staging_dir.clone(),
            filename: format!("{}{}{}", FILENAME_PREFIX, Uuid::new_v4(), extension),
            extension,
        }
    }

    /// Streams an incoming body into the staging directory.
    ///
    /// A partially written file is removed before the error is returned.
    pub async fn write<R>(
        &self,
        original_name: &str,
        mime_type: &str,
        mut reader: R,
    ) -> Result<StagedFile, UploadError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let target = self.provision(original_name);
        let path = target.path();

        tokio::fs::create_dir_all(&target.directory)
            .await
            .map_err(UploadError::Staging)?;

        let result = async {
            let mut file = tokio::fs::File::create(&path).await?;
            let size = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            Ok::<u64, std::io::Error>(size)
        }
        .await;

        let size = match result {
            Ok(size) => size,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(
                        "Could not remove partial staged file {}: {}",
                        path.display(),
                        remove_err
                    );
                }
                return Err(UploadError::Staging(e));
            }
        };

        tracing::debug!(
            "Staged {} as {} ({} bytes)",
            original_name,
            target.filename,
            size
        );

        Ok(StagedFile {
            original_name: original_name.to_string(),
            filename: target.filename,
            extension: target.extension,
            mime_type: mime_type.to_string(),
            size,
            path,
        })
    }
}

/// Extension of `name` with its leading dot, or an empty string.
///
/// Only ASCII alphanumeric extensions are kept so the generated name stays a plain filename.
pub fn original_extension(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext)
        }
        _ => String::new(),
    }
}
