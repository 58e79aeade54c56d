use crate::config::UPLOAD_DIR;
use crate::services::remote::{RemoteImage, RemoteImageStore, RemoteUploadRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use serde_json::{Map, Value};

/// Remote image store backed by an S3-compatible bucket.
pub struct S3ImageStore {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3ImageStore {
    pub fn new(client: Client, bucket: String, public_url: String) -> Self {
        Self {
            client,
            bucket,
            public_url,
        }
    }

    pub fn object_key(filename: &str) -> String {
        format!("{}/{}", UPLOAD_DIR, filename)
    }

    pub fn object_url(public_url: &str, key: &str) -> String {
        format!("{}/{}", public_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl RemoteImageStore for S3ImageStore {
    fn provider_id(&self) -> &'static str {
        "s3"
    }

    async fn upload_image(&self, request: RemoteUploadRequest) -> Result<RemoteImage> {
        let filename = request
            .image
            .descriptor
            .get_str("filename")
            .context("staged image has no filename")?
            .to_string();
        let key = Self::object_key(&filename);

        let body = ByteStream::from_path(&request.image.path)
            .await
            .with_context(|| format!("reading staged file {}", request.image.path.display()))?;

        let mut put = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .metadata("uid", &request.uid);
        if let Some(mime_type) = request.image.descriptor.get_str("mimeType") {
            put = put.content_type(mime_type);
        }

        let output = put.send().await.map_err(|e| {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, error={:?}",
                self.bucket,
                key,
                e
            );
            e
        })?;

        let mut extra = Map::new();
        if let Some(etag) = output.e_tag() {
            extra.insert("etag".to_string(), Value::String(etag.to_string()));
        }

        Ok(RemoteImage {
            name: request.image.name,
            url: Self::object_url(&self.public_url, &key),
            extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_lives_under_award_dir() {
        assert_eq!(S3ImageStore::object_key("award-1.png"), "awards/award-1.png");
    }

    #[test]
    fn test_object_url_trims_trailing_slash() {
        assert_eq!(
            S3ImageStore::object_url("https://cdn.example.com/bucket/", "awards/award-1.png"),
            "https://cdn.example.com/bucket/awards/award-1.png"
        );
    }
}
