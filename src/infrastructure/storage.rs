use crate::config::UploadConfig;
use crate::services::s3_store::S3ImageStore;
use aws_sdk_s3::config::Region;
use std::env;
use std::sync::Arc;
use tracing::info;

/// Creates the staging and permanent upload directories.
pub async fn prepare_directories(config: &UploadConfig) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&config.staging_dir).await?;
    tokio::fs::create_dir_all(config.permanent_dir()).await?;
    info!(
        "📁 Staging: {} | Uploads: {}",
        config.staging_dir.display(),
        config.permanent_dir().display()
    );
    Ok(())
}

/// Builds the S3 remote store when `S3_ENDPOINT`, `S3_ACCESS_KEY`,
/// `S3_SECRET_KEY`, `S3_BUCKET` and `S3_PUBLIC_URL` are all set.
pub async fn setup_remote_store() -> Option<Arc<S3ImageStore>> {
    let endpoint_url = env::var("S3_ENDPOINT").ok()?;
    let access_key = env::var("S3_ACCESS_KEY").ok()?;
    let secret_key = env::var("S3_SECRET_KEY").ok()?;
    let bucket = env::var("S3_BUCKET").ok()?;
    let public_url = env::var("S3_PUBLIC_URL").ok()?;
    let region = env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());

    info!("☁️  S3 image store: {} (Bucket: {})", endpoint_url, bucket);

    let aws_config = aws_config::from_env()
        .endpoint_url(&endpoint_url)
        .region(Region::new(region))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key, secret_key, None, None, "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    match s3_client.head_bucket().bucket(&bucket).send().await {
        Ok(_) => info!("✅ Bucket '{}' is ready", bucket),
        Err(e) => tracing::warn!("⚠️  Bucket '{}' is not reachable yet: {}", bucket, e),
    }

    Some(Arc::new(S3ImageStore::new(s3_client, bucket, public_url)))
}
