use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Fixed sub-directory (under the base upload path and the upload URL) that holds award images.
pub const UPLOAD_DIR: &str = "awards";

/// Configuration for the award image upload subsystem
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Base upload path; permanent files live in `<upload_path>/awards` (default: "./public/uploads")
    pub upload_path: PathBuf,

    /// Directory where incoming files are staged before persistence
    pub staging_dir: PathBuf,

    /// Application base path prepended to public image URLs (default: "")
    pub relative_path: String,

    /// URL segment under which uploads are served (default: "/assets/uploads")
    pub upload_url: String,

    /// Route of the upload endpoint (default: "/api/awards/images")
    pub upload_route: String,

    /// Maximum request body size in bytes (default: 10 MB)
    pub max_file_size: usize,

    /// Timeout for a remote capability call; `None` waits indefinitely (default: 30s)
    pub remote_timeout: Option<Duration>,

    /// Fail the request when the staged file cannot be removed after a successful persist
    pub strict_staging_cleanup: bool,

    /// Staged files older than this are swept (default: 24)
    pub staging_cleanup_age_hours: u64,

    /// JWT secret used to authenticate the acting user
    pub jwt_secret: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_path: PathBuf::from("./public/uploads"),
            staging_dir: env::temp_dir().join("award-uploads"),
            relative_path: String::new(),
            upload_url: "/assets/uploads".to_string(),
            upload_route: "/api/awards/images".to_string(),
            max_file_size: 10 * 1024 * 1024, // 10 MB
            remote_timeout: Some(Duration::from_secs(30)),
            strict_staging_cleanup: false,
            staging_cleanup_age_hours: 24,
            jwt_secret: "secret".to_string(),
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            upload_path: env::var("UPLOAD_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.upload_path),

            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            relative_path: env::var("RELATIVE_PATH").unwrap_or(default.relative_path),

            upload_url: env::var("UPLOAD_URL").unwrap_or(default.upload_url),

            upload_route: env::var("UPLOAD_ROUTE").unwrap_or(default.upload_route),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            remote_timeout: match env::var("REMOTE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
            {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => default.remote_timeout,
            },

            strict_staging_cleanup: env::var("STRICT_STAGING_CLEANUP")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.strict_staging_cleanup),

            staging_cleanup_age_hours: env::var("STAGING_CLEANUP_AGE_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.staging_cleanup_age_hours),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),
        }
    }

    /// Config rooted in a scratch directory, used by tests and local runs
    pub fn development(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            upload_path: root.join("uploads"),
            staging_dir: root.join("staging"),
            remote_timeout: Some(Duration::from_secs(5)),
            ..Self::default()
        }
    }

    /// Directory holding persisted award images
    pub fn permanent_dir(&self) -> PathBuf {
        self.upload_path.join(UPLOAD_DIR)
    }
}
