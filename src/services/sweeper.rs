use std::path::PathBuf;
use std::time::SystemTime;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

/// Removes staged files that outlived their request (e.g. after a crash mid-upload).
pub struct StagingSweeper {
    staging_dir: PathBuf,
    max_age: Duration,
    shutdown: watch::Receiver<bool>,
}

impl StagingSweeper {
    pub fn new(staging_dir: PathBuf, max_age_hours: u64, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            staging_dir,
            max_age: Duration::from_secs(max_age_hours.saturating_mul(3600)),
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("🚀 Staging sweeper started for {}", self.staging_dir.display());

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Staging sweeper shutting down");
                    break;
                }
                _ = sleep(Duration::from_secs(3600)) => {
                    let removed = self.sweep_once(SystemTime::now()).await;
                    tracing::info!("🧹 Staging sweep removed {} stale file(s)", removed);
                }
            }
        }
    }

    /// Deletes `award-*` files older than the configured age. Returns how many went.
    pub async fn sweep_once(&self, now: SystemTime) -> usize {
        let mut entries = match tokio::fs::read_dir(&self.staging_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Staging dir {} not readable: {}", self.staging_dir.display(), e);
                return 0;
            }
        };

        let mut removed = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with("award-") {
                continue;
            }

            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < self.max_age {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(
                    "Could not sweep staged file {}: {}",
                    entry.path().display(),
                    e
                ),
            }
        }

        removed
    }
}
