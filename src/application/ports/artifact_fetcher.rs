use std::path::PathBuf;

use async_trait::async_trait;

use super::ProgressFn;

/// A downloaded audio artifact sitting in scratch storage. The caller owns
/// deletion of `path`.
#[derive(Debug)]
pub struct FetchedArtifact {
    pub path: PathBuf,
    pub bytes: u64,
}

#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Stream a remote resource to local scratch storage, enforcing
    /// `max_bytes`. Partial data is discarded on any failure. When a total
    /// size hint is available, `progress` receives values in the 10-20 band.
    async fn fetch(
        &self,
        url: &str,
        max_bytes: u64,
        progress: ProgressFn,
    ) -> Result<FetchedArtifact, DownloadError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("file exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
