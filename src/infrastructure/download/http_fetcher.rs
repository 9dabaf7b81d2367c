use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{ArtifactFetcher, DownloadError, FetchedArtifact, ProgressFn};

// Download progress occupies this band of the overall job scale; it is the
// only phase with a reliable signal.
const BAND_START: u8 = 10;
const BAND_END: u8 = 20;

/// Streams remote audio to a scratch file under a byte cap. Partial data is
/// removed on every failure path.
pub struct HttpArtifactFetcher {
    client: reqwest::Client,
    scratch_dir: PathBuf,
}

impl HttpArtifactFetcher {
    pub fn new(scratch_dir: PathBuf, request_timeout: Duration) -> Result<Self, DownloadError> {
        std::fs::create_dir_all(&scratch_dir)?;
        let client = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .build()
            .map_err(|e| DownloadError::Request(e.to_string()))?;
        Ok(Self {
            client,
            scratch_dir,
        })
    }
}

#[async_trait]
impl ArtifactFetcher for HttpArtifactFetcher {
    async fn fetch(
        &self,
        url: &str,
        max_bytes: u64,
        progress: ProgressFn,
    ) -> Result<FetchedArtifact, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DownloadError::Status(response.status().as_u16()));
        }

        let total_hint = response.content_length().filter(|len| *len > 0);
        let path = self
            .scratch_dir
            .join(format!("{}.mp3", uuid::Uuid::new_v4()));

        let result = write_stream(response, &path, max_bytes, total_hint, progress).await;
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to discard partial download");
                }
            }
        }

        let bytes = result?;
        Ok(FetchedArtifact { path, bytes })
    }
}

async fn write_stream(
    response: reqwest::Response,
    path: &std::path::Path,
    max_bytes: u64,
    total_hint: Option<u64>,
    progress: ProgressFn,
) -> Result<u64, DownloadError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::Request(e.to_string()))?;
        written += chunk.len() as u64;
        if written > max_bytes {
            return Err(DownloadError::TooLarge { limit: max_bytes });
        }
        file.write_all(&chunk).await?;

        if let Some(total) = total_hint {
            let ratio = (written as f64 / total as f64).min(1.0);
            let band = f64::from(BAND_END - BAND_START);
            progress(BAND_START + (ratio * band) as u8);
        }
    }

    file.flush().await?;
    Ok(written)
}
