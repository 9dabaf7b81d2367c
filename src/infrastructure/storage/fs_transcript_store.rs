use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{TranscriptStore, TranscriptStoreError};
use crate::domain::{JobId, OutputFormat};

/// Transcript files under a fixed output directory, named
/// `{audioBase}__{jobId}.{format}`. The only durable state the service
/// produces.
pub struct FsTranscriptStore {
    output_dir: PathBuf,
    retention: Duration,
}

impl FsTranscriptStore {
    pub fn new(output_dir: PathBuf, retention: Duration) -> Result<Self, TranscriptStoreError> {
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            retention,
        })
    }

    fn safe_path(&self, file_name: &str) -> Result<PathBuf, TranscriptStoreError> {
        let candidate = Path::new(file_name);
        let traversal = candidate
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if traversal || candidate.components().count() != 1 {
            return Err(TranscriptStoreError::InvalidName(file_name.to_string()));
        }
        Ok(self.output_dir.join(candidate))
    }
}

#[async_trait]
impl TranscriptStore for FsTranscriptStore {
    async fn persist(
        &self,
        base_name: &str,
        job_id: JobId,
        format: OutputFormat,
        text: &str,
    ) -> Result<String, TranscriptStoreError> {
        let file_name = format!("{}__{}.{}", base_name, job_id, format.as_str());
        let path = self.safe_path(&file_name)?;
        tokio::fs::write(&path, text).await?;
        tracing::info!(file = %file_name, bytes = text.len(), "Transcript persisted");
        Ok(file_name)
    }

    async fn open(&self, file_name: &str) -> Result<String, TranscriptStoreError> {
        let path = self.safe_path(file_name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TranscriptStoreError::NotFound(file_name.to_string()))
            }
            Err(e) => Err(TranscriptStoreError::Io(e)),
        }
    }

    async fn sweep_expired(&self) -> Result<usize, TranscriptStoreError> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.output_dir).await?;
        let now = std::time::SystemTime::now();

        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(_) => continue,
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age > self.retention {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(
                            path = %entry.path().display(),
                            error = %e,
                            "Failed to remove expired transcript"
                        );
                    }
                }
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path, retention: Duration) -> FsTranscriptStore {
        FsTranscriptStore::new(dir.to_path_buf(), retention).unwrap()
    }

    #[tokio::test]
    async fn persist_then_open_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), Duration::from_secs(3600));
        let job_id = JobId::new();

        let name = store
            .persist("episode-12", job_id, OutputFormat::Txt, "le transcript")
            .await
            .unwrap();

        assert_eq!(name, format!("episode-12__{}.txt", job_id));
        assert_eq!(store.open(&name).await.unwrap(), "le transcript");
    }

    #[tokio::test]
    async fn traversal_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), Duration::from_secs(3600));

        for name in ["../etc/passwd", "/etc/passwd", "a/b.txt", ".."] {
            let err = store.open(name).await.unwrap_err();
            assert!(
                matches!(err, TranscriptStoreError::InvalidName(_)),
                "{name} should be invalid"
            );
        }
    }

    #[tokio::test]
    async fn missing_transcript_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), Duration::from_secs(3600));
        let err = store.open("ghost__x.txt").await.unwrap_err();
        assert!(matches!(err, TranscriptStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), Duration::from_secs(0));
        let job_id = JobId::new();
        store
            .persist("old", job_id, OutputFormat::Txt, "texte")
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let removed = store.sweep_expired().await.unwrap();
        assert_eq!(removed, 1);

        let fresh = FsTranscriptStore::new(dir.path().to_path_buf(), Duration::from_secs(3600))
            .unwrap();
        fresh
            .persist("new", job_id, OutputFormat::Txt, "texte")
            .await
            .unwrap();
        assert_eq!(fresh.sweep_expired().await.unwrap(), 0);
    }
}
