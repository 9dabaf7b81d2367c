use std::path::Path;

/// Resolve the final transcript after the engine exits.
///
/// Exactly one source is used, in priority order: the output file the engine
/// declared (read then deleted), else the captured stdout verbatim. The two
/// are never concatenated.
pub async fn resolve_transcript(
    expected_output: &Path,
    stdout: &str,
) -> Result<String, OutputResolutionError> {
    match tokio::fs::read_to_string(expected_output).await {
        Ok(contents) => {
            if let Err(e) = tokio::fs::remove_file(expected_output).await {
                tracing::warn!(
                    path = %expected_output.display(),
                    error = %e,
                    "Failed to remove engine output file after reading"
                );
            }
            Ok(contents.trim().to_string())
        }
        Err(_) => {
            let fallback = stdout.trim();
            if fallback.is_empty() {
                Err(OutputResolutionError::NotFound)
            } else {
                Ok(fallback.to_string())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OutputResolutionError {
    #[error("output file not found and stdout empty")]
    NotFound,
}
