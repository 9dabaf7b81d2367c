use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use super::ProgressFn;

/// A fully resolved engine invocation: program, arguments, working directory
/// and the output file the engine is expected to drop there.
#[derive(Debug, Clone)]
pub struct EngineInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub expected_output: PathBuf,
}

impl EngineInvocation {
    pub fn rendered(&self) -> String {
        format!("{} {}", self.program.display(), self.args.join(" "))
    }
}

/// Captured output of a successfully exited engine process.
#[derive(Debug)]
pub struct EngineOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

#[async_trait]
pub trait EngineRunner: Send + Sync {
    /// Launch and supervise the engine until exit or the hard timeout.
    /// `progress` receives estimates in the 25-90 band derived from the
    /// engine's diagnostic output.
    async fn run(
        &self,
        invocation: EngineInvocation,
        progress: ProgressFn,
    ) -> Result<EngineOutput, EngineError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to launch engine: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("engine exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
    #[error("engine exceeded the execution ceiling after {elapsed_secs}s")]
    Timeout { elapsed_secs: u64 },
}
