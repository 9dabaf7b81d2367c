mod engine_command;
mod gate;
mod orchestrator;
mod progress;
mod resolver;

pub use engine_command::EngineCommand;
pub use gate::{ConcurrencyGate, GatePermit};
pub use orchestrator::{
    FinishedTranscription, JobSource, OrchestratorConfig, OrchestratorError,
    TranscriptionOrchestrator,
};
pub use progress::{EnginePhase, ProgressEstimator};
pub use resolver::{OutputResolutionError, resolve_transcript};
