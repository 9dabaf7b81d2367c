mod error;
mod health;
mod models;
mod status;
mod transcribe;
mod transcribe_async;
mod transcribe_file;
mod transcriptions;

pub use health::health_handler;
pub use models::models_handler;
pub use status::transcription_status_handler;
pub use transcribe::transcribe_handler;
pub use transcribe_async::transcribe_async_handler;
pub use transcribe_file::transcribe_file_handler;
pub use transcriptions::transcription_file_handler;
