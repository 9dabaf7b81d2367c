mod settings;

pub use settings::{
    DownloadSettings, EngineSettings, JobSettings, LoggingSettings, ServerSettings, Settings,
    TranscriptSettings,
};
