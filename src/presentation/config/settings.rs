use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub engine: EngineSettings,
    pub download: DownloadSettings,
    pub transcripts: TranscriptSettings,
    pub jobs: JobSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            server: ServerSettings {
                host: env_or("MURMURE_HOST", "0.0.0.0".to_string()),
                port: env_or("MURMURE_PORT", 8080),
            },
            engine: EngineSettings {
                install_dir: PathBuf::from(env_or(
                    "MURMURE_ENGINE_DIR",
                    "/opt/whisper.cpp".to_string(),
                )),
                default_model: env_or("MURMURE_DEFAULT_MODEL", "base".to_string()),
                default_language: env_or("MURMURE_DEFAULT_LANGUAGE", "fr".to_string()),
                hard_timeout_secs: env_or("MURMURE_HARD_TIMEOUT_SECS", 24 * 60 * 60),
                activity_timeout_secs: env_or("MURMURE_ACTIVITY_TIMEOUT_SECS", 300),
                heartbeat_secs: env_or("MURMURE_HEARTBEAT_SECS", 60),
                resource_sample_secs: env_or("MURMURE_RESOURCE_SAMPLE_SECS", 120),
                kill_grace_secs: env_or("MURMURE_KILL_GRACE_SECS", 10),
            },
            download: DownloadSettings {
                max_bytes: env_or("MURMURE_MAX_DOWNLOAD_BYTES", 100 * 1024 * 1024),
                request_timeout_secs: env_or("MURMURE_DOWNLOAD_TIMEOUT_SECS", 30),
                scratch_dir: PathBuf::from(env_or(
                    "MURMURE_SCRATCH_DIR",
                    std::env::temp_dir().join("murmure").display().to_string(),
                )),
            },
            transcripts: TranscriptSettings {
                output_dir: PathBuf::from(env_or(
                    "MURMURE_TRANSCRIPT_DIR",
                    "/var/log/whisper".to_string(),
                )),
                inline_limit: env_or("MURMURE_INLINE_LIMIT", 2000),
                retention_hours: env_or("MURMURE_TRANSCRIPT_RETENTION_HOURS", 24),
            },
            jobs: JobSettings {
                retention_hours: env_or("MURMURE_JOB_RETENTION_HOURS", 24),
            },
            logging: LoggingSettings {
                level: env_or("MURMURE_LOG_LEVEL", "info".to_string()),
                json: env_or("MURMURE_LOG_JSON", false),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    pub install_dir: PathBuf,
    pub default_model: String,
    pub default_language: String,
    pub hard_timeout_secs: u64,
    pub activity_timeout_secs: u64,
    pub heartbeat_secs: u64,
    pub resource_sample_secs: u64,
    pub kill_grace_secs: u64,
}

impl EngineSettings {
    pub fn hard_timeout(&self) -> Duration {
        Duration::from_secs(self.hard_timeout_secs)
    }

    pub fn default_model_path(&self) -> PathBuf {
        self.install_dir
            .join("models")
            .join(format!("ggml-{}.bin", self.default_model))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadSettings {
    pub max_bytes: u64,
    pub request_timeout_secs: u64,
    pub scratch_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptSettings {
    pub output_dir: PathBuf,
    pub inline_limit: usize,
    pub retention_hours: u64,
}

impl TranscriptSettings {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours * 3600)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobSettings {
    pub retention_hours: u64,
}

impl JobSettings {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours * 3600)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}
