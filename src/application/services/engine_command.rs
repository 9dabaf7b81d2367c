use std::path::{Path, PathBuf};

use crate::application::ports::EngineInvocation;
use crate::domain::{OutputFormat, TranscriptionParams};

/// Builds `whisper-cli` invocations from an install directory and request
/// parameters. The argument shape is a fixed external contract; the working
/// directory is the install location so the engine's implicit output file
/// lands in a predictable place.
#[derive(Debug, Clone)]
pub struct EngineCommand {
    install_dir: PathBuf,
    default_model: String,
}

impl EngineCommand {
    pub fn new(install_dir: PathBuf, default_model: String) -> Self {
        Self {
            install_dir,
            default_model,
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn models_dir(&self) -> PathBuf {
        self.install_dir.join("models")
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Path of the requested model, falling back to the default when the
    /// requested one is not installed.
    pub fn model_path(&self, model: &str) -> PathBuf {
        let requested = self.models_dir().join(format!("ggml-{}.bin", model));
        if requested.exists() {
            requested
        } else {
            self.models_dir()
                .join(format!("ggml-{}.bin", self.default_model))
        }
    }

    pub fn invocation(&self, audio: &Path, params: &TranscriptionParams) -> EngineInvocation {
        let model_path = self.model_path(&params.model);
        let format = params.output_format;

        let mut args = vec![
            "-m".to_string(),
            model_path.display().to_string(),
            "-f".to_string(),
            audio.display().to_string(),
            "-l".to_string(),
            params.language.clone(),
            format!("-o{}", format.as_str()),
        ];
        if format == OutputFormat::Txt {
            args.push("--no-timestamps".to_string());
        }
        if let Some(wt) = params.word_thold {
            args.push("-wt".to_string());
            args.push(wt.to_string());
        }
        if let Some(nth) = params.no_speech_thold {
            args.push("-nth".to_string());
            args.push(nth.to_string());
        }
        if let Some(prompt) = &params.prompt {
            args.push("--prompt".to_string());
            args.push(prompt.clone());
        }

        let stem = audio
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let expected_output = self
            .install_dir
            .join(format!("{}.{}", stem, format.as_str()));

        EngineInvocation {
            program: self.install_dir.join("build/bin/whisper-cli"),
            args,
            working_dir: self.install_dir.clone(),
            expected_output,
        }
    }
}
