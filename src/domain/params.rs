use std::fmt;
use std::str::FromStr;

/// Output selector passed to the engine (`-otxt`, `-osrt`, ...). Also the
/// extension of the file the engine drops in its working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Txt,
    Srt,
    Vtt,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" => Ok(OutputFormat::Txt),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" => Ok(OutputFormat::Vtt),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unsupported output format: {}", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tuning knobs forwarded to the engine invocation.
#[derive(Debug, Clone)]
pub struct TranscriptionParams {
    pub language: String,
    pub model: String,
    pub output_format: OutputFormat,
    pub word_thold: Option<f32>,
    pub no_speech_thold: Option<f32>,
    pub prompt: Option<String>,
}

impl TranscriptionParams {
    pub fn new(language: String, model: String) -> Self {
        Self {
            language,
            model,
            output_format: OutputFormat::default(),
            word_thold: None,
            no_speech_thold: None,
            prompt: None,
        }
    }

    /// Label reported back to the caller, e.g. `whisper-base-fr`.
    pub fn model_label(&self) -> String {
        format!("whisper-{}-{}", self.model, self.language)
    }
}
