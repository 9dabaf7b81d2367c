/// Configuration for tracing initialization.
pub struct TracingConfig {
    pub environment: String,
    pub default_level: String,
    pub json_format: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: std::env::var("MURMURE_ENV")
                .unwrap_or_else(|_| "development".to_string()),
            default_level: "info".to_string(),
            json_format: std::env::var("MURMURE_LOG_JSON")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
        }
    }
}
