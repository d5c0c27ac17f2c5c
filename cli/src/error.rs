use perf_monitor::MonitorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Monitor(#[from] MonitorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("File already exists: {path}")]
    AlreadyExists { path: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A run completed but its score is below the requested threshold
    #[error("Score {score:.1} is below the required {required:.1}")]
    BelowThreshold { score: f64, required: f64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Monitor(_) => 1,
            CliError::Io(_) => 2,
            CliError::Json(_) => 3,
            CliError::FileNotFound { .. } => 5,
            CliError::AlreadyExists { .. } => 6,
            CliError::InvalidArgument(_) => 64,
            CliError::BelowThreshold { .. } => 10,
            CliError::Other(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Format error for user-friendly display
pub fn format_error(error: &CliError) -> String {
    match error {
        CliError::Monitor(MonitorError::Config(e)) => {
            format!("Configuration Error: {}\n\nRun 'perfctl config check <path>' to inspect the file.", e)
        }
        CliError::FileNotFound { path } => {
            format!("File Not Found: {}\n\nPlease check that the file exists and is accessible.", path)
        }
        CliError::AlreadyExists { path } => {
            format!("File Already Exists: {}\n\nPass --force to overwrite it.", path)
        }
        CliError::Json(e) => {
            format!("Invalid JSON: {}\n\nSee 'perfctl validate --help' for the expected layout.", e)
        }
        _ => format!("Error: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perf_monitor::ConfigError;

    #[test]
    fn test_exit_codes() {
        let config = CliError::Monitor(MonitorError::Config(ConfigError::ValidationFailed {
            reason: "bad".to_string(),
        }));
        assert_eq!(config.exit_code(), 1);
        assert!(format_error(&config).contains("perfctl config check"));

        let below = CliError::BelowThreshold {
            score: 72.0,
            required: 90.0,
        };
        assert_eq!(below.exit_code(), 10);
        assert_eq!(below.to_string(), "Score 72.0 is below the required 90.0");
    }
}
