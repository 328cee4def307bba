use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Invalid recording target: {0}")]
    InvalidTarget(String),

    #[error("Recording target unavailable: {0}")]
    TargetUnavailable(String),

    #[error("Artifact capture failed: {0}")]
    CaptureFailed(String),

    #[error("Step store is sealed")]
    StoreSealed,

    #[error("Step index {index} out of range (recorded steps: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording available")]
    NoRecording,

    #[error("Recording still in progress")]
    RecordingInProgress,

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("General error: {0}")]
    General(String),
}

impl RecorderError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidTarget(_) => vec![
                "Ensure URL includes protocol (http:// or https://)".into(),
                "Check for typos in the URL".into(),
            ],
            Self::TargetUnavailable(_) | Self::LaunchFailed(_) => vec![
                "Ensure Chrome/Chromium is installed".into(),
                "Try specifying Chrome path with --chrome-path".into(),
                "Check that the page is not blocked by a popup blocker".into(),
            ],
            Self::UnsupportedDialect(_) => vec![
                "List supported dialects with: testpilot dialects".into(),
                "Set a default with [output] dialect in config.toml".into(),
            ],
            Self::AlreadyRecording => {
                vec!["Stop the current recording before starting a new one".into()]
            }
            Self::NoRecording => vec!["Record a session first with: testpilot record <url>".into()],
            Self::IndexOutOfRange { len, .. } => {
                vec![format!("Choose a step between 0 and {}", len.saturating_sub(1))]
            }
            Self::ConfigError(_) | Self::TomlDeError(_) | Self::TomlSerError(_) => vec![
                "Check configuration file syntax".into(),
                "Run with --verbose to see detailed error".into(),
                "Use --config to specify a different config file".into(),
            ],
            _ => vec![
                "Run with --verbose for more details".into(),
                "Check the documentation for help".into(),
            ],
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidTarget(_) => 2,
            Self::TargetUnavailable(_) | Self::LaunchFailed(_) => 3,
            Self::UnsupportedDialect(_) => 4,
            Self::AlreadyRecording | Self::NoRecording | Self::RecordingInProgress => 5,
            Self::IoError(_) | Self::CaptureFailed(_) => 6,
            Self::ConfigError(_) | Self::TomlDeError(_) | Self::TomlSerError(_) => 7,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(RecorderError::InvalidTarget(String::new()).exit_code(), 2);
        assert_eq!(
            RecorderError::UnsupportedDialect("cobol".into()).exit_code(),
            4
        );
        assert_eq!(RecorderError::StoreSealed.exit_code(), 1);
    }

    #[test]
    fn test_index_out_of_range_message() {
        let err = RecorderError::IndexOutOfRange { index: 5, len: 2 };
        assert_eq!(
            err.to_string(),
            "Step index 5 out of range (recorded steps: 2)"
        );
        assert_eq!(err.suggestions(), vec!["Choose a step between 0 and 1"]);
    }
}
