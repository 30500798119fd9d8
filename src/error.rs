use thiserror::Error;

/// Errors that cross component boundaries. Run-level failures (missing
/// script, timeout, install failure) do not appear here: they fold into
/// `ExecutionOutcome` instead of erroring across the orchestrator.
#[derive(Error, Debug)]
pub enum OuttakeError {
    #[error("Interpreter not found: {command}")]
    InterpreterNotFound { command: String },

    #[error("Script execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid command line arguments: {0}")]
    InvalidArguments(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = OuttakeError::InterpreterNotFound {
            command: "python3".to_string(),
        };
        assert_eq!(err.to_string(), "Interpreter not found: python3");

        let err = OuttakeError::InvalidArguments("bad timeout".to_string());
        assert!(err.to_string().contains("bad timeout"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: OuttakeError = io.into();
        assert!(matches!(err, OuttakeError::IoError(_)));
    }
}
