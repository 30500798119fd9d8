use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Invocation convention: `[interpreter, script_path, *stringified_args]`,
/// run with the workspace as the working directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub interpreter: String,
    pub script_path: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout_seconds: u64,
}

impl ExecutionConfig {
    pub fn new(script_path: PathBuf, working_dir: PathBuf) -> Self {
        Self {
            interpreter: "python3".to_string(),
            script_path,
            args: Vec::new(),
            working_dir,
            timeout_seconds: 30,
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.interpreter.is_empty() {
            return Err("Interpreter cannot be empty".to_string());
        }
        if self.timeout_seconds == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Parse a raw argument string: a bracket-delimited string is decoded
    /// as a JSON array with each element stringified; anything else
    /// non-empty is one literal argument. Undecodable bracket input falls
    /// back to the literal form.
    pub fn parse_arguments(raw: &str) -> Vec<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if trimmed.starts_with('[') {
            if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
                return values
                    .into_iter()
                    .map(|value| match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect();
            }
        }
        vec![raw.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_argument_string() {
        assert!(ExecutionConfig::parse_arguments("").is_empty());
        assert!(ExecutionConfig::parse_arguments("   ").is_empty());
    }

    #[test]
    fn test_single_literal_argument() {
        assert_eq!(
            ExecutionConfig::parse_arguments("hello world"),
            vec!["hello world"]
        );
    }

    #[test]
    fn test_json_array_arguments_are_stringified() {
        assert_eq!(
            ExecutionConfig::parse_arguments("[\"a\", 2, true]"),
            vec!["a", "2", "true"]
        );
    }

    #[test]
    fn test_malformed_bracket_input_falls_back_to_literal() {
        assert_eq!(
            ExecutionConfig::parse_arguments("[not json"),
            vec!["[not json"]
        );
    }

    #[test]
    fn test_config_validation() {
        let config = ExecutionConfig::new(PathBuf::from("demo.py"), PathBuf::from("/tmp"));
        assert!(config.validate().is_ok());

        let bad = config.clone().with_interpreter("");
        assert!(bad.validate().is_err());

        let zero = config.with_timeout(0);
        assert!(zero.validate().is_err());
    }
}
