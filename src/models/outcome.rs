use crate::models::{DependencyReport, FileDescriptor, FileSummary};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Return code recorded when no real process exit code exists (timeout,
/// launch failure, pre-flight failure). Distinct from any real exit code.
pub const SENTINEL_RETURN_CODE: i32 = -1;

/// Everything the orchestrator needs to run one script. The execution id
/// is an opaque identifier allocated by the caller before any filesystem
/// work, so even a run that fails pre-launch is attributable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub script_path: PathBuf,
    pub raw_arguments: String,
    pub declared_requirements: Option<String>,
    pub execution_id: i64,
    pub user_id: i64,
    pub timeout_seconds: u64,
    pub auto_install: bool,
}

impl RunRequest {
    pub fn new(script_path: PathBuf, execution_id: i64, user_id: i64) -> Self {
        Self {
            script_path,
            raw_arguments: String::new(),
            declared_requirements: None,
            execution_id,
            user_id,
            timeout_seconds: 30,
            auto_install: false,
        }
    }

    pub fn with_arguments(mut self, raw: String) -> Self {
        self.raw_arguments = raw;
        self
    }

    pub fn with_requirements(mut self, declared: Option<String>) -> Self {
        self.declared_requirements = declared;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_auto_install(mut self, auto_install: bool) -> Self {
        self.auto_install = auto_install;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    ScriptNotFound,
    InstallFailure,
    Timeout,
    LaunchError,
}

/// Structured result of one execution, handed to the notification
/// collaborator. Failures inside the core surface here instead of as
/// errors crossing the orchestrator boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub execution_id: i64,
    pub stdout: String,
    pub stderr: String,
    pub return_code: i32,
    pub failure: Option<FailureKind>,
    pub error_message: Option<String>,
    pub package_warnings: Vec<String>,
    pub install_output: Option<String>,
    pub output_files: Vec<FileDescriptor>,
    pub file_summary: FileSummary,
    pub dependency_report: DependencyReport,
    pub permanent_dir: Option<PathBuf>,
    pub cleanup_warning: Option<String>,
}

impl ExecutionOutcome {
    pub fn new(execution_id: i64) -> Self {
        Self {
            execution_id,
            stdout: String::new(),
            stderr: String::new(),
            return_code: SENTINEL_RETURN_CODE,
            failure: None,
            error_message: None,
            package_warnings: Vec::new(),
            install_output: None,
            output_files: Vec::new(),
            file_summary: FileSummary::empty(),
            dependency_report: DependencyReport::empty(),
            permanent_dir: None,
            cleanup_warning: None,
        }
    }

    pub fn failed(execution_id: i64, kind: FailureKind, message: String) -> Self {
        let mut outcome = Self::new(execution_id);
        outcome.failure = Some(kind);
        outcome.error_message = Some(message);
        outcome
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none() && self.return_code == 0
    }

    pub fn timed_out(&self) -> bool {
        self.failure == Some(FailureKind::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_outcome_carries_sentinel_code() {
        let outcome = ExecutionOutcome::failed(
            7,
            FailureKind::Timeout,
            "Script execution timed out".to_string(),
        );
        assert_eq!(outcome.return_code, SENTINEL_RETURN_CODE);
        assert!(outcome.timed_out());
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_request_builders() {
        let request = RunRequest::new(PathBuf::from("demo.py"), 1, 2)
            .with_arguments("[\"a\", 1]".to_string())
            .with_timeout(10)
            .with_auto_install(true);

        assert_eq!(request.timeout_seconds, 10);
        assert!(request.auto_install);
        assert_eq!(request.raw_arguments, "[\"a\", 1]");
    }
}
