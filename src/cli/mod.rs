pub mod args;
pub mod reporter;

pub use args::Cli;
pub use reporter::ReportFormatter;

use crate::error::OuttakeError;
use crate::executor::ExecutionOrchestrator;
use crate::models::{FailureKind, RunRequest};

pub struct CliHandler {
    cli: Cli,
}

impl CliHandler {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    pub async fn run(&self) -> Result<i32, OuttakeError> {
        let orchestrator = ExecutionOrchestrator::with_interpreter(
            self.cli.output_dir.clone(),
            self.cli.interpreter.clone(),
        );

        // GC mode stands alone: sweep and exit.
        if let Some(days) = self.cli.gc_days {
            let removed = orchestrator.gc_stale_workspaces(days);
            println!("🧹 Removed {} stale workspace(s) older than {} days", removed, days);
            return Ok(0);
        }

        let script = self
            .cli
            .script
            .clone()
            .ok_or_else(|| OuttakeError::InvalidArguments("A script path is required".to_string()))?;

        let formatter = ReportFormatter::new(self.cli.verbose);

        if self.cli.check_only {
            let report = orchestrator
                .analyze_dependencies(&script, self.cli.requirements.as_deref())
                .await;
            println!("{}", formatter.format_dependency_report(&report));
            return Ok(if report.is_satisfied() { 0 } else { 1 });
        }

        let execution_id = self.cli.effective_execution_id();
        if self.cli.verbose {
            eprintln!(
                "▶️ Running {} as execution {} (timeout {}s)",
                script.display(),
                execution_id,
                self.cli.timeout
            );
        }

        let request = RunRequest::new(script, execution_id, self.cli.user_id)
            .with_arguments(self.cli.args.clone())
            .with_requirements(self.cli.requirements.clone())
            .with_timeout(self.cli.timeout)
            .with_auto_install(self.cli.auto_install);

        let outcome = orchestrator.run_and_collect(&request).await;

        println!("{}", formatter.format_dependency_report(&outcome.dependency_report));
        println!("{}", formatter.format_outcome(&outcome));

        if self.cli.cleanup_after_report && !outcome.output_files.is_empty() {
            if orchestrator.cleanup_execution(execution_id) {
                if self.cli.verbose {
                    eprintln!("🧹 Stored files for execution {} removed", execution_id);
                }
            } else {
                eprintln!("⚠️ Stored files for execution {} could not be removed", execution_id);
            }
        }

        Ok(exit_code_for(&outcome))
    }
}

fn exit_code_for(outcome: &crate::models::ExecutionOutcome) -> i32 {
    match outcome.failure {
        None => {
            if outcome.return_code >= 0 {
                outcome.return_code.min(125)
            } else {
                1
            }
        }
        Some(FailureKind::Timeout) => 4,
        Some(FailureKind::InstallFailure) => 5,
        Some(FailureKind::LaunchError) => 6,
        Some(FailureKind::ScriptNotFound) => 7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExecutionOutcome;

    #[test]
    fn test_exit_code_mapping() {
        let mut outcome = ExecutionOutcome::new(1);
        outcome.return_code = 0;
        assert_eq!(exit_code_for(&outcome), 0);

        outcome.return_code = 3;
        assert_eq!(exit_code_for(&outcome), 3);

        let timeout = ExecutionOutcome::failed(1, FailureKind::Timeout, "t".to_string());
        assert_eq!(exit_code_for(&timeout), 4);

        let missing = ExecutionOutcome::failed(1, FailureKind::ScriptNotFound, "m".to_string());
        assert_eq!(exit_code_for(&missing), 7);
    }
}
