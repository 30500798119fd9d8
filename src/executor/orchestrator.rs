use crate::deps::{InstallOutcome, PackageInstaller, PackageResolver};
use crate::executor::{ExecutionConfig, ScriptRunner};
use crate::files::{FileClassifier, StoragePromoter, WorkspaceManager};
use crate::models::{
    DependencyReport, DownloadInfo, ExecutionOutcome, FailureKind, RunRequest,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Sequences one script run end to end: workspace creation, dependency
/// check, optional install, subprocess run, file diff, promotion, and
/// cleanup. This is the only component that knows both subsystems, and it
/// owns the failure policy: every failure mode maps to a structured
/// outcome, and the workspace is deleted on every exit path.
pub struct ExecutionOrchestrator {
    workspaces: WorkspaceManager,
    classifier: FileClassifier,
    promoter: StoragePromoter,
    resolver: PackageResolver,
    installer: PackageInstaller,
    interpreter: String,
}

impl ExecutionOrchestrator {
    pub fn new(base_output_dir: impl Into<PathBuf>) -> Self {
        Self::with_interpreter(base_output_dir, "python3")
    }

    /// All subprocess work (pip queries, installs, verification imports,
    /// and the script itself) targets the same interpreter.
    pub fn with_interpreter(
        base_output_dir: impl Into<PathBuf>,
        interpreter: impl Into<String>,
    ) -> Self {
        let base = base_output_dir.into();
        let interpreter = interpreter.into();
        Self {
            workspaces: WorkspaceManager::new(base.clone()),
            classifier: FileClassifier::new(),
            promoter: StoragePromoter::new(base),
            resolver: PackageResolver::new(interpreter.clone()),
            installer: PackageInstaller::new(interpreter.clone()),
            interpreter,
        }
    }

    /// Dependency report for one script, recomputed fresh on every call.
    pub async fn analyze_dependencies(
        &self,
        script_path: &Path,
        declared_requirements: Option<&str>,
    ) -> DependencyReport {
        self.resolver.analyze(script_path, declared_requirements).await
    }

    pub async fn install_missing(&self, missing: &[String]) -> InstallOutcome {
        self.installer.install(missing).await
    }

    /// Run one script and collect everything it produced. Never returns an
    /// error: every failure mode is folded into the outcome object.
    pub async fn run_and_collect(&self, request: &RunRequest) -> ExecutionOutcome {
        let workspace = match self
            .workspaces
            .create_workspace(request.execution_id, request.user_id)
        {
            Ok(workspace) => workspace,
            Err(e) => {
                return ExecutionOutcome::failed(
                    request.execution_id,
                    FailureKind::LaunchError,
                    format!("Could not create workspace: {}", e),
                );
            }
        };
        let before = self.workspaces.snapshot(&workspace);

        let mut outcome = self.run_in_workspace(request, &workspace, &before).await;

        // Unconditional: runs whether the script succeeded, failed, timed
        // out, or never launched.
        if !self.workspaces.cleanup(&workspace) {
            outcome.cleanup_warning =
                Some(format!("Workspace {} could not be removed", workspace.display()));
        }
        outcome
    }

    async fn run_in_workspace(
        &self,
        request: &RunRequest,
        workspace: &Path,
        before: &HashSet<PathBuf>,
    ) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome::new(request.execution_id);

        if !request.script_path.is_file() {
            outcome.failure = Some(FailureKind::ScriptNotFound);
            outcome.error_message = Some(format!(
                "Script file not found: {}",
                request.script_path.display()
            ));
            return outcome;
        }

        let report = self
            .resolver
            .analyze(
                &request.script_path,
                request.declared_requirements.as_deref(),
            )
            .await;
        outcome.dependency_report = report.clone();

        if report.has_missing() {
            if request.auto_install {
                let install = self.installer.install(&report.missing_packages).await;
                outcome.install_output = Some(install.message.clone());
                if !install.success {
                    // Hard stop: no subprocess, no file promotion.
                    outcome.failure = Some(FailureKind::InstallFailure);
                    outcome.error_message = Some(format!(
                        "Missing packages could not be installed: {}",
                        install.message
                    ));
                    return outcome;
                }
            } else {
                // Proceed anyway, carrying the warnings.
                outcome.package_warnings = report.missing_warnings();
            }
        }

        let config = ExecutionConfig::new(request.script_path.clone(), workspace.to_path_buf())
            .with_interpreter(self.interpreter.clone())
            .with_args(ExecutionConfig::parse_arguments(&request.raw_arguments))
            .with_timeout(request.timeout_seconds);

        match ScriptRunner::new(config).execute().await {
            Ok(run) => {
                outcome.stdout = run.stdout;
                outcome.stderr = run.stderr;
                outcome.return_code = run.return_code;
                if run.timed_out {
                    outcome.failure = Some(FailureKind::Timeout);
                    outcome.error_message = Some("Script execution timed out".to_string());
                }
            }
            Err(e) => {
                outcome.failure = Some(FailureKind::LaunchError);
                outcome.error_message = Some(e.to_string());
            }
        }

        // Files are collected regardless of exit code or timeout: whatever
        // was written before the run ended is still promoted.
        outcome.output_files = self
            .classifier
            .scan_for_output_files(workspace, Some(before));
        outcome.file_summary = self.classifier.summarize(&outcome.output_files);

        if !outcome.output_files.is_empty() {
            match self.promoter.promote(workspace, request.execution_id) {
                Ok(permanent) => outcome.permanent_dir = Some(permanent),
                Err(e) => {
                    warn!(execution_id = request.execution_id, error = %e, "file promotion failed");
                    outcome.cleanup_warning = Some(format!("Output files were not promoted: {}", e));
                }
            }
        }

        info!(
            execution_id = request.execution_id,
            return_code = outcome.return_code,
            files = outcome.output_files.len(),
            failure = ?outcome.failure,
            "execution finished"
        );
        outcome
    }

    /// Resolve a promoted file for download; traversal attempts and missing
    /// files are both "not found".
    pub fn get_download_info(&self, execution_id: i64, relative_path: &str) -> Option<DownloadInfo> {
        self.promoter.download_info(execution_id, relative_path)
    }

    /// Delete the durable store for one execution (idempotent).
    pub fn cleanup_execution(&self, execution_id: i64) -> bool {
        self.promoter.cleanup_execution(execution_id)
    }

    /// Remove transient workspaces older than the cutoff.
    pub fn gc_stale_workspaces(&self, days: i64) -> usize {
        self.workspaces.gc_stale(days)
    }
}
