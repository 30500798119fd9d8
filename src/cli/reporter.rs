use crate::models::{DependencyReport, ExecutionOutcome, FailureKind};

pub struct ReportFormatter {
    verbose: bool,
}

impl ReportFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn format_dependency_report(&self, report: &DependencyReport) -> String {
        let mut output = String::new();

        output.push_str("📦 Dependency Report\n");
        output.push_str(&"─".repeat(40));
        output.push('\n');

        if report.all_requirements.is_empty() {
            output.push_str("No third-party requirements detected.\n");
            return output;
        }

        output.push_str(&format!(
            "Detected imports:      {}\n",
            join_or_dash(report.detected_imports.iter())
        ));
        output.push_str(&format!(
            "Declared requirements: {}\n",
            join_or_dash(report.declared_requirements.iter())
        ));
        output.push_str(&format!(
            "Installed:             {}\n",
            join_or_dash(report.installed_packages.iter())
        ));

        if report.has_missing() {
            output.push_str(&format!(
                "❌ Missing:            {}\n",
                report.missing_packages.join(", ")
            ));
            if let Some(ref cmd) = report.install_command {
                output.push_str(&format!("📝 Install command:    {}\n", cmd));
            }
            for message in &report.substitution_messages {
                output.push_str(&format!("{}\n", message));
            }
        } else {
            output.push_str("✅ All requirements satisfied\n");
        }

        output
    }

    pub fn format_outcome(&self, outcome: &ExecutionOutcome) -> String {
        let mut output = String::new();

        output.push_str(&format!("\n🏁 Execution {}\n", outcome.execution_id));
        output.push_str(&"─".repeat(40));
        output.push('\n');

        match outcome.failure {
            None => {
                output.push_str(&format!("Exit code: {}\n", outcome.return_code));
            }
            Some(FailureKind::Timeout) => {
                output.push_str("⏱️ Script execution timed out\n");
            }
            Some(FailureKind::InstallFailure) => {
                output.push_str("❌ Dependency installation failed; script was not run\n");
            }
            Some(FailureKind::ScriptNotFound) => {
                output.push_str("❌ Script file not found\n");
            }
            Some(FailureKind::LaunchError) => {
                output.push_str("❌ Script could not be launched\n");
            }
        }

        if let Some(ref message) = outcome.error_message {
            output.push_str(&format!("Error: {}\n", message));
        }
        for warning in &outcome.package_warnings {
            output.push_str(&format!("{}\n", warning));
        }
        if let Some(ref install_output) = outcome.install_output {
            output.push_str("\n📦 Installation:\n");
            output.push_str(install_output);
            output.push('\n');
        }

        if !outcome.stdout.is_empty() {
            output.push_str("\n── stdout ──\n");
            output.push_str(&outcome.stdout);
            if !outcome.stdout.ends_with('\n') {
                output.push('\n');
            }
        }
        if !outcome.stderr.is_empty() && (self.verbose || outcome.return_code != 0) {
            output.push_str("\n── stderr ──\n");
            output.push_str(&outcome.stderr);
            if !outcome.stderr.ends_with('\n') {
                output.push('\n');
            }
        }

        output.push_str(&self.format_file_table(outcome));

        if let Some(ref warning) = outcome.cleanup_warning {
            output.push_str(&format!("⚠️ {}\n", warning));
        }

        output
    }

    fn format_file_table(&self, outcome: &ExecutionOutcome) -> String {
        let mut output = String::new();

        if outcome.output_files.is_empty() {
            output.push_str("\n📁 No output files produced\n");
            return output;
        }

        output.push_str(&format!(
            "\n📁 Output files ({}, {}):\n",
            outcome.file_summary.total_count, outcome.file_summary.total_size_human
        ));
        for file in &outcome.output_files {
            output.push_str(&format!(
                "  {:<30} {:>10}  {:<10} {}\n",
                file.relative_path.display(),
                file.size_human,
                file.category.as_str(),
                file.content_hash
            ));
        }

        let categories: Vec<String> = outcome
            .file_summary
            .per_category_counts
            .iter()
            .map(|(category, count)| format!("{} {}", count, category.as_str()))
            .collect();
        if !categories.is_empty() {
            output.push_str(&format!("  ({})\n", categories.join(", ")));
        }

        if let Some(ref permanent) = outcome.permanent_dir {
            output.push_str(&format!("💾 Stored under {}\n", permanent.display()));
        }

        output
    }
}

fn join_or_dash<'a>(mut items: impl Iterator<Item = &'a String>) -> String {
    let joined = items.by_ref().cloned().collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}
