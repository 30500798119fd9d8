use crate::deps::diagnostics::{diagnose_install_failure, import_name_for, substitution_for};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);
const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallOutcome {
    pub success: bool,
    pub message: String,
    pub substitutions: Vec<String>,
    pub failed_verifications: Vec<String>,
}

impl InstallOutcome {
    fn success(message: String, substitutions: Vec<String>) -> Self {
        Self {
            success: true,
            message,
            substitutions,
            failed_verifications: Vec::new(),
        }
    }

    fn failure(message: String, substitutions: Vec<String>) -> Self {
        Self {
            success: false,
            message,
            substitutions,
            failed_verifications: Vec::new(),
        }
    }
}

/// Installs missing packages through pip and verifies the result.
///
/// State machine per call: Substitute -> Invoke -> Verify -> Report. The
/// pip exit code alone is not trusted: every package must survive an
/// isolated verification import before the install counts as successful.
pub struct PackageInstaller {
    interpreter: String,
}

impl PackageInstaller {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    pub async fn install(&self, missing: &[String]) -> InstallOutcome {
        if missing.is_empty() {
            return InstallOutcome::success("No packages to install".to_string(), Vec::new());
        }

        // Substitute known-problematic packages, keeping version suffixes.
        let mut to_install = Vec::with_capacity(missing.len());
        let mut substitution_notes = Vec::new();
        for requirement in missing {
            let (name, suffix) = split_requirement(requirement);
            match substitution_for(name) {
                Some(rule) => {
                    to_install.push(format!("{}{}", rule.replacement, suffix));
                    substitution_notes.push(format!(
                        "🔄 Installing {} instead of {}: {}",
                        rule.replacement, rule.canonical, rule.reason
                    ));
                }
                None => to_install.push(requirement.clone()),
            }
        }

        debug!(packages = ?to_install, "invoking pip install");
        let invoke = self.invoke_pip(&to_install).await;
        let install_message = match invoke {
            Ok(message) => message,
            Err(message) => {
                return InstallOutcome::failure(
                    compose_message(&substitution_notes, &message, &[]),
                    substitution_notes,
                );
            }
        };

        // Verify each package imports in a fresh interpreter. A reported
        // pip success with a failing import is still an overall failure.
        let verifications = join_all(
            to_install
                .iter()
                .map(|requirement| self.verify_importable(requirement)),
        )
        .await;

        let mut verify_lines = Vec::new();
        let mut failed = Vec::new();
        for (requirement, verified) in to_install.iter().zip(verifications) {
            let (name, _) = split_requirement(requirement);
            match verified {
                Ok(module) => {
                    verify_lines.push(format!("✅ {} verified importable (as {})", name, module));
                }
                Err(detail) => {
                    warn!(package = name, detail = %detail, "post-install verification failed");
                    verify_lines.push(format!("❌ {} installed but not importable: {}", name, detail));
                    failed.push(name.to_string());
                }
            }
        }

        let message = compose_message(&substitution_notes, &install_message, &verify_lines);
        InstallOutcome {
            success: failed.is_empty(),
            message,
            substitutions: substitution_notes,
            failed_verifications: failed,
        }
    }

    /// Run `pip install` for the substituted list. Ok carries the success
    /// line; Err carries diagnosed failure text.
    async fn invoke_pip(&self, packages: &[String]) -> Result<String, String> {
        let result = timeout(
            INSTALL_TIMEOUT,
            Command::new(&self.interpreter)
                .args(["-m", "pip", "install"])
                .args(packages)
                .stdin(Stdio::null())
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) if output.status.success() => Ok(format!(
                "✅ Successfully installed: {}",
                packages.join(", ")
            )),
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(format!(
                    "❌ Installation failed: {}",
                    diagnose_install_failure(&stderr)
                ))
            }
            Ok(Err(e)) => Err(format!("❌ Installation error: {}", e)),
            Err(_) => Err("❌ Installation timed out (5 minutes)".to_string()),
        }
    }

    /// Attempt to import a freshly installed package in an isolated
    /// subprocess, retrying known alternate import names (pyyaml imports
    /// as yaml). Returns the module name that imported.
    async fn verify_importable(&self, requirement: &str) -> Result<String, String> {
        let (name, _) = split_requirement(requirement);
        let mut candidates = vec![name.replace('-', "_")];
        if let Some(alias) = import_name_for(name) {
            candidates.push(alias.to_string());
        }

        let mut last_error = String::new();
        for module in &candidates {
            match self.try_import(module).await {
                Ok(()) => return Ok(module.clone()),
                Err(detail) => last_error = detail,
            }
        }
        Err(last_error)
    }

    async fn try_import(&self, module: &str) -> Result<(), String> {
        let result = timeout(
            VERIFY_TIMEOUT,
            Command::new(&self.interpreter)
                .args(["-c", &format!("import {}", module)])
                .stdin(Stdio::null())
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(stderr.lines().last().unwrap_or("import failed").to_string())
            }
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("import of {} timed out", module)),
        }
    }
}

impl Default for PackageInstaller {
    fn default() -> Self {
        Self::new("python3")
    }
}

/// Split "psycopg2>=2.9" into ("psycopg2", ">=2.9"). The suffix survives
/// substitution so pinned versions stay pinned.
fn split_requirement(requirement: &str) -> (&str, &str) {
    match requirement.find(['>', '<', '=', '!']) {
        Some(idx) => (requirement[..idx].trim(), &requirement[idx..]),
        None => (requirement.trim(), ""),
    }
}

fn compose_message(substitutions: &[String], install_message: &str, verify_lines: &[String]) -> String {
    let mut sections = Vec::new();
    sections.extend(substitutions.iter().cloned());
    sections.push(install_message.to_string());
    sections.extend(verify_lines.iter().cloned());
    sections.join("\n")
}
