use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Combined result of static import detection and installed-package
/// reconciliation for one script. Built fresh on every analysis call;
/// nothing here is cached between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub detected_imports: BTreeSet<String>,
    pub declared_requirements: Vec<String>,
    pub installed_packages: BTreeSet<String>,
    pub missing_packages: Vec<String>,
    pub substituted_packages: BTreeSet<String>,
    pub substitution_messages: Vec<String>,
    pub install_command: Option<String>,
    pub all_requirements: BTreeSet<String>,
}

impl DependencyReport {
    pub fn empty() -> Self {
        Self {
            detected_imports: BTreeSet::new(),
            declared_requirements: Vec::new(),
            installed_packages: BTreeSet::new(),
            missing_packages: Vec::new(),
            substituted_packages: BTreeSet::new(),
            substitution_messages: Vec::new(),
            install_command: None,
            all_requirements: BTreeSet::new(),
        }
    }

    pub fn has_missing(&self) -> bool {
        !self.missing_packages.is_empty()
    }

    pub fn is_satisfied(&self) -> bool {
        self.missing_packages.is_empty()
    }

    /// Warning lines surfaced alongside a run that proceeds without
    /// installing the missing packages.
    pub fn missing_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.has_missing() {
            warnings.push(format!(
                "⚠️ Missing packages: {}",
                self.missing_packages.join(", ")
            ));
            if let Some(ref cmd) = self.install_command {
                warnings.push(format!("📝 Install command: {}", cmd));
            }
        }
        warnings
    }
}

/// Replacement for a package name that is known to fail or misbehave when
/// installed as requested, plus the human-readable reason shown to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstitutionRule {
    pub canonical: &'static str,
    pub replacement: &'static str,
    pub reason: &'static str,
}
