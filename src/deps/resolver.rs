use crate::deps::diagnostics::substitution_for;
use crate::deps::imports::ImportScanner;
use crate::models::DependencyReport;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

const PIP_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Reconciles a script's requirements against the live interpreter
/// environment. Holds no cached state: every check re-queries pip so that
/// concurrent installs triggered elsewhere are observed.
pub struct PackageResolver {
    interpreter: String,
    scanner: ImportScanner,
    version_split: Regex,
}

impl PackageResolver {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            scanner: ImportScanner::new(),
            version_split: Regex::new(r"[><=!]").expect("static regex"),
        }
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Installed distribution names, lower-cased. Any failure (pip absent,
    /// timeout, non-zero exit) yields the empty set rather than an error;
    /// the caller then reports everything as missing.
    pub async fn installed_packages(&self) -> HashSet<String> {
        let result = timeout(
            PIP_QUERY_TIMEOUT,
            Command::new(&self.interpreter)
                .args(["-m", "pip", "list", "--format=freeze"])
                .stdin(Stdio::null())
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                stdout
                    .lines()
                    .filter_map(|line| line.split_once("==").map(|(name, _)| name.trim().to_lowercase()))
                    .collect()
            }
            Ok(Ok(output)) => {
                warn!(code = ?output.status.code(), "pip list exited non-zero");
                HashSet::new()
            }
            Ok(Err(e)) => {
                warn!(error = %e, interpreter = %self.interpreter, "could not query installed packages");
                HashSet::new()
            }
            Err(_) => {
                warn!("pip list timed out");
                HashSet::new()
            }
        }
    }

    /// Split `required` into (available, missing). Missing entries keep
    /// their version specifier so they can be fed to pip verbatim.
    pub async fn check_missing(&self, required: &[String]) -> (Vec<String>, Vec<String>) {
        if required.is_empty() {
            // Short-circuit: skip the pip query entirely.
            return (Vec::new(), Vec::new());
        }
        let installed = self.installed_packages().await;
        self.reconcile(required, &installed)
    }

    /// Pure reconciliation against a known installed set. A requirement is
    /// satisfied if its stripped name is installed, or if its known
    /// substitution target is (requiring psycopg2 is satisfied by an
    /// installed psycopg2-binary).
    pub fn reconcile(
        &self,
        required: &[String],
        installed: &HashSet<String>,
    ) -> (Vec<String>, Vec<String>) {
        let required_set: BTreeSet<String> = required
            .iter()
            .map(|pkg| pkg.trim().to_lowercase())
            .filter(|pkg| !pkg.is_empty())
            .collect();

        let mut available = Vec::new();
        let mut missing = Vec::new();

        for pkg in required_set {
            let clean = self.strip_version(&pkg);

            if installed.contains(&clean) {
                available.push(clean);
                continue;
            }

            let substituted_match = substitution_for(&clean)
                .map(|rule| installed.contains(&rule.replacement.to_lowercase()))
                .unwrap_or(false);

            if substituted_match {
                available.push(clean);
            } else {
                missing.push(pkg);
            }
        }

        (available, missing)
    }

    /// Strip a version specifier suffix: "requests>=2.0" -> "requests".
    pub fn strip_version(&self, requirement: &str) -> String {
        self.version_split
            .split(requirement)
            .next()
            .unwrap_or(requirement)
            .trim()
            .to_string()
    }

    /// Copy-pasteable manual install command for the missing set.
    pub fn manual_install_command(&self, packages: &[String]) -> Option<String> {
        if packages.is_empty() {
            None
        } else {
            Some(format!("pip install {}", packages.join(" ")))
        }
    }

    /// Build the full dependency report for one script: static import
    /// detection, declared requirements, reconciliation, and a substitution
    /// preview for the missing subset. Recomputed fresh on every call.
    pub async fn analyze(
        &self,
        script_path: &Path,
        declared_requirements: Option<&str>,
    ) -> DependencyReport {
        let detected: BTreeSet<String> = self
            .scanner
            .detect_imports(script_path)
            .into_iter()
            .collect();

        let declared: Vec<String> = declared_requirements
            .unwrap_or_default()
            .split(',')
            .map(|pkg| pkg.trim().to_string())
            .filter(|pkg| !pkg.is_empty())
            .collect();

        let all_requirements: Vec<String> = detected
            .iter()
            .cloned()
            .chain(declared.iter().cloned())
            .collect();

        let (available, missing) = self.check_missing(&all_requirements).await;
        debug!(
            detected = detected.len(),
            declared = declared.len(),
            missing = missing.len(),
            "dependency analysis complete"
        );

        let mut substituted = BTreeSet::new();
        let mut substitution_messages = Vec::new();
        for pkg in &missing {
            let clean = self.strip_version(pkg);
            if let Some(rule) = substitution_for(&clean) {
                substituted.insert(rule.replacement.to_string());
                substitution_messages.push(format!(
                    "🔄 {} will be installed as {}: {}",
                    rule.canonical, rule.replacement, rule.reason
                ));
            }
        }

        let install_command = self.manual_install_command(&missing);
        let all_set: BTreeSet<String> = all_requirements
            .iter()
            .map(|pkg| pkg.trim().to_lowercase())
            .collect();

        DependencyReport {
            detected_imports: detected,
            declared_requirements: declared,
            installed_packages: available.into_iter().collect(),
            missing_packages: missing,
            substituted_packages: substituted,
            substitution_messages,
            install_command,
            all_requirements: all_set,
        }
    }
}

impl Default for PackageResolver {
    fn default() -> Self {
        Self::new("python3")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installed(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_requirements_short_circuit() {
        // Deliberately broken interpreter: an empty input must never reach it.
        let resolver = PackageResolver::new("/nonexistent/python");
        let (available, missing) = resolver.check_missing(&[]).await;
        assert!(available.is_empty());
        assert!(missing.is_empty());
    }

    #[test]
    fn test_version_specifier_is_stripped_for_matching() {
        let resolver = PackageResolver::default();
        let required = vec!["requests>=2.0".to_string()];
        let (available, missing) = resolver.reconcile(&required, &installed(&["requests"]));

        assert_eq!(available, vec!["requests"]);
        assert!(missing.is_empty());
    }

    #[test]
    fn test_missing_keeps_original_specifier() {
        let resolver = PackageResolver::default();
        let required = vec!["numpy==1.26.0".to_string()];
        let (available, missing) = resolver.reconcile(&required, &installed(&[]));

        assert!(available.is_empty());
        assert_eq!(missing, vec!["numpy==1.26.0"]);
    }

    #[test]
    fn test_substitution_target_counts_as_available() {
        let resolver = PackageResolver::default();
        let required = vec!["psycopg2".to_string()];
        let (available, missing) = resolver.reconcile(&required, &installed(&["psycopg2-binary"]));

        assert_eq!(available, vec!["psycopg2"]);
        assert!(missing.is_empty());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let resolver = PackageResolver::default();
        let required = vec!["  Requests ".to_string(), "FLASK>=2".to_string()];
        let (available, missing) = resolver.reconcile(&required, &installed(&["requests", "flask"]));

        assert_eq!(available.len(), 2);
        assert!(missing.is_empty());
    }

    #[test]
    fn test_manual_install_command() {
        let resolver = PackageResolver::default();
        assert_eq!(resolver.manual_install_command(&[]), None);
        assert_eq!(
            resolver.manual_install_command(&["a".to_string(), "b>=1".to_string()]),
            Some("pip install a b>=1".to_string())
        );
    }

    #[test]
    fn test_strip_version_variants() {
        let resolver = PackageResolver::default();
        assert_eq!(resolver.strip_version("pkg>=1.0"), "pkg");
        assert_eq!(resolver.strip_version("pkg==1.0"), "pkg");
        assert_eq!(resolver.strip_version("pkg!=1.0"), "pkg");
        assert_eq!(resolver.strip_version("pkg<2"), "pkg");
        assert_eq!(resolver.strip_version("pkg"), "pkg");
    }
}
