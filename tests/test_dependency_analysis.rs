use outtake::deps::diagnostics::{diagnose_install_failure, import_name_for, substitution_for};
use outtake::{ImportScanner, PackageResolver};
use std::collections::HashSet;
use tempfile::TempDir;

fn write_script(dir: &TempDir, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, source).unwrap();
    path
}

#[tokio::test]
async fn analysis_merges_detected_and_declared_requirements() {
    let dir = TempDir::new().unwrap();
    let script = write_script(
        &dir,
        "analysis.py",
        "import os\nimport requests\nfrom flask import Flask\n\nprint('hi')\n",
    );

    // Interpreter path that cannot exist: pip queries fail soft and report
    // an empty environment, so everything third-party comes back missing.
    let resolver = PackageResolver::new("/nonexistent/interpreter");
    let report = resolver.analyze(&script, Some("pandas>=2.0, requests")).await;

    assert!(report.detected_imports.contains("requests"));
    assert!(report.detected_imports.contains("flask"));
    assert!(!report.detected_imports.contains("os"));

    assert_eq!(
        report.declared_requirements,
        vec!["pandas>=2.0".to_string(), "requests".to_string()]
    );

    // Duplicates collapse; the missing list keeps the declared specifier.
    assert!(report.all_requirements.contains("requests"));
    assert!(report.missing_packages.contains(&"pandas>=2.0".to_string()));
    assert!(report.missing_packages.contains(&"flask".to_string()));
    assert_eq!(
        report.missing_packages.iter().filter(|p| p.starts_with("requests")).count(),
        1
    );

    let command = report.install_command.as_deref().unwrap();
    assert!(command.starts_with("pip install "));
    assert!(command.contains("pandas>=2.0"));
}

#[tokio::test]
async fn stdlib_only_script_is_satisfied_without_touching_pip() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "stdlib.py", "import json\nimport sys\nfrom pathlib import Path\n");

    let resolver = PackageResolver::new("/nonexistent/interpreter");
    let report = resolver.analyze(&script, None).await;

    assert!(report.all_requirements.is_empty());
    assert!(!report.has_missing());
    assert!(report.is_satisfied());
}

#[test]
fn substitution_rules_cover_known_problem_packages() {
    assert_eq!(substitution_for("psycopg2").unwrap().replacement, "psycopg2-binary");
    assert_eq!(substitution_for("MySQLclient").unwrap().replacement, "pymysql");
    assert_eq!(substitution_for("pycrypto").unwrap().replacement, "pycryptodome");
    assert!(substitution_for("requests").is_none());

    let resolver = PackageResolver::default();
    let installed: HashSet<String> = ["pymysql".to_string()].into_iter().collect();
    let (available, missing) = resolver.reconcile(&["mysqlclient".to_string()], &installed);
    assert_eq!(available, vec!["mysqlclient"]);
    assert!(missing.is_empty());
}

#[test]
fn import_aliases_map_distribution_to_module_name() {
    assert_eq!(import_name_for("pillow"), Some("PIL"));
    assert_eq!(import_name_for("scikit-learn"), Some("sklearn"));
    assert_eq!(import_name_for("beautifulsoup4"), Some("bs4"));
    assert_eq!(import_name_for("requests"), None);
}

#[test]
fn install_failure_diagnosis_recognizes_toolchain_errors() {
    let diagnosed = diagnose_install_failure(
        "Error: pg_config executable not found.\nbuild failed",
    );
    assert!(diagnosed.contains("psycopg2-binary"));

    let diagnosed = diagnose_install_failure("fatal error: Python.h: No such file or directory");
    assert!(diagnosed.to_lowercase().contains("header"));

    // Unrecognized long output is truncated to keep reports readable.
    let noise = (0..20).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
    let diagnosed = diagnose_install_failure(&noise);
    assert!(diagnosed.contains("line 0"));
    assert!(diagnosed.contains("truncated"));
    assert!(!diagnosed.contains("line 12"));
}

#[test]
fn scanner_handles_comma_lists_and_dotted_modules() {
    let scanner = ImportScanner::new();
    let detected = scanner.detect_in_source(
        "import numpy, pandas\nfrom matplotlib.pyplot import plot\n  import requests\n",
    );

    assert!(detected.contains("numpy"));
    assert!(detected.contains("pandas"));
    assert!(detected.contains("matplotlib"));
    assert!(detected.contains("requests"));
}
