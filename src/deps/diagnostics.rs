use crate::models::SubstitutionRule;

/// Packages that routinely fail to build from source on servers without a
/// compiler toolchain, mapped to drop-in alternatives that ship wheels.
pub const SUBSTITUTIONS: &[SubstitutionRule] = &[
    SubstitutionRule {
        canonical: "psycopg2",
        replacement: "psycopg2-binary",
        reason: "psycopg2 compiles against PostgreSQL headers; psycopg2-binary ships prebuilt wheels",
    },
    SubstitutionRule {
        canonical: "mysqlclient",
        replacement: "pymysql",
        reason: "mysqlclient compiles against MySQL headers; pymysql is pure Python",
    },
    SubstitutionRule {
        canonical: "pycrypto",
        replacement: "pycryptodome",
        reason: "pycrypto is unmaintained and fails on modern toolchains; pycryptodome is the drop-in fork",
    },
];

/// Packages whose distribution name differs from the module they are
/// imported as, consulted when a post-install verification import fails.
pub const IMPORT_ALIASES: &[(&str, &str)] = &[
    ("pyyaml", "yaml"),
    ("pillow", "PIL"),
    ("beautifulsoup4", "bs4"),
    ("scikit-learn", "sklearn"),
    ("opencv-python", "cv2"),
    ("python-dateutil", "dateutil"),
    ("psycopg2-binary", "psycopg2"),
    ("pymysql", "pymysql"),
];

/// Look up the substitution rule for a stripped (version-free) package name.
pub fn substitution_for(name: &str) -> Option<&'static SubstitutionRule> {
    SUBSTITUTIONS
        .iter()
        .find(|rule| rule.canonical.eq_ignore_ascii_case(name))
}

/// Module name to try when verifying that `package` is importable.
pub fn import_name_for(package: &str) -> Option<&'static str> {
    IMPORT_ALIASES
        .iter()
        .find(|(dist, _)| dist.eq_ignore_ascii_case(package))
        .map(|(_, module)| *module)
}

/// Rewrite a raw pip failure into actionable guidance when it matches a
/// known native-build failure signature. Unmatched errors fall back to a
/// truncated copy of the raw output.
pub fn diagnose_install_failure(stderr: &str) -> String {
    let lowered = stderr.to_lowercase();

    if lowered.contains("pg_config") || lowered.contains("libpq") {
        return "PostgreSQL development headers are missing. Install libpq-dev (or use \
                psycopg2-binary instead of psycopg2)."
            .to_string();
    }

    if lowered.contains("microsoft visual c++")
        || lowered.contains("error: command 'gcc'")
        || lowered.contains("error: command 'g++'")
        || lowered.contains("unable to find vcvarsall")
    {
        return "A C/C++ build toolchain is required to compile this package from source. \
                Install build-essential (Linux) or the Visual C++ Build Tools (Windows), \
                or pick a package version that ships prebuilt wheels."
            .to_string();
    }

    if lowered.contains("mysql_config") || lowered.contains("mysql.h") {
        return "MySQL development headers are missing. Install libmysqlclient-dev, or use \
                pymysql as a pure-Python alternative."
            .to_string();
    }

    if lowered.contains("python.h") || lowered.contains("longintrepr.h") {
        return "Python development headers are missing. Install the python3-dev package for \
                your interpreter version."
            .to_string();
    }

    truncate_error(stderr)
}

/// First 5 lines of the raw error when it runs longer than 10 lines.
fn truncate_error(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    if lines.len() > 10 {
        let mut truncated = lines[..5].join("\n");
        truncated.push_str("\n... (output truncated)");
        truncated
    } else {
        stderr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_signature_is_recognized() {
        let diagnosis = diagnose_install_failure("Error: pg_config executable not found.");
        assert!(diagnosis.contains("PostgreSQL"));
        assert!(diagnosis.contains("psycopg2-binary"));
    }

    #[test]
    fn test_build_tools_signature_is_recognized() {
        let diagnosis =
            diagnose_install_failure("error: command 'gcc' failed with exit status 1");
        assert!(diagnosis.contains("build toolchain"));
    }

    #[test]
    fn test_mysql_signature_is_recognized() {
        let diagnosis = diagnose_install_failure("OSError: mysql_config not found");
        assert!(diagnosis.contains("MySQL"));
    }

    #[test]
    fn test_python_headers_signature_is_recognized() {
        let diagnosis = diagnose_install_failure("fatal error: Python.h: No such file");
        assert!(diagnosis.contains("python3-dev"));
    }

    #[test]
    fn test_unmatched_long_error_is_truncated() {
        let stderr = (0..20).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let diagnosis = diagnose_install_failure(&stderr);

        assert!(diagnosis.contains("line 0"));
        assert!(diagnosis.contains("line 4"));
        assert!(!diagnosis.contains("line 5\n"));
        assert!(diagnosis.contains("truncated"));
    }

    #[test]
    fn test_unmatched_short_error_passes_through() {
        let diagnosis = diagnose_install_failure("No matching distribution found for nosuchpkg");
        assert_eq!(diagnosis, "No matching distribution found for nosuchpkg");
    }

    #[test]
    fn test_substitution_lookup_is_case_insensitive() {
        let rule = substitution_for("Psycopg2").expect("rule should exist");
        assert_eq!(rule.replacement, "psycopg2-binary");
        assert!(substitution_for("requests").is_none());
    }

    #[test]
    fn test_import_alias_lookup() {
        assert_eq!(import_name_for("pyyaml"), Some("yaml"));
        assert_eq!(import_name_for("Pillow"), Some("PIL"));
        assert_eq!(import_name_for("requests"), None);
    }
}
