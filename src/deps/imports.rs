use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Standard-library module names excluded from third-party requirement
/// detection. Covers the common core; an unknown stdlib module simply shows
/// up as a (harmless) missing requirement.
const STANDARD_LIBRARY: &[&str] = &[
    "os", "sys", "subprocess", "datetime", "time", "json", "csv", "sqlite3", "math", "random",
    "collections", "itertools", "functools", "re", "uuid", "pathlib", "typing", "ast", "threading",
    "multiprocessing", "socket", "urllib", "http", "email", "smtplib", "ftplib", "zipfile",
    "tarfile", "configparser", "logging", "argparse", "shutil", "tempfile", "pickle", "base64",
    "hashlib", "hmac", "secrets", "getpass", "platform", "traceback", "warnings", "inspect", "gc",
    "weakref", "copy", "pprint", "io", "string", "enum", "abc", "dataclasses",
];

/// Static import scanner for Python sources. Walks `import X` and
/// `from X import ...` statements (indented statements included, matching a
/// full-tree AST walk), keeps the first dotted segment, lower-cases, and
/// subtracts the standard-library set. Never executes the script, so it is
/// safe on untrusted input.
pub struct ImportScanner {
    import_stmt: Regex,
    from_stmt: Regex,
}

impl ImportScanner {
    pub fn new() -> Self {
        Self {
            // "import a.b as c, d" anywhere a statement can start
            import_stmt: Regex::new(r"(?m)^\s*import\s+([A-Za-z_][A-Za-z0-9_.]*(?:\s*,\s*[A-Za-z_][A-Za-z0-9_.]*)*)").expect("static regex"),
            // "from a.b import c" (relative imports have no base module and are skipped)
            from_stmt: Regex::new(r"(?m)^\s*from\s+([A-Za-z_][A-Za-z0-9_.]*)\s+import")
                .expect("static regex"),
        }
    }

    /// Detect third-party imports in the script at `source_path`. Fails
    /// soft: an unreadable or undecodable script logs a warning and yields
    /// the empty set, so a broken script never blocks dependency analysis.
    pub fn detect_imports(&self, source_path: &Path) -> HashSet<String> {
        match std::fs::read_to_string(source_path) {
            Ok(content) => self.detect_in_source(&content),
            Err(e) => {
                warn!(path = %source_path.display(), error = %e, "could not read script for import analysis");
                HashSet::new()
            }
        }
    }

    /// Scan source text for third-party imports.
    pub fn detect_in_source(&self, content: &str) -> HashSet<String> {
        let mut imports = HashSet::new();

        for capture in self.import_stmt.captures_iter(content) {
            for name in capture[1].split(',') {
                if let Some(base) = Self::base_segment(name) {
                    imports.insert(base);
                }
            }
        }

        for capture in self.from_stmt.captures_iter(content) {
            if let Some(base) = Self::base_segment(&capture[1]) {
                imports.insert(base);
            }
        }

        for name in STANDARD_LIBRARY {
            imports.remove(*name);
        }

        imports
    }

    /// First dotted path segment, lower-cased: "matplotlib.pyplot" ->
    /// "matplotlib".
    fn base_segment(name: &str) -> Option<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }
        let base = trimmed.split('.').next().unwrap_or(trimmed);
        // Drop a trailing "as alias" if the comma split left one attached.
        let base = base.split_whitespace().next().unwrap_or(base);
        if base.is_empty() {
            None
        } else {
            Some(base.to_lowercase())
        }
    }
}

impl Default for ImportScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_import_keeps_base_segment() {
        let scanner = ImportScanner::new();
        let imports = scanner.detect_in_source("import matplotlib.pyplot as plt\nimport os\n");

        assert!(imports.contains("matplotlib"));
        assert!(!imports.contains("os"));
        assert_eq!(imports.len(), 1);
    }

    #[test]
    fn test_from_import_and_comma_list() {
        let scanner = ImportScanner::new();
        let source = "from pandas.io import parsers\nimport numpy, requests as r\n";
        let imports = scanner.detect_in_source(source);

        assert!(imports.contains("pandas"));
        assert!(imports.contains("numpy"));
        assert!(imports.contains("requests"));
    }

    #[test]
    fn test_indented_imports_are_detected() {
        let scanner = ImportScanner::new();
        let source = "def lazy():\n    import seaborn\n    return seaborn\n";
        let imports = scanner.detect_in_source(source);

        assert!(imports.contains("seaborn"));
    }

    #[test]
    fn test_relative_import_is_skipped() {
        let scanner = ImportScanner::new();
        let imports = scanner.detect_in_source("from . import helpers\nfrom .models import User\n");

        assert!(imports.is_empty());
    }

    #[test]
    fn test_names_are_lowercased() {
        let scanner = ImportScanner::new();
        let imports = scanner.detect_in_source("import Flask\n");

        assert!(imports.contains("flask"));
    }

    #[test]
    fn test_missing_file_fails_soft() {
        let scanner = ImportScanner::new();
        let imports = scanner.detect_imports(Path::new("/nonexistent/script.py"));

        assert!(imports.is_empty());
    }
}
