use crate::models::{FileCategory, FileDescriptor, FileSummary};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Ordered category table: the first entry whose extension list matches
/// wins, so `.png` classifies as an image even though charts also list it.
const CATEGORY_TABLE: &[(FileCategory, &[&str])] = &[
    (
        FileCategory::Images,
        &[".png", ".jpg", ".jpeg", ".gif", ".bmp", ".tiff", ".svg"],
    ),
    (
        FileCategory::Documents,
        &[".pdf", ".doc", ".docx", ".txt", ".rtf"],
    ),
    (
        FileCategory::Data,
        &[".csv", ".xlsx", ".xls", ".json", ".xml", ".tsv"],
    ),
    (FileCategory::Charts, &[".png", ".jpg", ".svg", ".html"]),
    (FileCategory::Reports, &[".html", ".pdf", ".md"]),
];

/// Extensions safe to render inline in a browser.
const VIEWABLE_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".txt", ".html", ".json", ".csv",
];

const HASH_CHUNK_SIZE: usize = 4096;
const HASH_PREFIX_LEN: usize = 16;

/// Classifies discovered output files: category, MIME type, human size,
/// truncated content hash, viewability. Stateless; construct per call or
/// share freely.
pub struct FileClassifier;

impl FileClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Lower-cased extension with leading dot, or empty for none.
    pub fn extension_of(path: &Path) -> String {
        path.extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default()
    }

    /// Allow-list gate: only extensions named by some category, or files
    /// with no extension at all, are eligible for scanning. Everything
    /// else is silently excluded.
    pub fn is_allowed(&self, path: &Path) -> bool {
        let extension = Self::extension_of(path);
        extension.is_empty()
            || CATEGORY_TABLE
                .iter()
                .any(|(_, extensions)| extensions.contains(&extension.as_str()))
    }

    pub fn categorize(&self, extension: &str) -> FileCategory {
        for (category, extensions) in CATEGORY_TABLE {
            if extensions.contains(&extension) {
                return *category;
            }
        }
        FileCategory::Other
    }

    /// Binary-prefix size: B -> KB -> MB -> GB, one decimal, stopping at GB.
    pub fn format_size(size_bytes: u64) -> String {
        if size_bytes == 0 {
            return "0 B".to_string();
        }
        const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
        let mut size = size_bytes as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }
        format!("{:.1} {}", size, UNITS[unit])
    }

    /// Chunked SHA-256 over the whole file, truncated to 16 hex chars.
    /// "unknown" on read failure.
    pub fn content_hash(path: &Path) -> String {
        let mut file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(_) => return "unknown".to_string(),
        };
        let mut hasher = Sha256::new();
        let mut chunk = [0u8; HASH_CHUNK_SIZE];
        loop {
            match file.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => hasher.update(&chunk[..n]),
                Err(_) => return "unknown".to_string(),
            }
        }
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        hex[..HASH_PREFIX_LEN].to_string()
    }

    pub fn is_viewable(&self, extension: &str, mime_type: &str) -> bool {
        VIEWABLE_EXTENSIONS.contains(&extension)
            || mime_type.starts_with("text/")
            || mime_type.starts_with("image/")
    }

    /// Build the descriptor for one file. Stat or hash failure degrades to
    /// a `category = Error` descriptor rather than aborting the scan.
    pub fn analyze_file(&self, path: &Path, owning_dir: &Path) -> FileDescriptor {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                return FileDescriptor::degraded(path, format!("Failed to analyze file: {}", e))
            }
        };

        let extension = Self::extension_of(path);
        let category = self.categorize(&extension);
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();

        // The relative path is anchored to the owning directory; a file
        // outside it would be a walk bug, so fall back to the bare name.
        let relative_path = path
            .strip_prefix(owning_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));

        FileDescriptor {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            relative_path,
            absolute_path: path.to_path_buf(),
            size_bytes: metadata.len(),
            size_human: Self::format_size(metadata.len()),
            extension: extension.clone(),
            category,
            mime_type: mime_type.clone(),
            created_at: metadata.created().ok().map(DateTime::<Utc>::from),
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            content_hash: Self::content_hash(path),
            is_viewable: self.is_viewable(&extension, &mime_type),
            is_downloadable: true,
            error: None,
        }
    }

    /// Scan a directory for output files: every regular file (or, when a
    /// pre-run snapshot is given, only files absent from it) that passes
    /// the allow-list gate, described and sorted by name for deterministic
    /// display.
    pub fn scan_for_output_files(
        &self,
        dir: &Path,
        before: Option<&HashSet<PathBuf>>,
    ) -> Vec<FileDescriptor> {
        if !dir.exists() {
            return Vec::new();
        }

        let mut descriptors: Vec<FileDescriptor> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| before.map_or(true, |snapshot| !snapshot.contains(path)))
            .filter(|path| self.is_allowed(path))
            .map(|path| self.analyze_file(&path, dir))
            .collect();

        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(dir = %dir.display(), count = descriptors.len(), "scanned output files");
        descriptors
    }

    /// Aggregate counts and sizes over a scan result.
    pub fn summarize(&self, files: &[FileDescriptor]) -> FileSummary {
        if files.is_empty() {
            return FileSummary::empty();
        }

        let mut summary = FileSummary::empty();
        summary.total_count = files.len();
        for file in files {
            *summary.per_category_counts.entry(file.category).or_insert(0) += 1;
            summary.total_size_bytes += file.size_bytes;
        }
        summary.total_size_human = Self::format_size(summary.total_size_bytes);
        summary
    }
}

impl Default for FileClassifier {
    fn default() -> Self {
        Self::new()
    }
}
