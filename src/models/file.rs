use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Images,
    Documents,
    Data,
    Charts,
    Reports,
    Other,
    Error,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Images => "images",
            FileCategory::Documents => "documents",
            FileCategory::Data => "data",
            FileCategory::Charts => "charts",
            FileCategory::Reports => "reports",
            FileCategory::Other => "other",
            FileCategory::Error => "error",
        }
    }
}

/// Metadata record for one file discovered under a workspace or permanent
/// directory at scan time. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    /// Path relative to the owning directory. Always resolves inside it.
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    pub size_bytes: u64,
    pub size_human: String,
    pub extension: String,
    pub category: FileCategory,
    pub mime_type: String,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    /// First 16 hex chars of the SHA-256 of the content. A short integrity
    /// fingerprint, not a collision-resistant identifier.
    pub content_hash: String,
    pub is_viewable: bool,
    pub is_downloadable: bool,
    /// Set only on degraded descriptors where the file could not be read.
    pub error: Option<String>,
}

impl FileDescriptor {
    /// Degraded descriptor for a file that could not be analyzed. One bad
    /// file must not abort the whole scan.
    pub fn degraded(path: &std::path::Path, message: String) -> Self {
        Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            relative_path: path.to_path_buf(),
            absolute_path: path.to_path_buf(),
            size_bytes: 0,
            size_human: "0 B".to_string(),
            extension: String::new(),
            category: FileCategory::Error,
            mime_type: "application/octet-stream".to_string(),
            created_at: None,
            modified_at: None,
            content_hash: "unknown".to_string(),
            is_viewable: false,
            is_downloadable: false,
            error: Some(message),
        }
    }
}

/// Aggregate over a list of descriptors, recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub total_count: usize,
    pub per_category_counts: BTreeMap<FileCategory, usize>,
    pub total_size_bytes: u64,
    pub total_size_human: String,
}

impl FileSummary {
    pub fn empty() -> Self {
        Self {
            total_count: 0,
            per_category_counts: BTreeMap::new(),
            total_size_bytes: 0,
            total_size_human: "0 B".to_string(),
        }
    }
}

/// Resolved location of a promoted file requested for download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadInfo {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

/// Base64-encoded file body sized for an email attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentPayload {
    pub filename: String,
    pub content_base64: String,
    pub mime_type: String,
    pub size_bytes: u64,
}
