use crate::models::{AttachmentPayload, DownloadInfo};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Moves execution output from transient workspaces into durable
/// per-execution storage and mediates later access to it.
pub struct StoragePromoter {
    base_dir: PathBuf,
}

impl StoragePromoter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn permanent_dir(&self, execution_id: i64) -> PathBuf {
        self.base_dir.join("permanent").join(execution_id.to_string())
    }

    /// Copy (never move) every file from the still-live workspace into the
    /// permanent directory for this execution, preserving relative
    /// subdirectory structure.
    pub fn promote(&self, workspace: &Path, execution_id: i64) -> io::Result<PathBuf> {
        let permanent = self.permanent_dir(execution_id);
        std::fs::create_dir_all(&permanent)?;

        if workspace.exists() {
            for entry in WalkDir::new(workspace).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = match entry.path().strip_prefix(workspace) {
                    Ok(relative) => relative,
                    Err(_) => continue,
                };
                let target = permanent.join(relative);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::copy(entry.path(), &target)?;
            }
        }

        debug!(execution_id, permanent = %permanent.display(), "promoted output files");
        Ok(permanent)
    }

    /// Delete the durable store for one execution. "Already absent" is
    /// success so the call is idempotent; any other failure is logged and
    /// reported as false for the caller to surface as a soft warning.
    pub fn cleanup_execution(&self, execution_id: i64) -> bool {
        let permanent = self.permanent_dir(execution_id);
        if !permanent.exists() {
            debug!(execution_id, "no stored files to clean up");
            return true;
        }
        match std::fs::remove_dir_all(&permanent) {
            Ok(()) => {
                debug!(execution_id, "cleaned up stored execution files");
                true
            }
            Err(e) => {
                warn!(execution_id, error = %e, "failed to clean up stored execution files");
                false
            }
        }
    }

    /// Resolve a stored file for download. The canonicalized result must
    /// still be inside the owning permanent directory; a traversal attempt
    /// resolves to None exactly like a missing file, so existence is never
    /// leaked.
    pub fn download_info(&self, execution_id: i64, relative_path: &str) -> Option<DownloadInfo> {
        let permanent = self.permanent_dir(execution_id);
        let requested = permanent.join(relative_path);

        if !requested.is_file() {
            return None;
        }

        let permanent_real = permanent.canonicalize().ok()?;
        let requested_real = requested.canonicalize().ok()?;
        if !requested_real.starts_with(&permanent_real) {
            warn!(execution_id, path = relative_path, "rejected path escaping permanent store");
            return None;
        }

        let size_bytes = std::fs::metadata(&requested_real).ok()?.len();
        Some(DownloadInfo {
            name: requested_real
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            mime_type: mime_guess::from_path(&requested_real)
                .first_raw()
                .unwrap_or("application/octet-stream")
                .to_string(),
            size_bytes,
            path: requested_real,
        })
    }

    /// Read a stored file into a base64 payload sized for an email
    /// attachment. Files above the cap, and any read failure, yield None.
    pub fn attachment_payload(&self, path: &Path, max_size_mb: u64) -> Option<AttachmentPayload> {
        let size_bytes = std::fs::metadata(path).ok()?.len();
        if size_bytes > max_size_mb * 1024 * 1024 {
            return None;
        }

        let content = std::fs::read(path).ok()?;
        Some(AttachmentPayload {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            content_base64: BASE64.encode(content),
            mime_type: mime_guess::from_path(path)
                .first_raw()
                .unwrap_or("application/octet-stream")
                .to_string(),
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_promote_preserves_relative_structure() {
        let base = TempDir::new().unwrap();
        let promoter = StoragePromoter::new(base.path());

        let workspace = base.path().join("execution_1_1");
        std::fs::create_dir_all(workspace.join("charts")).unwrap();
        std::fs::write(workspace.join("report.txt"), "summary").unwrap();
        std::fs::write(workspace.join("charts/plot.png"), "png").unwrap();

        let permanent = promoter.promote(&workspace, 1).unwrap();

        assert!(permanent.join("report.txt").is_file());
        assert!(permanent.join("charts/plot.png").is_file());
        // Copy, not move: the workspace keeps its files.
        assert!(workspace.join("report.txt").is_file());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let base = TempDir::new().unwrap();
        let promoter = StoragePromoter::new(base.path());

        let permanent = promoter.permanent_dir(3);
        std::fs::create_dir_all(&permanent).unwrap();
        std::fs::write(permanent.join("out.csv"), "x").unwrap();

        assert!(promoter.cleanup_execution(3));
        assert!(!permanent.exists());
        // Second call finds nothing and still succeeds.
        assert!(promoter.cleanup_execution(3));
    }

    #[test]
    fn test_download_info_for_stored_file() {
        let base = TempDir::new().unwrap();
        let promoter = StoragePromoter::new(base.path());

        let permanent = promoter.permanent_dir(4);
        std::fs::create_dir_all(&permanent).unwrap();
        std::fs::write(permanent.join("result.json"), "{}").unwrap();

        let info = promoter.download_info(4, "result.json").expect("stored file");
        assert_eq!(info.name, "result.json");
        assert_eq!(info.mime_type, "application/json");
        assert_eq!(info.size_bytes, 2);
    }

    #[test]
    fn test_traversal_attempt_is_not_found() {
        let base = TempDir::new().unwrap();
        let promoter = StoragePromoter::new(base.path());
        std::fs::create_dir_all(promoter.permanent_dir(5)).unwrap();

        assert!(promoter.download_info(5, "../../etc/passwd").is_none());
        assert!(promoter.download_info(5, "../5/../../x").is_none());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let base = TempDir::new().unwrap();
        let promoter = StoragePromoter::new(base.path());
        assert!(promoter.download_info(99, "anything.txt").is_none());
    }

    #[test]
    fn test_attachment_payload_respects_size_cap() {
        let base = TempDir::new().unwrap();
        let promoter = StoragePromoter::new(base.path());

        let small = base.path().join("small.txt");
        std::fs::write(&small, "attach me").unwrap();

        let payload = promoter.attachment_payload(&small, 10).expect("small file");
        assert_eq!(payload.filename, "small.txt");
        assert_eq!(payload.size_bytes, 9);

        // Cap of zero megabytes refuses everything non-empty.
        assert!(promoter.attachment_payload(&small, 0).is_none());
    }
}
