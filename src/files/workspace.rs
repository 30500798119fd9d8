use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Prefix for transient per-execution directories under the base output
/// dir. The permanent store lives under `permanent/` and never matches it.
const WORKSPACE_PREFIX: &str = "execution_";

/// Creates, snapshots, and tears down transient per-execution workspaces.
///
/// Workspace names are derived from `(execution_id, user_id)`, so
/// concurrent executions by different users, or of different executions,
/// never collide; that isolation is the only concurrency mechanism this
/// subsystem needs.
pub struct WorkspaceManager {
    base_dir: PathBuf,
}

impl WorkspaceManager {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn workspace_path(&self, execution_id: i64, user_id: i64) -> PathBuf {
        self.base_dir
            .join(format!("{}{}_{}", WORKSPACE_PREFIX, execution_id, user_id))
    }

    pub fn create_workspace(&self, execution_id: i64, user_id: i64) -> io::Result<PathBuf> {
        let workspace = self.workspace_path(execution_id, user_id);
        std::fs::create_dir_all(&workspace)?;
        debug!(workspace = %workspace.display(), "created execution workspace");
        Ok(workspace)
    }

    /// Record every regular file currently under `dir`. A missing directory
    /// snapshots as empty.
    pub fn snapshot(&self, dir: &Path) -> HashSet<PathBuf> {
        let mut files = HashSet::new();
        if !dir.exists() {
            return files;
        }
        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                files.insert(entry.into_path());
            }
        }
        files
    }

    /// Strict set difference: files present now that were absent from the
    /// pre-run snapshot. A file whose name is reused but whose content
    /// changed is not reported; this is a presence diff, not a content diff.
    pub fn new_files(&self, dir: &Path, before: &HashSet<PathBuf>) -> Vec<PathBuf> {
        let after = self.snapshot(dir);
        let mut created: Vec<PathBuf> = after.difference(before).cloned().collect();
        created.sort();
        created
    }

    /// Remove the workspace subtree. Idempotent: an already-absent
    /// workspace counts as cleaned. Failures are logged and reported as
    /// false, never raised; a response already otherwise complete must not
    /// be aborted by a cleanup error.
    pub fn cleanup(&self, dir: &Path) -> bool {
        if !dir.exists() {
            return true;
        }
        match std::fs::remove_dir_all(dir) {
            Ok(()) => {
                debug!(workspace = %dir.display(), "removed workspace");
                true
            }
            Err(e) => {
                warn!(workspace = %dir.display(), error = %e, "workspace cleanup failed");
                false
            }
        }
    }

    /// Remove workspace-prefixed directories whose modification time is
    /// older than the cutoff. Errors on individual directories are logged
    /// and do not stop the sweep. The permanent store is never eligible.
    pub fn gc_stale(&self, older_than_days: i64) -> usize {
        let cutoff = Utc::now() - Duration::days(older_than_days);
        let entries = match std::fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(base = %self.base_dir.display(), error = %e, "could not read base dir for GC");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !path.is_dir() || !name.starts_with(WORKSPACE_PREFIX) {
                continue;
            }

            match directory_mtime(&path) {
                Some(mtime) if mtime < cutoff => match std::fs::remove_dir_all(&path) {
                    Ok(()) => {
                        debug!(dir = %path.display(), "garbage-collected stale workspace");
                        removed += 1;
                    }
                    Err(e) => {
                        warn!(dir = %path.display(), error = %e, "failed to remove stale workspace");
                    }
                },
                Some(_) => {}
                None => {
                    warn!(dir = %path.display(), "could not stat directory during GC");
                }
            }
        }
        removed
    }
}

fn directory_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}
