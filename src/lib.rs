pub mod cli;
pub mod deps;
pub mod error;
pub mod executor;
pub mod files;
pub mod models;

pub use error::OuttakeError;

// Re-export commonly used types
pub use models::{
    DependencyReport, DownloadInfo, ExecutionOutcome, FailureKind, FileCategory, FileDescriptor,
    FileSummary, RunRequest,
};

pub use deps::{ImportScanner, InstallOutcome, PackageInstaller, PackageResolver};
pub use executor::{ExecutionConfig, ExecutionOrchestrator};
pub use files::{FileClassifier, StoragePromoter, WorkspaceManager};

pub use cli::CliHandler;
