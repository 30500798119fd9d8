pub mod dependency;
pub mod file;
pub mod outcome;

pub use dependency::{DependencyReport, SubstitutionRule};
pub use file::{AttachmentPayload, DownloadInfo, FileCategory, FileDescriptor, FileSummary};
pub use outcome::{ExecutionOutcome, FailureKind, RunRequest, SENTINEL_RETURN_CODE};
