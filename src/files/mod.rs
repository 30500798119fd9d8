pub mod classifier;
pub mod storage;
pub mod workspace;

pub use classifier::FileClassifier;
pub use storage::StoragePromoter;
pub use workspace::WorkspaceManager;
