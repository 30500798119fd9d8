pub mod config;
pub mod orchestrator;
pub mod runner;

pub use config::ExecutionConfig;
pub use orchestrator::ExecutionOrchestrator;
pub use runner::{RunOutput, ScriptRunner};
