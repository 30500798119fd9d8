pub mod diagnostics;
pub mod imports;
pub mod installer;
pub mod resolver;

pub use imports::ImportScanner;
pub use installer::{InstallOutcome, PackageInstaller};
pub use resolver::PackageResolver;
