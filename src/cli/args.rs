use crate::error::OuttakeError;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "outtake")]
#[command(about = "Run a registered script in an isolated workspace and collect what it produces")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// Script to execute
    pub script: Option<PathBuf>,

    /// Argument string passed to the script: one literal value, or a JSON
    /// array for multiple arguments
    #[arg(short = 'a', long, default_value = "")]
    pub args: String,

    /// Declared requirements as a comma-separated list (e.g. "pandas,requests>=2.0")
    #[arg(short = 'r', long)]
    pub requirements: Option<String>,

    /// Install missing packages before running instead of only warning
    #[arg(long)]
    pub auto_install: bool,

    /// Base directory for workspaces and promoted output
    #[arg(short = 'o', long, default_value = "script_outputs", env = "OUTTAKE_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Wall-clock limit for the script run in seconds (1-300)
    #[arg(short = 't', long, default_value = "30")]
    pub timeout: u64,

    /// Python interpreter used for the run, pip queries, and verification
    #[arg(long, default_value = "python3", env = "OUTTAKE_INTERPRETER")]
    pub interpreter: String,

    /// Execution identifier; defaults to the current unix timestamp
    #[arg(long)]
    pub execution_id: Option<i64>,

    /// User identifier keyed into the workspace name
    #[arg(long, default_value = "0")]
    pub user_id: i64,

    /// Delete promoted files once the report has been printed
    #[arg(long, env = "OUTTAKE_CLEANUP_AFTER_REPORT")]
    pub cleanup_after_report: bool,

    /// Only analyze dependencies; do not run the script
    #[arg(long)]
    pub check_only: bool,

    /// Remove stale workspaces older than this many days, then exit
    #[arg(long)]
    pub gc_days: Option<i64>,

    /// Enable verbose output to stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse_args() -> Result<Self, OuttakeError> {
        let cli = Self::try_parse().map_err(|e| OuttakeError::InvalidArguments(e.to_string()))?;
        cli.validate()?;
        Ok(cli)
    }

    pub fn validate(&self) -> Result<(), OuttakeError> {
        if !(1..=300).contains(&self.timeout) {
            return Err(OuttakeError::InvalidArguments(
                "Timeout must be between 1 and 300 seconds".to_string(),
            ));
        }

        if let Some(days) = self.gc_days {
            // A zero or negative cutoff would sweep live workspaces.
            if days < 1 {
                return Err(OuttakeError::InvalidArguments(
                    "--gc-days must be at least 1".to_string(),
                ));
            }
        }

        if self.script.is_none() && self.gc_days.is_none() {
            return Err(OuttakeError::InvalidArguments(
                "A script path is required unless --gc-days is given".to_string(),
            ));
        }

        if self.interpreter.is_empty() {
            return Err(OuttakeError::ConfigError(
                "Interpreter cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn effective_execution_id(&self) -> i64 {
        self.execution_id
            .unwrap_or_else(|| chrono::Utc::now().timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli::try_parse_from(["outtake", "demo.py"]).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = base_cli();
        assert_eq!(cli.timeout, 30);
        assert_eq!(cli.interpreter, "python3");
        assert_eq!(cli.user_id, 0);
        assert!(!cli.auto_install);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_timeout_bounds() {
        let mut cli = base_cli();
        cli.timeout = 0;
        assert!(cli.validate().is_err());
        cli.timeout = 301;
        assert!(cli.validate().is_err());
        cli.timeout = 300;
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_script_required_without_gc_mode() {
        let cli = Cli::try_parse_from(["outtake"]).unwrap();
        assert!(cli.validate().is_err());

        let gc = Cli::try_parse_from(["outtake", "--gc-days", "30"]).unwrap();
        assert!(gc.validate().is_ok());
    }

    #[test]
    fn test_gc_days_must_be_positive() {
        let zero = Cli::try_parse_from(["outtake", "--gc-days", "0"]).unwrap();
        assert!(zero.validate().is_err());

        let negative = Cli::try_parse_from(["outtake", "--gc-days=-1"]).unwrap();
        assert!(negative.validate().is_err());

        let one = Cli::try_parse_from(["outtake", "--gc-days", "1"]).unwrap();
        assert!(one.validate().is_ok());
    }

    #[test]
    fn test_execution_id_falls_back_to_timestamp() {
        let mut cli = base_cli();
        cli.execution_id = Some(17);
        assert_eq!(cli.effective_execution_id(), 17);

        cli.execution_id = None;
        assert!(cli.effective_execution_id() > 0);
    }
}
