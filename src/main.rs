use outtake::{
    cli::{Cli, CliHandler},
    error::OuttakeError,
};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("❌ Argument parsing failed: {}", e);
            process::exit(2);
        }
    };

    let handler = CliHandler::new(cli);

    let exit_code = match handler.run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ Execution failed: {}", e);
            match e {
                OuttakeError::InvalidArguments(_) | OuttakeError::ConfigError(_) => 2,
                OuttakeError::InterpreterNotFound { .. } => 6,
                _ => 1,
            }
        }
    };

    process::exit(exit_code);
}
