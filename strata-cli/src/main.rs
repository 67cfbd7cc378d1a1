use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use strata_core::host::{ComponentProvider, PackageInfo};
use strata_provider_aws::component_provider;

const PROVIDER_NAME: &str = "strata-components";
const PROVIDER_VERSION: &str = "0.0.1";

#[derive(Parser)]
#[command(name = "strata-components")]
#[command(about = "Component provider serving SecureBucket", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. "info", "strata_core=debug")
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Handshake and serve requests on stdin/stdout (default)
    Serve,
    /// Print the package schema and exit
    Schema,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match init_tracing(&cli.log_level) {
        Ok(()) => run(cli.command.unwrap_or(Commands::Serve)).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries the protocol
fn init_tracing(log_level: &str) -> Result<(), String> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .map_err(|e| format!("invalid log level filter '{}': {}", log_level, e))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

async fn run(command: Commands) -> Result<(), String> {
    let provider = component_provider().map_err(|e| e.to_string())?;

    match command {
        Commands::Serve => run_serve(&provider).await,
        Commands::Schema => run_schema(&provider),
    }
}

async fn run_serve(provider: &ComponentProvider) -> Result<(), String> {
    provider
        .run(PROVIDER_NAME, PROVIDER_VERSION)
        .await
        .map_err(|e| e.to_string())
}

fn run_schema(provider: &ComponentProvider) -> Result<(), String> {
    let info = PackageInfo::new(PROVIDER_NAME, PROVIDER_VERSION);
    let schema = serde_json::to_string_pretty(&provider.schema(&info)).map_err(|e| e.to_string())?;
    println!("{}", schema);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::parse_from(["strata-components"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn log_level_is_global() {
        let cli = Cli::parse_from(["strata-components", "schema", "--log-level", "debug"]);
        assert!(matches!(cli.command, Some(Commands::Schema)));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn schema_command_succeeds() {
        let provider = component_provider().unwrap();
        assert!(run_schema(&provider).is_ok());
    }
}
