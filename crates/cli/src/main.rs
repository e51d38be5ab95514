//! GreenCart CLI - Database migrations and fixture seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! gc-cli migrate
//!
//! # Seed catalog, users and addresses
//! gc-cli seed -f crates/cli/fixtures.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Upsert products, users and addresses from YAML

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gc-cli")]
#[command(author, version, about = "GreenCart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database from a YAML fixtures file
    Seed {
        /// Path to the fixtures file
        #[arg(short, long, default_value = "crates/cli/fixtures.yaml")]
        file: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => {
            commands::seed::run(&file).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_seed_file_flag() {
        let cli = Cli::try_parse_from(["gc-cli", "seed", "-f", "data.yaml"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Seed { file }) if file == "data.yaml"
        ));
    }
}
