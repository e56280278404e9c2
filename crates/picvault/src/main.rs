//! Picvault CLI binary.
//!
//! This binary provides command-line access to the catalogue:
//! - Upload, list and delete images
//! - Manage tags
//! - Apply database migrations

use clap::Parser;
use picvault::{ImageService, PgMetadataRepository, PicvaultConfig, init_tracing};
use std::sync::Arc;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, handle_command};

    let _ = dotenvy::dotenv();

    // Parse command-line arguments
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs)?;

    let config = match &cli.config {
        Some(path) => PicvaultConfig::from_file(path)?,
        None => PicvaultConfig::load()?,
    };

    let repo = PgMetadataRepository::connect(
        config.require_database_url()?,
        *config.database().max_connections(),
    )?;

    if let Commands::Migrate = cli.command {
        let applied = repo.migrate().await?;
        println!("Applied {} migration(s)", applied);
        return Ok(());
    }

    let service = ImageService::from_config(&config, Arc::new(repo))?;
    handle_command(&service, cli.command).await
}
