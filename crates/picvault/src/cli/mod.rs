//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the picvault binary.

mod commands;
mod images;
mod tags;

pub use commands::{Cli, Commands};

use picvault::ImageService;

/// Dispatch a parsed command.
pub async fn handle_command(
    service: &ImageService,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Upload {
            directory,
            file,
            tags,
        } => images::upload(service, &directory, &file, tags).await,

        Commands::List {
            directory,
            tags,
            page,
            page_size,
            format,
        } => images::list(service, &directory, &tags, page, page_size, format).await,

        Commands::Show { id, format } => images::show(service, id, format).await,

        Commands::Delete { ids } => images::delete(service, &ids).await,

        Commands::Directories => images::directories(service).await,

        Commands::Tags(tag_cmd) => tags::handle_tag_command(service, tag_cmd).await,

        // Handled before the service is built
        Commands::Migrate => Ok(()),
    }
}
