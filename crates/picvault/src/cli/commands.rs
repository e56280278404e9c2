//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Picvault - content-addressed image catalogue with tag queries
#[derive(Parser, Debug)]
#[command(name = "picvault")]
#[command(about = "Content-addressed image catalogue with thumbnails and tag queries", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true, env = "PICVAULT_LOG_JSON")]
    pub json_logs: bool,

    /// Configuration file to use instead of the layered defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload an image into a directory
    Upload {
        /// Target directory
        directory: String,

        /// Image file to upload
        file: PathBuf,

        /// Comma-separated tag names, used verbatim
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// List images in a directory
    List {
        /// Directory to list
        directory: String,

        /// Only images carrying all of these comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: i64,

        /// Images per page
        #[arg(long, default_value = "10")]
        page_size: i64,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Show one image with its URLs and tags
    Show {
        /// Image id
        id: i64,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Delete images and their blobs
    Delete {
        /// Image ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// List directories
    Directories,

    /// Tag management commands
    #[command(subcommand)]
    Tags(TagCommands),

    /// Apply pending database migrations
    Migrate,
}

/// Tag management subcommands
#[derive(Subcommand, Debug)]
pub enum TagCommands {
    /// List all tags, oldest first
    List,

    /// Create a tag
    Create {
        /// Tag name
        name: String,
    },

    /// Rename a tag
    Rename {
        /// Tag id
        id: i64,

        /// New name
        name: String,
    },

    /// Delete a tag and its links
    Delete {
        /// Tag id
        id: i64,
    },

    /// Attach tags to images, creating missing tags
    Attach {
        /// Tag names
        #[arg(required = true)]
        names: Vec<String>,

        /// Comma-separated image ids
        #[arg(long, value_delimiter = ',', required = true)]
        images: Vec<i64>,
    },

    /// Replace all tags of an image
    Replace {
        /// Image id
        id: i64,

        /// New tag names
        names: Vec<String>,
    },
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
