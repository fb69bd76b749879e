//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::chat::ChatArgs;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::query::QueryArgs;
use crate::infrastructure::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "djinn")]
#[command(about = "Djinn - movie recommendations and watch polls", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the project directory, configuration and movie database
    Init(InitArgs),

    /// Run a filter expression against the movie database
    Query(QueryArgs),

    /// Talk to the bot from the terminal
    Chat(ChatArgs),
}
