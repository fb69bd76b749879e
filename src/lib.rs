//! Djinn - movie recommendations and watch polls for chat channels
//!
//! Djinn answers chat commands such as `fetch 5 where rating > 8 and genres = comedy`
//! with random movies drawn from a local IMDb-derived dataset, and runs timed
//! polls where the channel votes on candidates with reactions.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the `MovieCatalog` / `Messenger` ports
//! - **Service Layer** (`services`): parsing, query compilation, per-channel
//!   scheduling and the fetch and poll workflows behind the `Dispatcher`
//! - **Adapters** (`adapters`): SQLite catalog, in-memory and console messengers
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use djinn::{ChannelId, Config, Dispatcher, InMemoryMessenger, SqliteMovieCatalog};
//!
//! let pool = djinn::adapters::sqlite::initialize_database(&config.database).await?;
//! let dispatcher = Dispatcher::from_config(
//!     Arc::new(SqliteMovieCatalog::new(pool)),
//!     Arc::new(InMemoryMessenger::new()),
//!     &config,
//! );
//! dispatcher.handle("fetch 3 where year > 2000", &ChannelId::from("movies")).await;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::messaging::{ConsoleMessenger, InMemoryMessenger};
pub use adapters::sqlite::SqliteMovieCatalog;
pub use domain::errors::{CommandError, ParseError, ValidationError};
pub use domain::models::{ChannelId, CompiledFilter, Config, Disjunction, MessageContent, Movie};
pub use domain::ports::{Messenger, MovieCatalog};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    ChannelScheduler, CommandRegistry, DispatchOutcome, Dispatcher, PollPhase, QueryCompiler,
};
