pub mod command;
pub mod config;
pub mod constraint;
pub mod filter;
pub mod message;
pub mod movie;

pub use command::{Command, CommandKind, CommandRequest};
pub use config::{CommandsConfig, Config, DatabaseConfig, LoggingConfig, PollConfig};
pub use constraint::{Atom, Conjunction, Disjunction};
pub use filter::{BoundValue, CompiledFilter};
pub use message::{ChannelId, MessageContent, MessageHandle, MovieCard, ReactionCounts};
pub use movie::Movie;
