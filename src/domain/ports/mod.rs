//! Port trait definitions (Hexagonal Architecture)
//!
//! The core depends on two external collaborators:
//! - MovieCatalog: random sampling and counting over the movie dataset
//! - Messenger: sending messages, reactions and replies to chat channels

pub mod messenger;
pub mod movie_catalog;

pub use messenger::Messenger;
pub use movie_catalog::MovieCatalog;
