//! Domain layer for Djinn
//!
//! Models, the error taxonomy and the port traits the core depends on.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{
    CatalogError, CommandError, CommandResult, MessengerError, ParseError, ValidationError,
};
