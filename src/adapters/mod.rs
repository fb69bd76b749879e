//! Adapters for the collaborators behind the domain ports.

pub mod messaging;
pub mod sqlite;
