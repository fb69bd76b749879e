//! Messenger implementations.

pub mod console;
pub mod memory;

pub use console::ConsoleMessenger;
pub use memory::{InMemoryMessenger, SentMessage};
