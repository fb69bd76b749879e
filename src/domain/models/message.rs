//! Chat-side value types shared by the core and the messaging adapters.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a conversation channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Reference to a message published by the messaging collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    pub channel: ChannelId,
    pub id: u64,
}

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel, self.id)
    }
}

/// Rich card describing one movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieCard {
    /// `Title (Year)`
    pub heading: String,
    /// Link to the title page.
    pub description: String,
    pub image_url: Option<String>,
    /// Short stats line (rating, votes, runtime, genres).
    pub footer: Option<String>,
}

/// What gets sent to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageContent {
    Text(String),
    Movie(MovieCard),
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Heading of a movie card, if this is one.
    pub fn movie_heading(&self) -> Option<&str> {
        match self {
            Self::Movie(card) => Some(&card.heading),
            Self::Text(_) => None,
        }
    }
}

/// Reaction symbol -> number of users who reacted with it.
pub type ReactionCounts = HashMap<String, u64>;
