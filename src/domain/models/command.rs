use std::fmt;

use serde::{Deserialize, Serialize};

use super::constraint::Disjunction;
use super::filter::CompiledFilter;

/// Commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Publish random matching movies, no voting.
    Fetch,
    /// Publish candidates, wait, tally votes and announce a winner.
    Poll,
    /// Cancel whatever is running in the channel.
    Cancel,
    /// Describe the command grammar.
    Help,
}

impl CommandKind {
    pub const ALL: [Self; 4] = [Self::Fetch, Self::Poll, Self::Cancel, Self::Help];

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Poll => "poll",
            Self::Cancel => "cancel",
            Self::Help => "help",
        }
    }

    /// Whether the command occupies the channel slot while it runs.
    pub const fn needs_slot(self) -> bool {
        matches!(self, Self::Fetch | Self::Poll)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A recognized command with its arguments, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub kind: CommandKind,
    pub amount: Option<i64>,
    pub expression: Option<Disjunction>,
}

impl CommandRequest {
    pub const fn bare(kind: CommandKind) -> Self {
        Self {
            kind,
            amount: None,
            expression: None,
        }
    }
}

/// A validated command ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub amount: u32,
    pub filter: CompiledFilter,
}
