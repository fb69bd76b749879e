//! Error taxonomy for the Djinn command engine.
//!
//! Every variant of [`CommandError`] is user-facing: the dispatcher turns it
//! into a chat reply through [`CommandError::user_message`] and never lets it
//! escape further.

use thiserror::Error;

use super::models::ChannelId;

/// Malformed command text or filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected `field operator value` but `{atom}` has {found} token(s)")]
    MalformedAtom { atom: String, found: usize },

    #[error("`and`/`or` must sit between two comparisons")]
    EmptyConjunction,

    #[error("`where` must be followed by a filter expression")]
    MissingExpression,

    #[error("unexpected `{0}`, expected an amount or `where`")]
    UnexpectedToken(String),
}

/// Well-formed input that breaks a rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("amount {amount} is out of range, pick a number from {min} to {max}")]
    AmountOutOfRange { amount: i64, min: u32, max: u32 },

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("unknown operator `{0}`")]
    UnknownOperator(String),

    #[error("`{field}` only supports `=`, not `{operator}`")]
    UnsupportedOperator { field: String, operator: String },

    #[error("`{value}` is not a number (field `{field}`)")]
    InvalidNumber { field: String, value: String },
}

/// Errors raised by a [`MovieCatalog`](super::ports::MovieCatalog).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt movie record {tconst}: {reason}")]
    CorruptRecord { tconst: String, reason: String },

    #[error("Filter has {placeholders} placeholders but {values} values")]
    MismatchedBindings { placeholders: usize, values: usize },
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Errors raised by a [`Messenger`](super::ports::Messenger).
#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("Failed to send to {channel}: {reason}")]
    SendFailed { channel: ChannelId, reason: String },

    #[error("Message {0} not found")]
    MessageNotFound(u64),
}

/// Everything that can stop a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Channel {0} is already running a command")]
    Busy(ChannelId),

    #[error("No movies matched the filter")]
    EmptyResult,

    #[error("Command was cancelled")]
    Cancelled,

    #[error("Collaborator failure: {0}")]
    Collaborator(String),
}

impl CommandError {
    /// Chat reply describing the error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Parse(err) => format!(
                "I could not read that: {err}. Filters look like `where rating > 8 and genres = comedy`."
            ),
            Self::Validation(err) => format!("That will not work: {err}."),
            Self::Busy(_) => {
                "I can only do one task at a time in this channel. Say `cancel` to stop the current one."
                    .to_string()
            }
            Self::EmptyResult => "No movies matched that filter.".to_string(),
            Self::Cancelled => "Cancelled.".to_string(),
            Self::Collaborator(_) => "Something went wrong on my side, please try again.".to_string(),
        }
    }

    /// Errors caused by the user's input rather than by the bot.
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Validation(_) | Self::Busy(_))
    }
}

impl From<CatalogError> for CommandError {
    fn from(err: CatalogError) -> Self {
        Self::Collaborator(err.to_string())
    }
}

impl From<MessengerError> for CommandError {
    fn from(err: MessengerError) -> Self {
        Self::Collaborator(err.to_string())
    }
}

pub type CommandResult<T> = Result<T, CommandError>;
