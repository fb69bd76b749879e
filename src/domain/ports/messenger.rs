use async_trait::async_trait;

use crate::domain::errors::MessengerError;
use crate::domain::models::{ChannelId, MessageContent, MessageHandle, ReactionCounts};

/// Outbound side of the chat network.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Publish `content` in `channel`.
    async fn send(
        &self,
        channel: &ChannelId,
        content: MessageContent,
    ) -> Result<MessageHandle, MessengerError>;

    /// React to a published message with `symbol`.
    async fn add_reaction(&self, message: &MessageHandle, symbol: &str) -> Result<(), MessengerError>;

    /// Current reaction counts of a published message.
    async fn fetch_reaction_counts(
        &self,
        message: &MessageHandle,
    ) -> Result<ReactionCounts, MessengerError>;

    /// Reply to a published message.
    async fn reply(&self, message: &MessageHandle, text: &str) -> Result<MessageHandle, MessengerError>;
}
