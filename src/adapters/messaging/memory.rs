//! In-process messenger that records everything it is asked to publish.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::MessengerError;
use crate::domain::models::{ChannelId, MessageContent, MessageHandle, ReactionCounts};
use crate::domain::ports::Messenger;
use crate::services::movie_card::render_plain;

/// A message published through the [`InMemoryMessenger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub handle: MessageHandle,
    pub content: MessageContent,
    /// Id of the message this one replies to.
    pub reply_to: Option<u64>,
}

#[derive(Default)]
struct State {
    messages: Vec<SentMessage>,
    reactions: HashMap<u64, ReactionCounts>,
}

/// Messenger backed by process memory.
///
/// Reactions added through [`Messenger::add_reaction`] count like any other
/// user's, the same way chat networks include the bot's own reaction.
#[derive(Clone)]
pub struct InMemoryMessenger {
    state: Arc<RwLock<State>>,
    next_id: Arc<AtomicU64>,
    fail_sends: Arc<AtomicBool>,
}

impl Default for InMemoryMessenger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessenger {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            next_id: Arc::new(AtomicU64::new(1)),
            fail_sends: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every following send and reply fail.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// All published messages in publication order.
    pub async fn messages(&self) -> Vec<SentMessage> {
        self.state.read().await.messages.clone()
    }

    pub async fn messages_in(&self, channel: &ChannelId) -> Vec<SentMessage> {
        let state = self.state.read().await;
        state
            .messages
            .iter()
            .filter(|m| &m.handle.channel == channel)
            .cloned()
            .collect()
    }

    /// Plain-text rendering of every message in `channel`.
    pub async fn texts_in(&self, channel: &ChannelId) -> Vec<String> {
        self.messages_in(channel)
            .await
            .iter()
            .map(|m| render_plain(&m.content))
            .collect()
    }

    /// Movie cards published in `channel`.
    pub async fn cards_in(&self, channel: &ChannelId) -> Vec<SentMessage> {
        self.messages_in(channel)
            .await
            .into_iter()
            .filter(|m| m.content.movie_heading().is_some())
            .collect()
    }

    pub async fn replies_to(&self, id: u64) -> Vec<SentMessage> {
        let state = self.state.read().await;
        state
            .messages
            .iter()
            .filter(|m| m.reply_to == Some(id))
            .cloned()
            .collect()
    }

    pub async fn find(&self, id: u64) -> Option<SentMessage> {
        let state = self.state.read().await;
        state.messages.iter().find(|m| m.handle.id == id).cloned()
    }

    /// Add one user reaction with `symbol` to message `id`.
    pub async fn add_vote(&self, id: u64, symbol: &str) -> Result<u64, MessengerError> {
        let mut state = self.state.write().await;
        let counts = state
            .reactions
            .get_mut(&id)
            .ok_or(MessengerError::MessageNotFound(id))?;
        let count = counts.entry(symbol.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    /// Overwrite the count of `symbol` on message `id`.
    pub async fn set_reaction_count(&self, id: u64, symbol: &str, count: u64) -> Result<(), MessengerError> {
        let mut state = self.state.write().await;
        let counts = state
            .reactions
            .get_mut(&id)
            .ok_or(MessengerError::MessageNotFound(id))?;
        counts.insert(symbol.to_string(), count);
        Ok(())
    }

    async fn publish(
        &self,
        channel: &ChannelId,
        content: MessageContent,
        reply_to: Option<u64>,
    ) -> Result<MessageHandle, MessengerError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(MessengerError::SendFailed {
                channel: channel.clone(),
                reason: "transport unavailable".to_string(),
            });
        }

        let handle = MessageHandle {
            channel: channel.clone(),
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
        };
        let mut state = self.state.write().await;
        state.reactions.insert(handle.id, ReactionCounts::new());
        state.messages.push(SentMessage {
            handle: handle.clone(),
            content,
            reply_to,
        });
        Ok(handle)
    }
}

#[async_trait]
impl Messenger for InMemoryMessenger {
    async fn send(
        &self,
        channel: &ChannelId,
        content: MessageContent,
    ) -> Result<MessageHandle, MessengerError> {
        self.publish(channel, content, None).await
    }

    async fn add_reaction(&self, message: &MessageHandle, symbol: &str) -> Result<(), MessengerError> {
        self.add_vote(message.id, symbol).await.map(|_| ())
    }

    async fn fetch_reaction_counts(
        &self,
        message: &MessageHandle,
    ) -> Result<ReactionCounts, MessengerError> {
        let state = self.state.read().await;
        state
            .reactions
            .get(&message.id)
            .cloned()
            .ok_or(MessengerError::MessageNotFound(message.id))
    }

    async fn reply(&self, message: &MessageHandle, text: &str) -> Result<MessageHandle, MessengerError> {
        self.publish(&message.channel, MessageContent::text(text), Some(message.id))
            .await
    }
}
