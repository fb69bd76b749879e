//! Terminal transport for `djinn chat`.

use async_trait::async_trait;
use console::style;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::errors::MessengerError;
use crate::domain::models::{ChannelId, MessageContent, MessageHandle, ReactionCounts};
use crate::domain::ports::Messenger;
use crate::services::movie_card::{integer_to_keycap, render_plain};

use super::memory::InMemoryMessenger;

/// Echoes every outbound message to stdout and keeps the state in an
/// [`InMemoryMessenger`] so votes can be cast from the prompt.
///
/// Consecutive movie cards in a channel are numbered 1️⃣, 2️⃣… by position;
/// any text message restarts the count.
#[derive(Clone, Default)]
pub struct ConsoleMessenger {
    store: InMemoryMessenger,
    vote_symbol: String,
    positions: Arc<Mutex<HashMap<ChannelId, u32>>>,
}

impl ConsoleMessenger {
    pub fn new(vote_symbol: impl Into<String>) -> Self {
        Self {
            store: InMemoryMessenger::new(),
            vote_symbol: vote_symbol.into(),
            positions: Arc::default(),
        }
    }

    pub const fn store(&self) -> &InMemoryMessenger {
        &self.store
    }

    /// Vote for message `id` with the configured vote symbol.
    pub async fn cast_vote(&self, id: u64) -> Result<u64, MessengerError> {
        self.store.add_vote(id, &self.vote_symbol).await
    }

    /// Position of `content` among the consecutive cards of `channel`.
    fn next_position(&self, channel: &ChannelId, content: &MessageContent) -> Option<u32> {
        let mut positions = self.positions.lock().unwrap_or_else(PoisonError::into_inner);
        match content {
            MessageContent::Movie(_) => {
                let position = positions.entry(channel.clone()).or_insert(0);
                *position += 1;
                Some(*position)
            }
            MessageContent::Text(_) => {
                positions.remove(channel);
                None
            }
        }
    }

    fn print(handle: &MessageHandle, content: &MessageContent, position: Option<u32>, reply_to: Option<u64>) {
        let prefix = format!("{} [#{}]", handle.channel, handle.id);
        let body = render_plain(content);
        let body = match position {
            Some(n) => style(format!("{} {body}", integer_to_keycap(n))).cyan().to_string(),
            None => body,
        };
        match reply_to {
            Some(id) => println!("{} {} {}", style(prefix).dim(), style(format!("(re {id})")).yellow(), body),
            None => println!("{} {}", style(prefix).dim(), body),
        }
    }
}

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn send(
        &self,
        channel: &ChannelId,
        content: MessageContent,
    ) -> Result<MessageHandle, MessengerError> {
        let handle = self.store.send(channel, content.clone()).await?;
        let position = self.next_position(channel, &content);
        Self::print(&handle, &content, position, None);
        Ok(handle)
    }

    async fn add_reaction(&self, message: &MessageHandle, symbol: &str) -> Result<(), MessengerError> {
        self.store.add_reaction(message, symbol).await
    }

    async fn fetch_reaction_counts(
        &self,
        message: &MessageHandle,
    ) -> Result<ReactionCounts, MessengerError> {
        self.store.fetch_reaction_counts(message).await
    }

    async fn reply(&self, message: &MessageHandle, text: &str) -> Result<MessageHandle, MessengerError> {
        let handle = self.store.reply(message, text).await?;
        Self::print(&handle, &MessageContent::text(text), None, Some(message.id));
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Movie;
    use crate::services::movie_card::card_for;

    #[tokio::test]
    async fn test_cast_vote_uses_vote_symbol() {
        let messenger = ConsoleMessenger::new("+1");
        let handle = messenger
            .send(&ChannelId::from("movies"), MessageContent::text("pick me"))
            .await
            .unwrap();

        assert_eq!(messenger.cast_vote(handle.id).await.unwrap(), 1);
        let counts = messenger.fetch_reaction_counts(&handle).await.unwrap();
        assert_eq!(counts.get("+1"), Some(&1));
        assert!(messenger.cast_vote(999).await.is_err());
    }

    #[tokio::test]
    async fn test_cards_are_numbered_by_position() {
        let messenger = ConsoleMessenger::new("+1");
        let movies = ChannelId::from("movies");
        let other = ChannelId::from("other");
        let card = || MessageContent::Movie(card_for(&Movie::new("tt0078748", "Alien").with_year(1979)));

        messenger.send(&movies, MessageContent::text("intro")).await.unwrap();
        let mut positions = Vec::new();
        for _ in 0..3 {
            positions.push(messenger.next_position(&movies, &card()));
        }
        assert_eq!(positions, vec![Some(1), Some(2), Some(3)]);

        assert_eq!(messenger.next_position(&other, &card()), Some(1));
        assert_eq!(messenger.next_position(&movies, &MessageContent::text("wait")), None);
        assert_eq!(messenger.next_position(&movies, &card()), Some(1));
    }
}
