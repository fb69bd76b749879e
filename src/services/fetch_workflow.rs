//! One-shot publication of random matching movies, without voting.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::errors::{CommandError, CommandResult};
use crate::domain::models::{ChannelId, CompiledFilter, MessageContent, MessageHandle};
use crate::domain::ports::{Messenger, MovieCatalog};
use crate::services::movie_card::{card_for, INTRO};

/// What a fetch published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub published: Vec<MessageHandle>,
    pub requested: u32,
}

impl FetchOutcome {
    /// Fewer matches existed than were asked for.
    pub fn is_partial(&self) -> bool {
        self.published.len() < self.requested as usize
    }
}

pub struct FetchWorkflow {
    catalog: Arc<dyn MovieCatalog>,
    messenger: Arc<dyn Messenger>,
}

impl FetchWorkflow {
    pub fn new(catalog: Arc<dyn MovieCatalog>, messenger: Arc<dyn Messenger>) -> Self {
        Self { catalog, messenger }
    }

    /// Publish up to `amount` movies matching `filter` in `channel`.
    ///
    /// A shortfall is reported with an informational message, no matches at
    /// all with [`CommandError::EmptyResult`].
    pub async fn run(
        &self,
        channel: &ChannelId,
        filter: &CompiledFilter,
        amount: u32,
        token: &CancellationToken,
    ) -> CommandResult<FetchOutcome> {
        self.messenger.send(channel, MessageContent::text(INTRO)).await?;
        let movies = self.catalog.sample(filter, amount).await?;
        if movies.is_empty() {
            return Err(CommandError::EmptyResult);
        }

        let mut published = Vec::with_capacity(movies.len());
        for movie in &movies {
            if token.is_cancelled() {
                return Err(CommandError::Cancelled);
            }
            let handle = self
                .messenger
                .send(channel, MessageContent::Movie(card_for(movie)))
                .await?;
            published.push(handle);
        }

        let outcome = FetchOutcome {
            published,
            requested: amount,
        };
        if outcome.is_partial() {
            let notice = match outcome.published.len() {
                1 => "Only 1 movie matched.".to_string(),
                n => format!("Only {n} movies matched."),
            };
            self.messenger.send(channel, MessageContent::text(notice)).await?;
        }

        tracing::info!(
            channel = %channel,
            published = outcome.published.len(),
            requested = amount,
            "fetch complete"
        );
        Ok(outcome)
    }
}
