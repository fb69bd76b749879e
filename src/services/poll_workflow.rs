//! Timed movie poll.
//!
//! `Announcing -> Publishing -> Waiting -> Tallying -> Announced`, ending in
//! `Cancelled` or `Failed` when aborted. Cancellation is observed between
//! message sends while announcing and publishing, and during the wait. Once
//! tallying has started the poll runs to completion. Messages that were
//! already published are never retracted.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::{CommandError, CommandResult};
use crate::domain::models::{ChannelId, CompiledFilter, MessageContent, MessageHandle, PollConfig};
use crate::domain::ports::{Messenger, MovieCatalog};
use crate::services::movie_card::{card_for, INTRO};

const COUNTING: &str = "I will start counting the votes.";
const WINNER_REPLY: &str = "You shall watch this movie";

/// Phases of a poll, including the terminal ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollPhase {
    Announcing,
    Publishing,
    Waiting,
    Tallying,
    Announced,
    Cancelled,
    Failed,
}

impl PollPhase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Announced | Self::Cancelled | Self::Failed)
    }
}

impl fmt::Display for PollPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Announcing => "announcing",
            Self::Publishing => "publishing",
            Self::Waiting => "waiting",
            Self::Tallying => "tallying",
            Self::Announced => "announced",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Phase change broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollEvent {
    pub channel: ChannelId,
    pub phase: PollPhase,
}

/// Poll timing and vote symbol.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub wait: Duration,
    pub vote_symbol: String,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from(&PollConfig::default())
    }
}

impl From<&PollConfig> for PollSettings {
    fn from(config: &PollConfig) -> Self {
        Self {
            wait: config.wait(),
            vote_symbol: config.vote_symbol.clone(),
        }
    }
}

/// A published candidate message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub handle: MessageHandle,
    pub heading: String,
}

/// Candidates of a running poll and when voting closes.
#[derive(Debug, Clone)]
pub struct PollState {
    pub candidates: Vec<Candidate>,
    pub deadline: DateTime<Utc>,
}

/// Result of a completed poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub winner: Candidate,
    pub votes: u64,
    /// Number of candidates that shared the top vote count.
    pub tied: usize,
    pub candidates: usize,
}

/// Orchestrates one poll per call to [`run`](Self::run).
pub struct PollWorkflow {
    catalog: Arc<dyn MovieCatalog>,
    messenger: Arc<dyn Messenger>,
    settings: PollSettings,
    events: broadcast::Sender<PollEvent>,
}

impl PollWorkflow {
    pub fn new(
        catalog: Arc<dyn MovieCatalog>,
        messenger: Arc<dyn Messenger>,
        settings: PollSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            catalog,
            messenger,
            settings,
            events,
        }
    }

    pub const fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Receive phase changes of every poll run by this workflow.
    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.events.subscribe()
    }

    /// Run a poll with `amount` candidates drawn through `filter`.
    pub async fn run(
        &self,
        channel: &ChannelId,
        filter: &CompiledFilter,
        amount: u32,
        token: &CancellationToken,
    ) -> CommandResult<PollOutcome> {
        let result = self.run_phases(channel, filter, amount, token).await;
        let terminal = match &result {
            Ok(_) => PollPhase::Announced,
            Err(CommandError::Cancelled) => PollPhase::Cancelled,
            Err(_) => PollPhase::Failed,
        };
        self.enter(channel, terminal);
        result
    }

    async fn run_phases(
        &self,
        channel: &ChannelId,
        filter: &CompiledFilter,
        amount: u32,
        token: &CancellationToken,
    ) -> CommandResult<PollOutcome> {
        self.enter(channel, PollPhase::Announcing);
        self.messenger.send(channel, MessageContent::text(INTRO)).await?;
        checkpoint(token)?;

        self.enter(channel, PollPhase::Publishing);
        let state = self.publish(channel, filter, amount, token).await?;

        self.enter(channel, PollPhase::Waiting);
        let notice = format!(
            "I will wait {} before counting the votes.",
            describe_wait(self.settings.wait)
        );
        self.messenger.send(channel, MessageContent::text(notice)).await?;
        tracing::info!(channel = %channel, deadline = %state.deadline, "poll waiting for votes");
        self.wait(token).await?;

        self.enter(channel, PollPhase::Tallying);
        self.messenger.send(channel, MessageContent::text(COUNTING)).await?;
        let tally = self.tally(&state).await?;
        let candidates = state.candidates.len();

        let (votes, tied, winner) = {
            let mut rng = rand::thread_rng();
            let (votes, winner) = select_winner(&tally, &mut rng).ok_or_else(|| {
                CommandError::Collaborator("poll finished without candidates".to_string())
            })?;
            let tied = tally.get(&votes).map_or(0, Vec::len);
            (votes, tied, winner.clone())
        };

        self.messenger
            .reply(
                &winner.handle,
                &format!("{WINNER_REPLY}: {}", winner.heading),
            )
            .await?;
        tracing::info!(
            channel = %channel,
            winner = %winner.heading,
            votes,
            tied,
            "poll winner announced"
        );

        Ok(PollOutcome {
            winner,
            votes,
            tied,
            candidates,
        })
    }

    async fn publish(
        &self,
        channel: &ChannelId,
        filter: &CompiledFilter,
        amount: u32,
        token: &CancellationToken,
    ) -> CommandResult<PollState> {
        let movies = self.catalog.sample(filter, amount).await?;
        if movies.is_empty() {
            tracing::info!(channel = %channel, filter = %filter, "poll found no matches");
            return Err(CommandError::EmptyResult);
        }

        let mut candidates = Vec::with_capacity(movies.len());
        for movie in &movies {
            checkpoint(token)?;
            let card = card_for(movie);
            let heading = card.heading.clone();
            let handle = self
                .messenger
                .send(channel, MessageContent::Movie(card))
                .await?;
            self.messenger
                .add_reaction(&handle, &self.settings.vote_symbol)
                .await?;
            candidates.push(Candidate { handle, heading });
        }

        let deadline = chrono::Duration::from_std(self.settings.wait)
            .ok()
            .and_then(|wait| Utc::now().checked_add_signed(wait))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Ok(PollState {
            candidates,
            deadline,
        })
    }

    async fn wait(&self, token: &CancellationToken) -> CommandResult<()> {
        tokio::select! {
            () = token.cancelled() => Err(CommandError::Cancelled),
            () = tokio::time::sleep(self.settings.wait) => Ok(()),
        }
    }

    /// Vote count -> candidates holding it, in publication order.
    async fn tally(&self, state: &PollState) -> CommandResult<BTreeMap<u64, Vec<Candidate>>> {
        let counts = try_join_all(
            state
                .candidates
                .iter()
                .map(|c| self.messenger.fetch_reaction_counts(&c.handle)),
        )
        .await?;

        let mut tally: BTreeMap<u64, Vec<Candidate>> = BTreeMap::new();
        for (candidate, reactions) in state.candidates.iter().zip(counts) {
            let votes = reactions
                .get(&self.settings.vote_symbol)
                .copied()
                .unwrap_or(0);
            tracing::debug!(candidate = %candidate.heading, votes, "tallied");
            tally.entry(votes).or_default().push(candidate.clone());
        }
        Ok(tally)
    }

    fn enter(&self, channel: &ChannelId, phase: PollPhase) {
        tracing::debug!(channel = %channel, %phase, "poll phase");
        let _ = self.events.send(PollEvent {
            channel: channel.clone(),
            phase,
        });
    }
}

fn checkpoint(token: &CancellationToken) -> CommandResult<()> {
    if token.is_cancelled() {
        Err(CommandError::Cancelled)
    } else {
        Ok(())
    }
}

/// Pick among the entries with the highest vote count, uniformly at random
/// when several tie.
pub fn select_winner<'a, T, R>(
    tally: &'a BTreeMap<u64, Vec<T>>,
    rng: &mut R,
) -> Option<(u64, &'a T)>
where
    R: Rng + ?Sized,
{
    let (votes, leaders) = tally.iter().next_back()?;
    let winner = match leaders.as_slice() {
        [only] => only,
        many => many.choose(rng)?,
    };
    Some((*votes, winner))
}

/// Human wording for the wait, e.g. `10 minutes`.
pub fn describe_wait(wait: Duration) -> String {
    let secs = wait.as_secs();
    let (n, unit) = if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_single_maximum_always_wins() {
        let t = BTreeMap::from([(1, vec!["a", "b"]), (4, vec!["c"]), (2, vec!["d"])]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(select_winner(&t, &mut rng), Some((4, &"c")));
        }
    }

    #[test]
    fn test_empty_tally_has_no_winner() {
        let t: BTreeMap<u64, Vec<&str>> = BTreeMap::new();
        assert_eq!(select_winner(&t, &mut StdRng::seed_from_u64(1)), None);
    }

    #[test]
    fn test_ties_are_broken_uniformly() {
        let t = BTreeMap::from([(0, vec!["loser"]), (3, vec!["a", "b", "c"])]);
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 30_000;
        let mut seen: BTreeMap<&str, u32> = BTreeMap::new();
        for _ in 0..trials {
            let (votes, winner) = select_winner(&t, &mut rng).unwrap();
            assert_eq!(votes, 3);
            *seen.entry(*winner).or_default() += 1;
        }

        assert_eq!(seen.len(), 3);
        let expected = f64::from(trials) / 3.0;
        for (name, count) in seen {
            let deviation = (f64::from(count) - expected).abs() / expected;
            assert!(deviation < 0.05, "{name} won {count} times, expected ~{expected}");
        }
    }

    #[test]
    fn test_describe_wait() {
        assert_eq!(describe_wait(Duration::from_secs(600)), "10 minutes");
        assert_eq!(describe_wait(Duration::from_secs(60)), "1 minute");
        assert_eq!(describe_wait(Duration::from_secs(90)), "90 seconds");
        assert_eq!(describe_wait(Duration::from_secs(1)), "1 second");
    }

    #[test]
    fn test_terminal_phases() {
        assert!(PollPhase::Announced.is_terminal());
        assert!(PollPhase::Cancelled.is_terminal());
        assert!(PollPhase::Failed.is_terminal());
        assert!(!PollPhase::Waiting.is_terminal());
    }
}
