//! Common test utilities for integration tests
//!
//! Provides shared fixtures, collaborator doubles and helpers used across
//! multiple integration test files.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;

use djinn::adapters::messaging::InMemoryMessenger;
use djinn::adapters::sqlite::{create_migrated_test_pool, SqliteMovieCatalog};
use djinn::domain::errors::CatalogError;
use djinn::domain::models::{ChannelId, CommandsConfig, CompiledFilter, Movie};
use djinn::domain::ports::MovieCatalog;
use djinn::services::{Dispatcher, PollEvent, PollPhase, PollSettings};

pub const VOTE: &str = "\u{1F44D}";

/// Create a temporary test database
///
/// Returns the path to a SQLite database file in a temporary directory.
pub fn temp_db_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("movies.db");
    (dir, db_path)
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn channel(name: &str) -> ChannelId {
    ChannelId::from(name)
}

/// Three candidates with distinct headings, in a fixed order.
pub fn candidates() -> Vec<Movie> {
    vec![
        Movie::new("tt0078748", "Alien").with_year(1979).with_rating(8.5, 950_000),
        Movie::new("tt0088763", "Back to the Future")
            .with_year(1985)
            .with_rating(8.5, 1_300_000),
        Movie::new("tt0107048", "Groundhog Day").with_year(1993).with_rating(8.0, 680_000),
    ]
}

/// In-memory SQLite catalog seeded with the built-in sample movies.
pub async fn seeded_catalog() -> SqliteMovieCatalog {
    let pool = create_migrated_test_pool()
        .await
        .expect("Failed to create test pool");
    let catalog = SqliteMovieCatalog::new(pool);
    catalog.seed_samples().await.expect("Failed to seed samples");
    catalog
}

/// Catalog that ignores the filter and returns the first `amount` of a fixed
/// list, recording every filter it receives.
#[derive(Default)]
pub struct StaticCatalog {
    movies: Vec<Movie>,
    calls: Mutex<Vec<CompiledFilter>>,
}

impl StaticCatalog {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self {
            movies,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CompiledFilter> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MovieCatalog for StaticCatalog {
    async fn sample(&self, filter: &CompiledFilter, amount: u32) -> Result<Vec<Movie>, CatalogError> {
        self.calls.lock().unwrap().push(filter.clone());
        Ok(self.movies.iter().take(amount as usize).cloned().collect())
    }

    async fn count(&self, filter: &CompiledFilter) -> Result<u64, CatalogError> {
        self.calls.lock().unwrap().push(filter.clone());
        Ok(self.movies.len() as u64)
    }
}

/// Catalog whose every call fails.
pub struct FailingCatalog;

#[async_trait]
impl MovieCatalog for FailingCatalog {
    async fn sample(&self, _filter: &CompiledFilter, _amount: u32) -> Result<Vec<Movie>, CatalogError> {
        Err(CatalogError::Database("disk I/O error".to_string()))
    }

    async fn count(&self, _filter: &CompiledFilter) -> Result<u64, CatalogError> {
        Err(CatalogError::Database("disk I/O error".to_string()))
    }
}

pub fn poll_settings() -> PollSettings {
    PollSettings {
        wait: Duration::from_secs(600),
        vote_symbol: VOTE.to_string(),
    }
}

/// Dispatcher over `catalog` and a fresh in-memory messenger.
pub fn dispatcher_with(catalog: Arc<dyn MovieCatalog>) -> (Arc<Dispatcher>, InMemoryMessenger) {
    let messenger = InMemoryMessenger::new();
    let dispatcher = Dispatcher::new(
        catalog,
        Arc::new(messenger.clone()),
        poll_settings(),
        CommandsConfig::default(),
    );
    (Arc::new(dispatcher), messenger)
}

/// Wait until `channel` reports `phase`.
pub async fn wait_for_phase(
    events: &mut broadcast::Receiver<PollEvent>,
    channel: &ChannelId,
    phase: PollPhase,
) {
    loop {
        let event = events.recv().await.expect("poll event stream closed");
        if &event.channel == channel && event.phase == phase {
            return;
        }
    }
}

/// Phases reported for `channel` so far, without waiting.
pub fn drain_phases(events: &mut broadcast::Receiver<PollEvent>, channel: &ChannelId) -> Vec<PollPhase> {
    let mut phases = Vec::new();
    while let Ok(event) = events.try_recv() {
        if &event.channel == channel {
            phases.push(event.phase);
        }
    }
    phases
}
