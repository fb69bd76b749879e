use async_trait::async_trait;

use crate::domain::errors::CatalogError;
use crate::domain::models::{CompiledFilter, Movie};

/// Read-only access to the movie dataset.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Up to `amount` records chosen uniformly at random among those matching
    /// `filter`. Returns every match when fewer than `amount` exist.
    async fn sample(&self, filter: &CompiledFilter, amount: u32) -> Result<Vec<Movie>, CatalogError>;

    /// Number of records matching `filter`.
    async fn count(&self, filter: &CompiledFilter) -> Result<u64, CatalogError>;
}
