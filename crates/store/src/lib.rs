//! Read-only access to the aggregate statistics tables.
//!
//! - [`StatsStore`]: the async query seam the eligibility gates depend on
//! - [`PgStatsStore`]: sqlx/PostgreSQL implementation
//! - [`SnapshotStore`]: in-memory implementation over a JSON export

pub mod accessor;
pub mod error;
pub mod postgres;
pub mod snapshot;

use std::path::Path;
use std::sync::Arc;

pub use accessor::{QueryResult, ReplayFilter, ReplayMatch, RowsOrEmpty, StatsStore};
pub use error::StoreError;
pub use postgres::PgStatsStore;
pub use snapshot::{Snapshot, SnapshotStore};

/// Pick a backend: a snapshot file when given, PostgreSQL otherwise.
pub async fn open_store(
    config: &compass_core::Config,
    snapshot: Option<&Path>,
) -> Result<Arc<dyn StatsStore>, StoreError> {
    match snapshot {
        Some(path) => Ok(Arc::new(SnapshotStore::from_path(path).await?)),
        None => Ok(Arc::new(PgStatsStore::connect(&config.postgres))),
    }
}
