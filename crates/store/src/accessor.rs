//! The read-only data store seam consumed by the eligibility gates.
//!
//! Every read is a parameterized query returning a homogeneous list of
//! rows. Aggregates that SQL returns as a single row (`COUNT(*)`, `SUM`,
//! `MAX`) come back as a list of zero or one element, so a failed query and
//! an empty table look the same once the caller applies [`RowsOrEmpty`].

use async_trait::async_trait;
use tracing::warn;

use compass_core::{
    CanonicalPair, CounterRecord, CounterTotals, EntitySlug, PairSynergyRecord, TimeBucket,
    UsageRecord,
};

use crate::error::StoreError;

/// Outcome of one parameterized read.
pub type QueryResult<T> = Result<Vec<T>, StoreError>;

/// Which replays count as evidence for a page key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayMatch {
    /// Both members on the same team of the same replay.
    SameSide(CanonicalPair),
    /// The entity on either team.
    EitherSide(EntitySlug),
}

/// Rating restriction applied to an evidence count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayFilter {
    /// Inclusive lower bound on `rating_estimate`; unrated replays never match.
    pub min_rating: i32,
    /// Only replays whose rating came from the ladder itself.
    pub official_only: bool,
}

/// Parameterized reads over the aggregate tables.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Pair record at the lowest cutoff `>= min_cutoff`.
    async fn pair_synergy(
        &self,
        format_id: &str,
        time_bucket: &str,
        pair: &CanonicalPair,
        min_cutoff: i32,
    ) -> QueryResult<PairSynergyRecord>;

    /// Usage record at the lowest cutoff `>= min_cutoff`.
    async fn usage(
        &self,
        format_id: &str,
        time_bucket: &str,
        pokemon: &str,
        min_cutoff: i32,
    ) -> QueryResult<UsageRecord>;

    /// Win/loss sums across every counter answer of `target` (one row).
    async fn counter_totals(
        &self,
        format_id: &str,
        time_bucket: &str,
        target: &str,
    ) -> QueryResult<CounterTotals>;

    /// Every counter answer of `target`.
    async fn counters(
        &self,
        format_id: &str,
        time_bucket: &str,
        target: &str,
    ) -> QueryResult<CounterRecord>;

    /// Number of evidence replays (one row).
    async fn count_replays(
        &self,
        format_id: &str,
        subject: &ReplayMatch,
        filter: ReplayFilter,
    ) -> QueryResult<i64>;

    /// All known canonical entity slugs.
    async fn entity_slugs(&self) -> QueryResult<EntitySlug>;

    /// Newest usage bucket for the format (zero or one row).
    async fn latest_time_bucket(&self, format_id: &str) -> QueryResult<TimeBucket>;

    /// Newest usage bucket strictly older than `before` (zero or one row).
    async fn previous_time_bucket(
        &self,
        format_id: &str,
        before: &str,
    ) -> QueryResult<TimeBucket>;

    /// Human-readable backend name for logs.
    fn backend_name(&self) -> &str;
}

/// Maps a failed read to zero rows, logging the cause.
///
/// Call sites use this instead of `?` so that a data-access fault degrades
/// a page toward not-found rather than failing the render.
pub trait RowsOrEmpty<T> {
    fn rows_or_empty(self, query: &str) -> Vec<T>;
}

impl<T> RowsOrEmpty<T> for QueryResult<T> {
    fn rows_or_empty(self, query: &str) -> Vec<T> {
        match self {
            Ok(rows) => rows,
            Err(e) => {
                warn!(query, error = %e, "query failed, treating as zero rows");
                Vec::new()
            }
        }
    }
}
