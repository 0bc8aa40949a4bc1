//! In-memory [`StatsStore`] over a JSON snapshot of pipeline output.
//!
//! Applies the same filters as the SQL in [`crate::postgres`], so a snapshot
//! exported from the tables gives the same decisions offline.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use compass_core::{
    CanonicalPair, CounterRecord, CounterTotals, EntitySlug, PairSynergyRecord, ReplayRecord,
    TimeBucket, UsageRecord,
};

use crate::accessor::{QueryResult, ReplayFilter, ReplayMatch, StatsStore};
use crate::error::StoreError;

/// Serialized form of every table the gates read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub entities: Vec<EntitySlug>,
    #[serde(default)]
    pub usage: Vec<UsageRecord>,
    #[serde(default)]
    pub pairs: Vec<PairSynergyRecord>,
    #[serde(default)]
    pub counters: Vec<CounterRecord>,
    #[serde(default)]
    pub replays: Vec<ReplayRecord>,
}

/// Snapshot-backed store. Can be flipped unavailable to simulate an outage.
pub struct SnapshotStore {
    snapshot: Snapshot,
    unavailable: AtomicBool,
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Load a snapshot from a JSON file.
    pub async fn from_path(path: &Path) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            entities = snapshot.entities.len(),
            replays = snapshot.replays.len(),
            "snapshot loaded"
        );
        Ok(Self::new(snapshot))
    }

    /// While set, every read fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<&Snapshot, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("snapshot store switched off".to_string()));
        }
        Ok(&self.snapshot)
    }
}

fn replay_matches(replay: &ReplayRecord, format_id: &str, subject: &ReplayMatch, filter: ReplayFilter) -> bool {
    if replay.format_id != format_id {
        return false;
    }
    if filter.official_only && !replay.rating_source.is_official() {
        return false;
    }
    if !replay.rating_estimate.is_some_and(|r| r >= filter.min_rating) {
        return false;
    }
    match subject {
        ReplayMatch::SameSide(pair) => replay.features_together(pair.a(), pair.b()),
        ReplayMatch::EitherSide(pokemon) => replay.features(pokemon),
    }
}

#[async_trait]
impl StatsStore for SnapshotStore {
    async fn pair_synergy(
        &self,
        format_id: &str,
        time_bucket: &str,
        pair: &CanonicalPair,
        min_cutoff: i32,
    ) -> QueryResult<PairSynergyRecord> {
        let mut rows: Vec<_> = self
            .check()?
            .pairs
            .iter()
            .filter(|p| {
                p.format_id == format_id
                    && p.time_bucket == time_bucket
                    && p.pokemon_a == pair.a()
                    && p.pokemon_b == pair.b()
                    && p.cutoff >= min_cutoff
            })
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.cutoff);
        Ok(rows)
    }

    async fn usage(
        &self,
        format_id: &str,
        time_bucket: &str,
        pokemon: &str,
        min_cutoff: i32,
    ) -> QueryResult<UsageRecord> {
        let mut rows: Vec<_> = self
            .check()?
            .usage
            .iter()
            .filter(|u| {
                u.format_id == format_id
                    && u.time_bucket == time_bucket
                    && u.pokemon == pokemon
                    && u.cutoff >= min_cutoff
            })
            .cloned()
            .collect();
        rows.sort_by_key(|u| u.cutoff);
        Ok(rows)
    }

    async fn counter_totals(
        &self,
        format_id: &str,
        time_bucket: &str,
        target: &str,
    ) -> QueryResult<CounterTotals> {
        let records = self.counters(format_id, time_bucket, target).await?;
        Ok(vec![CounterTotals::from_records(&records)])
    }

    async fn counters(
        &self,
        format_id: &str,
        time_bucket: &str,
        target: &str,
    ) -> QueryResult<CounterRecord> {
        let mut rows: Vec<_> = self
            .check()?
            .counters
            .iter()
            .filter(|c| {
                c.format_id == format_id && c.time_bucket == time_bucket && c.target_pokemon == target
            })
            .cloned()
            .collect();
        rows.sort_by(|x, y| {
            let score = |c: &CounterRecord| c.effectiveness_score.unwrap_or(f64::NEG_INFINITY);
            score(y)
                .total_cmp(&score(x))
                .then_with(|| x.answer_key.cmp(&y.answer_key))
        });
        Ok(rows)
    }

    async fn count_replays(
        &self,
        format_id: &str,
        subject: &ReplayMatch,
        filter: ReplayFilter,
    ) -> QueryResult<i64> {
        let count = self
            .check()?
            .replays
            .iter()
            .filter(|r| replay_matches(r, format_id, subject, filter))
            .count();
        Ok(vec![count as i64])
    }

    async fn entity_slugs(&self) -> QueryResult<EntitySlug> {
        Ok(self.check()?.entities.clone())
    }

    async fn latest_time_bucket(&self, format_id: &str) -> QueryResult<TimeBucket> {
        Ok(self
            .check()?
            .usage
            .iter()
            .filter(|u| u.format_id == format_id)
            .map(|u| u.time_bucket.clone())
            .max()
            .into_iter()
            .collect())
    }

    async fn previous_time_bucket(
        &self,
        format_id: &str,
        before: &str,
    ) -> QueryResult<TimeBucket> {
        Ok(self
            .check()?
            .usage
            .iter()
            .filter(|u| u.format_id == format_id && u.time_bucket.as_str() < before)
            .map(|u| u.time_bucket.clone())
            .max()
            .into_iter()
            .collect())
    }

    fn backend_name(&self) -> &str {
        "snapshot"
    }
}
