//! Scripted [`StatsStore`] for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use compass_core::{
    CanonicalPair, CounterRecord, CounterTotals, EntitySlug, PairSynergyRecord, TimeBucket,
    UsageRecord,
};
use compass_store::{QueryResult, ReplayFilter, ReplayMatch, StatsStore, StoreError};

/// Answers every read from fixed values and counts how often it was asked.
#[derive(Default)]
pub(crate) struct ScriptedStore {
    pub pair_sample_size: Option<i64>,
    pub usage_rate: Option<f64>,
    pub strong_replays: i64,
    pub weak_replays: i64,
    pub totals: CounterTotals,
    pub slugs: Vec<String>,
    pub latest_bucket: Option<String>,
    pub previous_bucket: Option<String>,
    /// Fail only the official-only replay count.
    pub fail_strong: bool,
    pub fail_all: AtomicBool,
    pub queries: AtomicUsize,
    pub slug_queries: AtomicUsize,
    pub bucket_queries: AtomicUsize,
    pub totals_queries: AtomicUsize,
}

impl ScriptedStore {
    fn enter(&self) -> Result<(), StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("scripted outage".to_string()))
        } else {
            Ok(())
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsStore for ScriptedStore {
    async fn pair_synergy(
        &self,
        format_id: &str,
        time_bucket: &str,
        pair: &CanonicalPair,
        min_cutoff: i32,
    ) -> QueryResult<PairSynergyRecord> {
        self.enter()?;
        Ok(self
            .pair_sample_size
            .map(|size| PairSynergyRecord {
                format_id: format_id.to_string(),
                time_bucket: time_bucket.to_string(),
                cutoff: min_cutoff,
                pokemon_a: pair.a().to_string(),
                pokemon_b: pair.b().to_string(),
                pair_rate: 5.0,
                pair_sample_size: size,
                synergy_score: None,
                common_partners: None,
                common_archetypes: None,
                sample_teams: None,
            })
            .into_iter()
            .collect())
    }

    async fn usage(
        &self,
        format_id: &str,
        time_bucket: &str,
        pokemon: &str,
        min_cutoff: i32,
    ) -> QueryResult<UsageRecord> {
        self.enter()?;
        Ok(self
            .usage_rate
            .map(|rate| UsageRecord {
                format_id: format_id.to_string(),
                time_bucket: time_bucket.to_string(),
                cutoff: min_cutoff,
                pokemon: pokemon.to_string(),
                usage_rate: rate,
                rank: 1,
                top_moves: vec![],
                top_items: vec![],
                top_abilities: vec![],
                top_tera: vec![],
            })
            .into_iter()
            .collect())
    }

    async fn counter_totals(&self, _: &str, _: &str, _: &str) -> QueryResult<CounterTotals> {
        self.enter()?;
        self.totals_queries.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.totals])
    }

    async fn counters(&self, _: &str, _: &str, _: &str) -> QueryResult<CounterRecord> {
        self.enter()?;
        Ok(vec![])
    }

    async fn count_replays(
        &self,
        _: &str,
        _: &ReplayMatch,
        filter: ReplayFilter,
    ) -> QueryResult<i64> {
        self.enter()?;
        if filter.official_only {
            if self.fail_strong {
                return Err(StoreError::Unavailable("strong evidence query failed".to_string()));
            }
            Ok(vec![self.strong_replays])
        } else {
            Ok(vec![self.weak_replays])
        }
    }

    async fn entity_slugs(&self) -> QueryResult<EntitySlug> {
        self.enter()?;
        self.slug_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.slugs.clone())
    }

    async fn latest_time_bucket(&self, _: &str) -> QueryResult<TimeBucket> {
        self.enter()?;
        self.bucket_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.latest_bucket.clone().into_iter().collect())
    }

    async fn previous_time_bucket(&self, _: &str, _: &str) -> QueryResult<TimeBucket> {
        self.enter()?;
        Ok(self.previous_bucket.clone().into_iter().collect())
    }

    fn backend_name(&self) -> &str {
        "scripted"
    }
}
