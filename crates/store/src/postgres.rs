//! PostgreSQL-backed [`StatsStore`].
//!
//! The pool is created lazily so a database that is down at startup only
//! fails individual queries. A missing or placeholder URL produces an
//! unconfigured store whose every read returns [`StoreError::NotConfigured`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, info, warn};

use compass_core::config::{is_usable_database_url, PostgresConfig};
use compass_core::{
    AnswerType, CanonicalPair, CounterRecord, CounterTotals, EntitySlug, PairSynergyRecord,
    RankedShare, TimeBucket, UsageRecord,
};

use crate::accessor::{QueryResult, ReplayFilter, ReplayMatch, StatsStore};
use crate::error::StoreError;

// ── Row types ────────────────────────────────────────────────────────

/// Row from the `pair_synergy` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PairRow {
    format_id: String,
    time_bucket: String,
    cutoff: i32,
    pokemon_a: String,
    pokemon_b: String,
    pair_rate: f64,
    pair_sample_size: i64,
    synergy_score: Option<f64>,
    common_partners: Option<serde_json::Value>,
    common_archetypes: Option<serde_json::Value>,
    sample_teams: Option<serde_json::Value>,
}

impl From<PairRow> for PairSynergyRecord {
    fn from(row: PairRow) -> Self {
        Self {
            format_id: row.format_id,
            time_bucket: row.time_bucket,
            cutoff: row.cutoff,
            pokemon_a: row.pokemon_a,
            pokemon_b: row.pokemon_b,
            pair_rate: row.pair_rate,
            pair_sample_size: row.pair_sample_size,
            synergy_score: row.synergy_score,
            common_partners: row.common_partners.and_then(json_column),
            common_archetypes: row.common_archetypes.and_then(json_column),
            sample_teams: row.sample_teams.and_then(json_column),
        }
    }
}

/// Row from the `pokemon_usage` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct UsageRow {
    format_id: String,
    time_bucket: String,
    cutoff: i32,
    pokemon: String,
    usage_rate: f64,
    rank: i32,
    top_moves: Option<serde_json::Value>,
    top_items: Option<serde_json::Value>,
    top_abilities: Option<serde_json::Value>,
    top_tera: Option<serde_json::Value>,
}

impl From<UsageRow> for UsageRecord {
    fn from(row: UsageRow) -> Self {
        Self {
            format_id: row.format_id,
            time_bucket: row.time_bucket,
            cutoff: row.cutoff,
            pokemon: row.pokemon,
            usage_rate: row.usage_rate,
            rank: row.rank,
            top_moves: ranked_shares(row.top_moves),
            top_items: ranked_shares(row.top_items),
            top_abilities: ranked_shares(row.top_abilities),
            top_tera: ranked_shares(row.top_tera),
        }
    }
}

/// Row from the `counters` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CounterRow {
    format_id: String,
    time_bucket: String,
    cutoff: i32,
    target_pokemon: String,
    answer_type: String,
    answer_key: String,
    effectiveness_score: Option<f64>,
    loss_appearance_rate: f64,
    win_appearance_rate: f64,
    n_wins: i64,
    n_losses: i64,
    evidence_replays: Option<serde_json::Value>,
    notes: Option<String>,
}

impl CounterRow {
    fn into_record(self) -> Option<CounterRecord> {
        let answer_type = match self.answer_type.as_str() {
            "pokemon" => AnswerType::Pokemon,
            "archetype" => AnswerType::Archetype,
            "mechanic" => AnswerType::Mechanic,
            other => {
                warn!(answer_type = other, answer_key = %self.answer_key, "skipping counter row with unknown answer_type");
                return None;
            }
        };
        Some(CounterRecord {
            format_id: self.format_id,
            time_bucket: self.time_bucket,
            cutoff: self.cutoff,
            target_pokemon: self.target_pokemon,
            answer_type,
            answer_key: self.answer_key,
            effectiveness_score: self.effectiveness_score,
            loss_appearance_rate: self.loss_appearance_rate,
            win_appearance_rate: self.win_appearance_rate,
            n_wins: self.n_wins,
            n_losses: self.n_losses,
            evidence_replays: self.evidence_replays.and_then(json_column).unwrap_or_default(),
            notes: self.notes,
        })
    }
}

/// Decode a JSONB column, dropping values of the wrong shape.
fn json_column<T: DeserializeOwned>(value: serde_json::Value) -> Option<T> {
    serde_json::from_value(value).ok()
}

/// Decode a ranked breakdown column.
///
/// Accepts both `[{"name", "usage"}]` and the newer
/// `{"_v": 1, "data": [{"key", "pct"}]}` layout written by the importer.
fn ranked_shares(value: Option<serde_json::Value>) -> Vec<RankedShare> {
    #[derive(serde::Deserialize)]
    struct Versioned {
        data: Vec<VersionedEntry>,
    }

    #[derive(serde::Deserialize)]
    struct VersionedEntry {
        key: String,
        pct: f64,
    }

    let Some(value) = value else {
        return Vec::new();
    };
    if value.is_array() {
        return json_column(value).unwrap_or_default();
    }
    json_column::<Versioned>(value)
        .map(|v| {
            v.data
                .into_iter()
                .map(|e| RankedShare { name: e.key, usage: e.pct })
                .collect()
        })
        .unwrap_or_default()
}

// ── Store ────────────────────────────────────────────────────────────

const PAIR_SQL: &str = "SELECT format_id, time_bucket, cutoff::INT4 AS cutoff, pokemon_a, pokemon_b,
            pair_rate::FLOAT8 AS pair_rate, pair_sample_size::INT8 AS pair_sample_size,
            synergy_score::FLOAT8 AS synergy_score, common_partners, common_archetypes, sample_teams
     FROM pair_synergy
     WHERE format_id = $1 AND time_bucket = $2 AND pokemon_a = $3 AND pokemon_b = $4 AND cutoff >= $5
     ORDER BY cutoff ASC";

const USAGE_SQL: &str = "SELECT format_id, time_bucket, cutoff::INT4 AS cutoff, pokemon,
            usage_rate::FLOAT8 AS usage_rate, rank::INT4 AS rank,
            top_moves, top_items, top_abilities, top_tera
     FROM pokemon_usage
     WHERE format_id = $1 AND time_bucket = $2 AND pokemon = $3 AND cutoff >= $4
     ORDER BY cutoff ASC";

const COUNTER_TOTALS_SQL: &str = "SELECT COALESCE(SUM(n_wins), 0)::INT8, COALESCE(SUM(n_losses), 0)::INT8
     FROM counters
     WHERE format_id = $1 AND time_bucket = $2 AND target_pokemon = $3";

const COUNTERS_SQL: &str = "SELECT format_id, time_bucket, cutoff::INT4 AS cutoff, target_pokemon,
            answer_type, answer_key, effectiveness_score::FLOAT8 AS effectiveness_score,
            loss_appearance_rate::FLOAT8 AS loss_appearance_rate,
            win_appearance_rate::FLOAT8 AS win_appearance_rate,
            n_wins::INT8 AS n_wins, n_losses::INT8 AS n_losses, evidence_replays, notes
     FROM counters
     WHERE format_id = $1 AND time_bucket = $2 AND target_pokemon = $3
     ORDER BY effectiveness_score DESC NULLS LAST, answer_key ASC";

const PAIR_REPLAYS_SQL: &str = "SELECT COUNT(*)::INT8 FROM replays
     WHERE format_id = $1
     AND ((p1_team ? $2 AND p1_team ? $3) OR (p2_team ? $2 AND p2_team ? $3))
     AND rating_estimate >= $4";

const ENTITY_REPLAYS_SQL: &str = "SELECT COUNT(*)::INT8 FROM replays
     WHERE format_id = $1
     AND (p1_team ? $2 OR p2_team ? $2)
     AND rating_estimate >= $3";

const OFFICIAL_ONLY: &str = " AND rating_source = 'official'";

/// [`StatsStore`] over the pipeline's PostgreSQL tables.
pub struct PgStatsStore {
    pool: Option<PgPool>,
}

impl PgStatsStore {
    /// Build a lazily-connecting store from config.
    ///
    /// Never fails: an unusable URL yields an unconfigured store.
    pub fn connect(config: &PostgresConfig) -> Self {
        let url = config.database_url();
        if !is_usable_database_url(&url) {
            warn!("database URL not configured, stats queries will return no rows");
            return Self::unconfigured();
        }

        match PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(&url)
        {
            Ok(pool) => {
                info!(host = %config.host, max_connections = config.max_connections, "PostgreSQL pool created");
                Self { pool: Some(pool) }
            }
            Err(e) => {
                warn!(error = %e, "invalid database URL, stats queries will return no rows");
                Self::unconfigured()
            }
        }
    }

    pub fn unconfigured() -> Self {
        Self { pool: None }
    }

    pub fn is_configured(&self) -> bool {
        self.pool.is_some()
    }

    fn pool(&self) -> Result<&PgPool, StoreError> {
        self.pool
            .as_ref()
            .ok_or_else(|| StoreError::NotConfigured("DATABASE_URL".to_string()))
    }
}

/// Log and convert a sqlx failure.
fn db_error(query: &str, e: sqlx::Error) -> StoreError {
    error!(query, error = %e, "stats query failed");
    StoreError::Database(e)
}

#[async_trait]
impl StatsStore for PgStatsStore {
    async fn pair_synergy(
        &self,
        format_id: &str,
        time_bucket: &str,
        pair: &CanonicalPair,
        min_cutoff: i32,
    ) -> QueryResult<PairSynergyRecord> {
        let rows = sqlx::query_as::<_, PairRow>(PAIR_SQL)
            .bind(format_id)
            .bind(time_bucket)
            .bind(pair.a())
            .bind(pair.b())
            .bind(min_cutoff)
            .fetch_all(self.pool()?)
            .await
            .map_err(|e| db_error("pair_synergy", e))?;
        Ok(rows.into_iter().map(PairSynergyRecord::from).collect())
    }

    async fn usage(
        &self,
        format_id: &str,
        time_bucket: &str,
        pokemon: &str,
        min_cutoff: i32,
    ) -> QueryResult<UsageRecord> {
        let rows = sqlx::query_as::<_, UsageRow>(USAGE_SQL)
            .bind(format_id)
            .bind(time_bucket)
            .bind(pokemon)
            .bind(min_cutoff)
            .fetch_all(self.pool()?)
            .await
            .map_err(|e| db_error("usage", e))?;
        Ok(rows.into_iter().map(UsageRecord::from).collect())
    }

    async fn counter_totals(
        &self,
        format_id: &str,
        time_bucket: &str,
        target: &str,
    ) -> QueryResult<CounterTotals> {
        let (total_wins, total_losses) = sqlx::query_as::<_, (i64, i64)>(COUNTER_TOTALS_SQL)
            .bind(format_id)
            .bind(time_bucket)
            .bind(target)
            .fetch_one(self.pool()?)
            .await
            .map_err(|e| db_error("counter_totals", e))?;
        Ok(vec![CounterTotals { total_wins, total_losses }])
    }

    async fn counters(
        &self,
        format_id: &str,
        time_bucket: &str,
        target: &str,
    ) -> QueryResult<CounterRecord> {
        let rows = sqlx::query_as::<_, CounterRow>(COUNTERS_SQL)
            .bind(format_id)
            .bind(time_bucket)
            .bind(target)
            .fetch_all(self.pool()?)
            .await
            .map_err(|e| db_error("counters", e))?;
        Ok(rows.into_iter().filter_map(CounterRow::into_record).collect())
    }

    async fn count_replays(
        &self,
        format_id: &str,
        subject: &ReplayMatch,
        filter: ReplayFilter,
    ) -> QueryResult<i64> {
        let base = match subject {
            ReplayMatch::SameSide(_) => PAIR_REPLAYS_SQL,
            ReplayMatch::EitherSide(_) => ENTITY_REPLAYS_SQL,
        };
        let sql = if filter.official_only {
            format!("{base}{OFFICIAL_ONLY}")
        } else {
            base.to_string()
        };

        let query = sqlx::query_scalar::<_, i64>(&sql).bind(format_id);
        let query = match subject {
            ReplayMatch::SameSide(pair) => query.bind(pair.a()).bind(pair.b()),
            ReplayMatch::EitherSide(pokemon) => query.bind(pokemon.as_str()),
        };
        let count = query
            .bind(filter.min_rating)
            .fetch_one(self.pool()?)
            .await
            .map_err(|e| db_error("count_replays", e))?;
        Ok(vec![count])
    }

    async fn entity_slugs(&self) -> QueryResult<EntitySlug> {
        sqlx::query_scalar::<_, String>("SELECT slug FROM pokemon_dim")
            .fetch_all(self.pool()?)
            .await
            .map_err(|e| db_error("entity_slugs", e))
    }

    async fn latest_time_bucket(&self, format_id: &str) -> QueryResult<TimeBucket> {
        let bucket = sqlx::query_scalar::<_, Option<String>>(
            "SELECT MAX(time_bucket) FROM pokemon_usage WHERE format_id = $1",
        )
        .bind(format_id)
        .fetch_one(self.pool()?)
        .await
        .map_err(|e| db_error("latest_time_bucket", e))?;
        Ok(bucket.into_iter().collect())
    }

    async fn previous_time_bucket(
        &self,
        format_id: &str,
        before: &str,
    ) -> QueryResult<TimeBucket> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT time_bucket FROM pokemon_usage
             WHERE format_id = $1 AND time_bucket < $2
             ORDER BY time_bucket DESC LIMIT 1",
        )
        .bind(format_id)
        .bind(before)
        .fetch_all(self.pool()?)
        .await
        .map_err(|e| db_error("previous_time_bucket", e))
    }

    fn backend_name(&self) -> &str {
        "postgres"
    }
}
