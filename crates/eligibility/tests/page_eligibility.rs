//! End-to-end eligibility decisions over an in-memory snapshot.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use compass_core::{
    AnswerType, CanonicalPair, CounterRecord, CounterTotals, EntitySlug, PairSynergyRecord,
    RatingSource, ReplayRecord, TimeBucket, UsageRecord,
};
use compass_eligibility::{
    DictionaryCache, Eligibility, EligibilityEngine, PageStatus, PairResolver, Reason,
    SystemClock,
};
use compass_store::{
    QueryResult, ReplayFilter, ReplayMatch, Snapshot, SnapshotStore, StatsStore, StoreError,
};

const FORMAT: &str = "reg-f";
const BUCKET: &str = "2025-01";

// ── Fixtures ────────────────────────────────────────────────

fn pair_record(a: &str, b: &str, sample_size: i64) -> PairSynergyRecord {
    let pair = CanonicalPair::new(a, b);
    PairSynergyRecord {
        format_id: FORMAT.to_string(),
        time_bucket: BUCKET.to_string(),
        cutoff: 1760,
        pokemon_a: pair.a().to_string(),
        pokemon_b: pair.b().to_string(),
        pair_rate: 8.0,
        pair_sample_size: sample_size,
        synergy_score: Some(1.2),
        common_partners: None,
        common_archetypes: None,
        sample_teams: None,
    }
}

fn usage_record(pokemon: &str, usage_rate: f64) -> UsageRecord {
    UsageRecord {
        format_id: FORMAT.to_string(),
        time_bucket: BUCKET.to_string(),
        cutoff: 1760,
        pokemon: pokemon.to_string(),
        usage_rate,
        rank: 3,
        top_moves: vec![],
        top_items: vec![],
        top_abilities: vec![],
        top_tera: vec![],
    }
}

fn counter_record(target: &str, answer: &str, wins: i64, losses: i64) -> CounterRecord {
    CounterRecord {
        format_id: FORMAT.to_string(),
        time_bucket: BUCKET.to_string(),
        cutoff: 1760,
        target_pokemon: target.to_string(),
        answer_type: AnswerType::Pokemon,
        answer_key: answer.to_string(),
        effectiveness_score: Some(14.0),
        loss_appearance_rate: 30.0,
        win_appearance_rate: 16.0,
        n_wins: wins,
        n_losses: losses,
        evidence_replays: vec![],
        notes: None,
    }
}

/// `count` replays with `team` on p1 at the given rating and source.
fn replays(prefix: &str, count: usize, rating: i32, source: RatingSource, team: &[&str]) -> Vec<ReplayRecord> {
    (0..count)
        .map(|i| ReplayRecord {
            replay_id: format!("{prefix}-{i}"),
            format_id: FORMAT.to_string(),
            rating_estimate: Some(rating),
            rating_source: source,
            played_at: None,
            p1_team: team.iter().map(|s| s.to_string()).collect(),
            p2_team: vec!["amoonguss".to_string()],
            winner_side: None,
            tags: vec![],
        })
        .collect()
}

fn engine_over(snapshot: Snapshot) -> EligibilityEngine {
    EligibilityEngine::new(Arc::new(SnapshotStore::new(snapshot)))
}

// ── Core pages ──────────────────────────────────────────────

#[tokio::test]
async fn core_with_only_weak_replays_is_degraded() {
    let engine = engine_over(Snapshot {
        pairs: vec![pair_record("incineroar", "rillaboom", 250)],
        replays: replays("weak", 20, 1720, RatingSource::Unclassified, &["incineroar", "rillaboom"]),
        ..Snapshot::default()
    });
    let result = engine.check_core(FORMAT, BUCKET, "rillaboom", "incineroar").await;
    assert_eq!(result, Eligibility::degraded(Reason::LimitedHighRatedSamples));
}

#[tokio::test]
async fn core_with_ten_official_high_replays_is_full() {
    let team = ["incineroar", "rillaboom"];
    let engine = engine_over(Snapshot {
        pairs: vec![pair_record("incineroar", "rillaboom", 250)],
        replays: replays("strong", 10, 1760, RatingSource::Official, &team),
        ..Snapshot::default()
    });
    let result = engine.check_core(FORMAT, BUCKET, "incineroar", "rillaboom").await;
    assert_eq!(result, Eligibility::full(Reason::MeetsAllCriteria));
}

#[tokio::test]
async fn unofficial_high_replays_do_not_count_as_strong() {
    let team = ["incineroar", "rillaboom"];
    let engine = engine_over(Snapshot {
        pairs: vec![pair_record("incineroar", "rillaboom", 250)],
        replays: replays("unofficial", 15, 1900, RatingSource::Unclassified, &team),
        ..Snapshot::default()
    });
    let result = engine.check_core(FORMAT, BUCKET, "incineroar", "rillaboom").await;
    assert_eq!(result, Eligibility::not_found(Reason::InsufficientReplayEvidence));
}

#[tokio::test]
async fn core_sample_size_boundary() {
    let team = ["incineroar", "rillaboom"];
    for (size, expected) in [(200, PageStatus::Full), (199, PageStatus::NotFound)] {
        let engine = engine_over(Snapshot {
            pairs: vec![pair_record("incineroar", "rillaboom", size)],
            replays: replays("strong", 50, 1800, RatingSource::Official, &team),
            ..Snapshot::default()
        });
        let result = engine.check_core(FORMAT, BUCKET, "incineroar", "rillaboom").await;
        assert_eq!(result.status, expected, "sample size {size}");
    }
}

#[tokio::test]
async fn core_slug_resolves_before_gating() {
    let store: Arc<dyn StatsStore> = Arc::new(SnapshotStore::new(Snapshot {
        entities: vec!["urshifu-rapid-strike".to_string()],
        pairs: vec![pair_record("urshifu-rapid-strike", "iron-hands", 900)],
        replays: replays("strong", 10, 1800, RatingSource::Official, &["iron-hands", "urshifu-rapid-strike"]),
        ..Snapshot::default()
    }));
    let dictionary = DictionaryCache::new(store.clone(), Arc::new(SystemClock), Duration::from_secs(3_600));
    let resolver = PairResolver::new(Arc::new(dictionary));
    let engine = EligibilityEngine::new(store);

    let page = engine
        .check_core_slug(&resolver, FORMAT, BUCKET, "urshifu-rapid-strike-iron-hands")
        .await;
    assert_eq!(page.pair, Some(CanonicalPair::new("iron-hands", "urshifu-rapid-strike")));
    assert_eq!(page.eligibility.status, PageStatus::Full);

    let missing = engine
        .check_core_slug(&resolver, FORMAT, BUCKET, "urshifu-rapid-strike-missingno")
        .await;
    assert_eq!(missing.pair, None);
    assert_eq!(missing.eligibility, Eligibility::not_found(Reason::PairUnresolvable));
}

// ── Counter pages ───────────────────────────────────────────

#[tokio::test]
async fn counter_usage_rate_boundary() {
    for (rate, expected) in [(2.0, PageStatus::Full), (1.99, PageStatus::NotFound)] {
        let engine = engine_over(Snapshot {
            usage: vec![usage_record("chien-pao", rate)],
            replays: replays("strong", 10, 1800, RatingSource::Official, &["chien-pao"]),
            ..Snapshot::default()
        });
        let result = engine.check_counter(FORMAT, BUCKET, "chien-pao").await;
        assert_eq!(result.status, expected, "usage rate {rate}");
        if expected == PageStatus::NotFound {
            assert_eq!(result.reason, Reason::UsageRateBelowMinimum);
        }
    }
}

#[tokio::test]
async fn counter_full_but_too_few_wins_hides_effectiveness() {
    let engine = engine_over(Snapshot {
        usage: vec![usage_record("chien-pao", 21.3)],
        counters: vec![
            counter_record("chien-pao", "iron-hands", 150, 400),
            counter_record("chien-pao", "amoonguss", 100, 200),
        ],
        replays: replays("strong", 10, 1800, RatingSource::Official, &["chien-pao"]),
        ..Snapshot::default()
    });
    let result = engine.check_counter(FORMAT, BUCKET, "chien-pao").await;
    assert_eq!(result.status, PageStatus::Full);
    assert!(!result.show_effectiveness);
}

#[tokio::test]
async fn counter_full_with_enough_wins_and_losses_shows_effectiveness() {
    let engine = engine_over(Snapshot {
        usage: vec![usage_record("chien-pao", 21.3)],
        counters: vec![
            counter_record("chien-pao", "iron-hands", 200, 150),
            counter_record("chien-pao", "amoonguss", 100, 150),
        ],
        replays: replays("strong", 10, 1800, RatingSource::Official, &["chien-pao"]),
        ..Snapshot::default()
    });
    let result = engine.check_counter(FORMAT, BUCKET, "chien-pao").await;
    assert_eq!(result, Eligibility::full(Reason::MeetsAllCriteria).with_effectiveness(true));
}

// ── Archetype pages ─────────────────────────────────────────

#[tokio::test]
async fn archetype_whitelist_ignores_store_state() {
    let store = Arc::new(SnapshotStore::new(Snapshot::default()));
    store.set_unavailable(true);
    let engine = EligibilityEngine::new(store);

    assert_eq!(engine.check_archetype("rain"), Eligibility::full(Reason::InWhitelist));
    assert_eq!(engine.check_archetype("weather"), Eligibility::not_found(Reason::NotInWhitelist));
}

// ── Failure handling ────────────────────────────────────────

/// Delegates to a snapshot but fails every official-only replay count.
struct StrongCountOutage {
    inner: SnapshotStore,
}

#[async_trait]
impl StatsStore for StrongCountOutage {
    async fn pair_synergy(&self, f: &str, b: &str, p: &CanonicalPair, c: i32) -> QueryResult<PairSynergyRecord> {
        self.inner.pair_synergy(f, b, p, c).await
    }

    async fn usage(&self, f: &str, b: &str, p: &str, c: i32) -> QueryResult<UsageRecord> {
        self.inner.usage(f, b, p, c).await
    }

    async fn counter_totals(&self, f: &str, b: &str, t: &str) -> QueryResult<CounterTotals> {
        self.inner.counter_totals(f, b, t).await
    }

    async fn counters(&self, f: &str, b: &str, t: &str) -> QueryResult<CounterRecord> {
        self.inner.counters(f, b, t).await
    }

    async fn count_replays(&self, f: &str, s: &ReplayMatch, filter: ReplayFilter) -> QueryResult<i64> {
        if filter.official_only {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.count_replays(f, s, filter).await
    }

    async fn entity_slugs(&self) -> QueryResult<EntitySlug> {
        self.inner.entity_slugs().await
    }

    async fn latest_time_bucket(&self, f: &str) -> QueryResult<TimeBucket> {
        self.inner.latest_time_bucket(f).await
    }

    async fn previous_time_bucket(&self, f: &str, before: &str) -> QueryResult<TimeBucket> {
        self.inner.previous_time_bucket(f, before).await
    }

    fn backend_name(&self) -> &str {
        "strong-count-outage"
    }
}

#[tokio::test]
async fn strong_gate_failure_proceeds_to_weak_gate() {
    let team = ["incineroar", "rillaboom"];
    let mut all = replays("strong", 30, 1800, RatingSource::Official, &team);
    all.extend(replays("weak", 5, 1710, RatingSource::Unclassified, &team));
    let store = StrongCountOutage {
        inner: SnapshotStore::new(Snapshot {
            pairs: vec![pair_record("incineroar", "rillaboom", 250)],
            replays: all,
            ..Snapshot::default()
        }),
    };
    let engine = EligibilityEngine::new(Arc::new(store));

    let result = engine.check_core(FORMAT, BUCKET, "incineroar", "rillaboom").await;
    assert_eq!(result, Eligibility::degraded(Reason::LimitedHighRatedSamples));
}

#[tokio::test]
async fn unreachable_store_resolves_to_not_found() {
    let store = Arc::new(SnapshotStore::new(Snapshot {
        pairs: vec![pair_record("incineroar", "rillaboom", 250)],
        usage: vec![usage_record("incineroar", 40.0)],
        ..Snapshot::default()
    }));
    store.set_unavailable(true);
    let engine = EligibilityEngine::new(store);

    let core = engine.check_core(FORMAT, BUCKET, "incineroar", "rillaboom").await;
    assert_eq!(core, Eligibility::not_found(Reason::PairRecordMissing));
    let counter = engine.check_counter(FORMAT, BUCKET, "incineroar").await;
    assert_eq!(counter, Eligibility::not_found(Reason::UsageRecordMissing));
}

// ── Concurrency ─────────────────────────────────────────────

#[tokio::test]
async fn independent_pages_evaluate_concurrently() {
    let mut all = replays("core", 10, 1800, RatingSource::Official, &["incineroar", "rillaboom"]);
    all.extend(replays("weak", 20, 1700, RatingSource::Unclassified, &["tornadus"]));
    let engine = Arc::new(engine_over(Snapshot {
        pairs: vec![pair_record("incineroar", "rillaboom", 300)],
        usage: vec![usage_record("tornadus", 9.0)],
        replays: all,
        ..Snapshot::default()
    }));

    let core = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.check_core(FORMAT, BUCKET, "incineroar", "rillaboom").await })
    };
    let counter = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.check_counter(FORMAT, BUCKET, "tornadus").await })
    };

    assert_eq!(core.await.unwrap().status, PageStatus::Full);
    assert_eq!(counter.await.unwrap().status, PageStatus::Degraded);
}
