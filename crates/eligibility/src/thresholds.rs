//! Fixed eligibility thresholds. Not configurable at runtime.

use compass_core::{ArchetypeSlug, CounterTotals};
use compass_store::ReplayFilter;

/// Minimum rating for strong evidence, and the cutoff of the primary
/// usage / pair aggregates.
pub const HIGH_RATING_CUTOFF: i32 = 1760;
/// Minimum rating for the weak evidence fallback.
pub const LOW_RATING_CUTOFF: i32 = 1700;

pub const PAIR_MIN_SAMPLE_SIZE: i64 = 200;
/// Percentage.
pub const COUNTER_MIN_USAGE_RATE: f64 = 2.0;
pub const COUNTER_MIN_WINS: i64 = 300;
pub const COUNTER_MIN_LOSSES: i64 = 300;
/// Percentage points. Applied by the renderer, see [`crate::counters`].
pub const EFFECTIVENESS_MIN_SCORE: f64 = 10.0;

pub const REPLAY_FULL_THRESHOLD: i64 = 10;
pub const REPLAY_DEGRADED_THRESHOLD: i64 = 20;

pub const ARCHETYPE_WHITELIST: [ArchetypeSlug; 5] = ArchetypeSlug::ALL;

/// Replays that can promote a page to full.
pub const STRONG_EVIDENCE: ReplayFilter = ReplayFilter {
    min_rating: HIGH_RATING_CUTOFF,
    official_only: true,
};

/// Replays that can keep a page alive as degraded.
pub const WEAK_EVIDENCE: ReplayFilter = ReplayFilter {
    min_rating: LOW_RATING_CUTOFF,
    official_only: false,
};

/// Whether a target has enough decided games to show effectiveness scores.
pub fn effectiveness_sample_sufficient(totals: &CounterTotals) -> bool {
    totals.total_wins >= COUNTER_MIN_WINS && totals.total_losses >= COUNTER_MIN_LOSSES
}
