//! Gate evaluators and the chain that runs them.
//!
//! A page is classified by running an ordered list of gates. Each gate
//! either decides the page ([`GateOutcome::Terminal`]) or hands over to the
//! next one ([`GateOutcome::Continue`]). A chain that runs out of gates
//! yields not-found.
//!
//! Chains per page kind:
//! - **core**: pair sample size → strong evidence → weak evidence
//! - **counter**: usage rate → strong evidence (+ effectiveness flag) → weak evidence
//! - **archetype**: whitelist membership, always terminal, no data access
//!
//! Every store read goes through [`RowsOrEmpty`], so a failed query is
//! evaluated as if it returned nothing.

use async_trait::async_trait;
use tracing::debug;

use compass_core::{ArchetypeSlug, CanonicalPair, EntitySlug};
use compass_store::{ReplayFilter, ReplayMatch, RowsOrEmpty, StatsStore};

use crate::status::{Eligibility, Reason};
use crate::thresholds::{
    effectiveness_sample_sufficient, ARCHETYPE_WHITELIST, COUNTER_MIN_USAGE_RATE,
    HIGH_RATING_CUTOFF, PAIR_MIN_SAMPLE_SIZE, REPLAY_DEGRADED_THRESHOLD, REPLAY_FULL_THRESHOLD,
    STRONG_EVIDENCE, WEAK_EVIDENCE,
};

// ── Gate seam ───────────────────────────────────────────────────────

/// Result of a single gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Continue,
    Terminal(Eligibility),
}

/// Lookup keys shared by every gate of one evaluation.
pub struct GateContext<'a> {
    pub format_id: &'a str,
    pub time_bucket: &'a str,
    pub store: &'a dyn StatsStore,
}

#[async_trait]
pub trait Gate: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn evaluate(&self, ctx: &GateContext<'_>) -> GateOutcome;
}

/// Count evidence replays, zero on failure.
async fn evidence_count(ctx: &GateContext<'_>, subject: &ReplayMatch, filter: ReplayFilter) -> i64 {
    ctx.store
        .count_replays(ctx.format_id, subject, filter)
        .await
        .rows_or_empty("count_replays")
        .first()
        .copied()
        .unwrap_or(0)
}

// ── Gate A: primary sufficiency ─────────────────────────────────────

/// Pair pages: the pair record must exist with enough co-occurring teams.
pub struct PairSampleGate {
    pub pair: CanonicalPair,
}

#[async_trait]
impl Gate for PairSampleGate {
    fn name(&self) -> &'static str {
        "pair_sample_size"
    }

    async fn evaluate(&self, ctx: &GateContext<'_>) -> GateOutcome {
        let rows = ctx
            .store
            .pair_synergy(ctx.format_id, ctx.time_bucket, &self.pair, HIGH_RATING_CUTOFF)
            .await
            .rows_or_empty("pair_synergy");

        match rows.first() {
            None => GateOutcome::Terminal(Eligibility::not_found(Reason::PairRecordMissing)),
            Some(record) if record.pair_sample_size < PAIR_MIN_SAMPLE_SIZE => {
                debug!(pair = %self.pair, sample_size = record.pair_sample_size, "pair below sample minimum");
                GateOutcome::Terminal(Eligibility::not_found(Reason::SampleSizeBelowMinimum))
            }
            Some(_) => GateOutcome::Continue,
        }
    }
}

/// Counter pages: the target must be used often enough at the high cutoff.
pub struct UsageRateGate {
    pub pokemon: EntitySlug,
}

#[async_trait]
impl Gate for UsageRateGate {
    fn name(&self) -> &'static str {
        "usage_rate"
    }

    async fn evaluate(&self, ctx: &GateContext<'_>) -> GateOutcome {
        let rows = ctx
            .store
            .usage(ctx.format_id, ctx.time_bucket, &self.pokemon, HIGH_RATING_CUTOFF)
            .await
            .rows_or_empty("usage");

        match rows.first() {
            None => GateOutcome::Terminal(Eligibility::not_found(Reason::UsageRecordMissing)),
            // NaN and infinite rates fail closed.
            Some(record)
                if !record.usage_rate.is_finite() || record.usage_rate < COUNTER_MIN_USAGE_RATE =>
            {
                debug!(pokemon = %self.pokemon, usage_rate = record.usage_rate, "usage below minimum");
                GateOutcome::Terminal(Eligibility::not_found(Reason::UsageRateBelowMinimum))
            }
            Some(_) => GateOutcome::Continue,
        }
    }
}

// ── Gate B: strong evidence ─────────────────────────────────────────

/// Enough high-rated, officially rated replays make the page full.
pub struct StrongEvidenceGate {
    pub subject: ReplayMatch,
    /// Counter target whose win/loss totals decide `show_effectiveness`.
    pub effectiveness_target: Option<EntitySlug>,
}

#[async_trait]
impl Gate for StrongEvidenceGate {
    fn name(&self) -> &'static str {
        "strong_evidence"
    }

    async fn evaluate(&self, ctx: &GateContext<'_>) -> GateOutcome {
        let count = evidence_count(ctx, &self.subject, STRONG_EVIDENCE).await;
        if count < REPLAY_FULL_THRESHOLD {
            debug!(count, "strong evidence below full threshold");
            return GateOutcome::Continue;
        }

        let full = Eligibility::full(Reason::MeetsAllCriteria);
        let Some(target) = &self.effectiveness_target else {
            return GateOutcome::Terminal(full);
        };

        let show = ctx
            .store
            .counter_totals(ctx.format_id, ctx.time_bucket, target)
            .await
            .rows_or_empty("counter_totals")
            .first()
            .is_some_and(effectiveness_sample_sufficient);
        GateOutcome::Terminal(full.with_effectiveness(show))
    }
}

// ── Gate C: weak evidence ───────────────────────────────────────────

/// Enough replays at the lower cutoff, any source, keep the page as degraded.
pub struct WeakEvidenceGate {
    pub subject: ReplayMatch,
}

#[async_trait]
impl Gate for WeakEvidenceGate {
    fn name(&self) -> &'static str {
        "weak_evidence"
    }

    async fn evaluate(&self, ctx: &GateContext<'_>) -> GateOutcome {
        let count = evidence_count(ctx, &self.subject, WEAK_EVIDENCE).await;
        if count >= REPLAY_DEGRADED_THRESHOLD {
            GateOutcome::Terminal(Eligibility::degraded(Reason::LimitedHighRatedSamples))
        } else {
            debug!(count, "weak evidence below degraded threshold");
            GateOutcome::Continue
        }
    }
}

// ── Archetype whitelist ─────────────────────────────────────────────

/// Archetype pages exist exactly for the whitelisted slugs.
pub struct ArchetypeWhitelistGate {
    pub slug: String,
}

impl ArchetypeWhitelistGate {
    pub fn decide(slug: &str) -> Eligibility {
        match slug.parse::<ArchetypeSlug>() {
            Ok(archetype) if ARCHETYPE_WHITELIST.contains(&archetype) => {
                Eligibility::full(Reason::InWhitelist)
            }
            _ => Eligibility::not_found(Reason::NotInWhitelist),
        }
    }
}

#[async_trait]
impl Gate for ArchetypeWhitelistGate {
    fn name(&self) -> &'static str {
        "archetype_whitelist"
    }

    async fn evaluate(&self, _ctx: &GateContext<'_>) -> GateOutcome {
        GateOutcome::Terminal(Self::decide(&self.slug))
    }
}

// ── Chain ───────────────────────────────────────────────────────────

/// An ordered list of gates.
pub struct GateChain {
    gates: Vec<Box<dyn Gate>>,
}

impl GateChain {
    pub fn new(gates: Vec<Box<dyn Gate>>) -> Self {
        Self { gates }
    }

    pub fn core(pair: CanonicalPair) -> Self {
        let subject = ReplayMatch::SameSide(pair.clone());
        Self::new(vec![
            Box::new(PairSampleGate { pair }),
            Box::new(StrongEvidenceGate {
                subject: subject.clone(),
                effectiveness_target: None,
            }),
            Box::new(WeakEvidenceGate { subject }),
        ])
    }

    pub fn counter(target: EntitySlug) -> Self {
        let subject = ReplayMatch::EitherSide(target.clone());
        Self::new(vec![
            Box::new(UsageRateGate { pokemon: target.clone() }),
            Box::new(StrongEvidenceGate {
                subject: subject.clone(),
                effectiveness_target: Some(target),
            }),
            Box::new(WeakEvidenceGate { subject }),
        ])
    }

    pub fn archetype(slug: String) -> Self {
        Self::new(vec![Box::new(ArchetypeWhitelistGate { slug })])
    }

    pub fn gate_names(&self) -> Vec<&'static str> {
        self.gates.iter().map(|g| g.name()).collect()
    }

    /// Run gates in order until one decides.
    pub async fn run(&self, ctx: &GateContext<'_>) -> Eligibility {
        for gate in &self.gates {
            match gate.evaluate(ctx).await {
                GateOutcome::Continue => {
                    debug!(gate = gate.name(), "gate passed");
                }
                GateOutcome::Terminal(eligibility) => {
                    debug!(
                        gate = gate.name(),
                        status = %eligibility.status,
                        reason = %eligibility.reason,
                        "gate decided"
                    );
                    return eligibility;
                }
            }
        }
        Eligibility::not_found(Reason::InsufficientReplayEvidence)
    }
}
