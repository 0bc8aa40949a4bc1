//! Page eligibility entry points.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use compass_core::{CanonicalPair, EntitySlug};
use compass_store::StatsStore;

use crate::gates::{ArchetypeWhitelistGate, GateChain, GateContext};
use crate::resolver::PairResolver;
use crate::status::{Eligibility, Reason};

/// The key a page is looked up by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageKey {
    Core { pair: CanonicalPair },
    Counter { target: EntitySlug },
    Archetype { slug: String },
}

impl PageKey {
    fn chain(&self) -> GateChain {
        match self {
            PageKey::Core { pair } => GateChain::core(pair.clone()),
            PageKey::Counter { target } => GateChain::counter(target.clone()),
            PageKey::Archetype { slug } => GateChain::archetype(slug.clone()),
        }
    }
}

/// One page to classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub format_id: String,
    pub time_bucket: String,
    pub key: PageKey,
}

/// A core page decision together with the pair its slug resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorePage {
    /// `None` when the slug did not split into two known entities.
    pub pair: Option<CanonicalPair>,
    pub eligibility: Eligibility,
}

/// Classifies pages as full, degraded, or not-found.
///
/// Holds no per-request state; one engine can serve any number of
/// concurrent evaluations.
pub struct EligibilityEngine {
    store: Arc<dyn StatsStore>,
}

impl EligibilityEngine {
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self { store }
    }

    /// Run the gate chain for the request's page kind.
    pub async fn evaluate(&self, request: &PageRequest) -> Eligibility {
        let ctx = GateContext {
            format_id: &request.format_id,
            time_bucket: &request.time_bucket,
            store: self.store.as_ref(),
        };
        let eligibility = request.key.chain().run(&ctx).await;
        info!(
            format = %request.format_id,
            bucket = %request.time_bucket,
            key = ?request.key,
            status = %eligibility.status,
            reason = %eligibility.reason,
            "page eligibility evaluated"
        );
        eligibility
    }

    /// Core (pair) page. Member order does not matter.
    pub async fn check_core(
        &self,
        format_id: &str,
        time_bucket: &str,
        first: &str,
        second: &str,
    ) -> Eligibility {
        self.evaluate(&PageRequest {
            format_id: format_id.to_string(),
            time_bucket: time_bucket.to_string(),
            key: PageKey::Core { pair: CanonicalPair::new(first, second) },
        })
        .await
    }

    /// Core page addressed by its URL slug. The slug is resolved once.
    pub async fn check_core_slug(
        &self,
        resolver: &PairResolver,
        format_id: &str,
        time_bucket: &str,
        slug: &str,
    ) -> CorePage {
        match resolver.resolve(slug).await {
            Ok(pair) => {
                let eligibility = self.check_core(format_id, time_bucket, pair.a(), pair.b()).await;
                CorePage { pair: Some(pair), eligibility }
            }
            Err(_) => CorePage {
                pair: None,
                eligibility: Eligibility::not_found(Reason::PairUnresolvable),
            },
        }
    }

    /// Counter page for a single target.
    pub async fn check_counter(&self, format_id: &str, time_bucket: &str, target: &str) -> Eligibility {
        self.evaluate(&PageRequest {
            format_id: format_id.to_string(),
            time_bucket: time_bucket.to_string(),
            key: PageKey::Counter { target: target.to_string() },
        })
        .await
    }

    /// Archetype page. Pure whitelist check, no store access.
    pub fn check_archetype(&self, slug: &str) -> Eligibility {
        ArchetypeWhitelistGate::decide(slug)
    }
}
