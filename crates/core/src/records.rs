//! Read-only aggregate records produced by the batch pipeline.
//!
//! Nothing in this workspace writes these; they are deserialized from
//! PostgreSQL rows or JSON snapshots and handed to the eligibility gates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{ArchetypeSlug, EntitySlug, TimeBucket};

/// One entry of a ranked breakdown (top moves, items, abilities, tera types).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedShare {
    pub name: String,
    /// Percentage, 0-100.
    pub usage: f64,
}

/// Usage of a single entity within (format, bucket, cutoff).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub format_id: String,
    pub time_bucket: TimeBucket,
    pub cutoff: i32,
    pub pokemon: EntitySlug,
    /// Percentage, 0-100.
    pub usage_rate: f64,
    pub rank: i32,
    #[serde(default)]
    pub top_moves: Vec<RankedShare>,
    #[serde(default)]
    pub top_items: Vec<RankedShare>,
    #[serde(default)]
    pub top_abilities: Vec<RankedShare>,
    #[serde(default)]
    pub top_tera: Vec<RankedShare>,
}

/// Co-occurrence of an unordered pair; `pokemon_a < pokemon_b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSynergyRecord {
    pub format_id: String,
    pub time_bucket: TimeBucket,
    pub cutoff: i32,
    pub pokemon_a: EntitySlug,
    pub pokemon_b: EntitySlug,
    pub pair_rate: f64,
    /// Number of teams containing both members.
    pub pair_sample_size: i64,
    #[serde(default)]
    pub synergy_score: Option<f64>,
    #[serde(default)]
    pub common_partners: Option<Vec<EntitySlug>>,
    #[serde(default)]
    pub common_archetypes: Option<Vec<String>>,
    #[serde(default)]
    pub sample_teams: Option<Vec<SampleTeam>>,
}

/// What kind of thing a counter answer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    Pokemon,
    Archetype,
    Mechanic,
}

impl std::fmt::Display for AnswerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerType::Pokemon => write!(f, "pokemon"),
            AnswerType::Archetype => write!(f, "archetype"),
            AnswerType::Mechanic => write!(f, "mechanic"),
        }
    }
}

/// One answer to a target entity. Several records share a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterRecord {
    pub format_id: String,
    pub time_bucket: TimeBucket,
    pub cutoff: i32,
    pub target_pokemon: EntitySlug,
    pub answer_type: AnswerType,
    pub answer_key: String,
    /// Signed percentage-point differential; `None` when not computable.
    pub effectiveness_score: Option<f64>,
    pub loss_appearance_rate: f64,
    pub win_appearance_rate: f64,
    pub n_wins: i64,
    pub n_losses: i64,
    #[serde(default)]
    pub evidence_replays: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Summed win/loss counts across every answer of a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterTotals {
    pub total_wins: i64,
    pub total_losses: i64,
}

impl CounterTotals {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CounterRecord>) -> Self {
        records.into_iter().fold(Self::default(), |acc, r| Self {
            total_wins: acc.total_wins + r.n_wins,
            total_losses: acc.total_losses + r.n_losses,
        })
    }
}

/// How a replay's rating was obtained.
///
/// Only `"official"` is distinguished. Any other label the pipeline writes
/// (`"estimated"`, `"unknown"`, null) reads as [`RatingSource::Unclassified`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingSource {
    /// Measured by the ladder itself.
    Official,
    /// Estimated or unknown.
    #[default]
    Unclassified,
}

impl RatingSource {
    pub fn is_official(&self) -> bool {
        matches!(self, RatingSource::Official)
    }
}

impl<'de> Deserialize<'de> for RatingSource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label: Option<String> = Option::deserialize(deserializer)?;
        Ok(match label.as_deref() {
            Some("official") => RatingSource::Official,
            _ => RatingSource::Unclassified,
        })
    }
}

/// Which side won a replay, stored as `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WinnerSide {
    P1,
    P2,
}

impl TryFrom<u8> for WinnerSide {
    type Error = String;

    fn try_from(side: u8) -> Result<Self, Self::Error> {
        match side {
            1 => Ok(WinnerSide::P1),
            2 => Ok(WinnerSide::P2),
            other => Err(format!("winner side must be 1 or 2, got {other}")),
        }
    }
}

impl From<WinnerSide> for u8 {
    fn from(side: WinnerSide) -> Self {
        match side {
            WinnerSide::P1 => 1,
            WinnerSide::P2 => 2,
        }
    }
}

/// An ingested replay. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub replay_id: String,
    pub format_id: String,
    pub rating_estimate: Option<i32>,
    #[serde(default)]
    pub rating_source: RatingSource,
    #[serde(default)]
    pub played_at: Option<DateTime<Utc>>,
    pub p1_team: Vec<EntitySlug>,
    pub p2_team: Vec<EntitySlug>,
    #[serde(default)]
    pub winner_side: Option<WinnerSide>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ReplayRecord {
    /// True when `entity` appears on either team.
    pub fn features(&self, entity: &str) -> bool {
        self.p1_team.iter().any(|p| p == entity) || self.p2_team.iter().any(|p| p == entity)
    }

    /// True when both entities appear together on the same team.
    pub fn features_together(&self, first: &str, second: &str) -> bool {
        let side_has_both = |team: &[EntitySlug]| {
            team.iter().any(|p| p == first) && team.iter().any(|p| p == second)
        };
        side_has_both(&self.p1_team) || side_has_both(&self.p2_team)
    }
}

/// A sample team composition with its paste text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleTeam {
    pub pokemon: Vec<EntitySlug>,
    pub paste: String,
    #[serde(default)]
    pub usage_count: Option<i64>,
}

/// Descriptive archetype content for one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeRecord {
    pub format_id: String,
    pub time_bucket: TimeBucket,
    pub archetype_slug: ArchetypeSlug,
    pub description: Option<String>,
    pub key_pokemon: Vec<EntitySlug>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub meta_share: Option<f64>,
    #[serde(default)]
    pub sample_teams: Option<Vec<SampleTeam>>,
}
