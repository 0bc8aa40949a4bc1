use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CompassError;

/// Canonical entity identifier, e.g. `urshifu-rapid-strike`.
pub type EntitySlug = String;

/// Calendar-month partition key (`YYYY-MM`).
pub type TimeBucket = String;

/// URL prefix of counter pages (`how-to-beat-incineroar`).
pub const COUNTER_SLUG_PREFIX: &str = "how-to-beat-";

/// An unordered pair of entities, stored lexicographically sorted.
///
/// This is the lookup key of every pair-keyed aggregate, so the order in
/// which a caller names the two entities never matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalPair {
    a: EntitySlug,
    b: EntitySlug,
}

impl CanonicalPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        let (first, second) = (first.into(), second.into());
        if first <= second {
            Self { a: first, b: second }
        } else {
            Self { a: second, b: first }
        }
    }

    /// The lexicographically smaller member.
    pub fn a(&self) -> &str {
        &self.a
    }

    /// The lexicographically larger member.
    pub fn b(&self) -> &str {
        &self.b
    }

    /// Hyphen-joined URL slug in canonical order.
    pub fn slug(&self) -> String {
        format!("{}-{}", self.a, self.b)
    }
}

impl std::fmt::Display for CanonicalPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} + {}", self.a, self.b)
    }
}

/// The closed set of archetypes that get a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchetypeSlug {
    Rain,
    Sun,
    TrickRoom,
    Tailwind,
    Balance,
}

impl ArchetypeSlug {
    pub const ALL: [ArchetypeSlug; 5] = [
        ArchetypeSlug::Rain,
        ArchetypeSlug::Sun,
        ArchetypeSlug::TrickRoom,
        ArchetypeSlug::Tailwind,
        ArchetypeSlug::Balance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchetypeSlug::Rain => "rain",
            ArchetypeSlug::Sun => "sun",
            ArchetypeSlug::TrickRoom => "trick-room",
            ArchetypeSlug::Tailwind => "tailwind",
            ArchetypeSlug::Balance => "balance",
        }
    }
}

impl std::fmt::Display for ArchetypeSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchetypeSlug {
    type Err = CompassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArchetypeSlug::ALL
            .into_iter()
            .find(|slug| slug.as_str() == s)
            .ok_or_else(|| CompassError::UnknownArchetype(s.to_string()))
    }
}

/// Strip the `how-to-beat-` URL prefix from a counter page slug.
/// Input without the prefix is returned unchanged.
pub fn counter_target_from_slug(slug: &str) -> &str {
    slug.strip_prefix(COUNTER_SLUG_PREFIX).unwrap_or(slug)
}
