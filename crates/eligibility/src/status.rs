use serde::Serialize;

use crate::thresholds::{COUNTER_MIN_USAGE_RATE, PAIR_MIN_SAMPLE_SIZE};

/// How a page is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageStatus {
    Full,
    /// Shown with a limited-data notice.
    Degraded,
    NotFound,
}

impl std::fmt::Display for PageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageStatus::Full => write!(f, "full"),
            PageStatus::Degraded => write!(f, "degraded"),
            PageStatus::NotFound => write!(f, "not-found"),
        }
    }
}

/// Fixed vocabulary explaining a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    MeetsAllCriteria,
    LimitedHighRatedSamples,
    InsufficientReplayEvidence,
    PairRecordMissing,
    SampleSizeBelowMinimum,
    UsageRecordMissing,
    UsageRateBelowMinimum,
    PairUnresolvable,
    InWhitelist,
    NotInWhitelist,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::MeetsAllCriteria => write!(f, "Meets all criteria"),
            Reason::LimitedHighRatedSamples => write!(f, "Limited high-rated samples"),
            Reason::InsufficientReplayEvidence => write!(f, "Insufficient replay evidence"),
            Reason::PairRecordMissing => write!(f, "No pair record"),
            Reason::SampleSizeBelowMinimum => write!(f, "Sample size < {}", PAIR_MIN_SAMPLE_SIZE),
            Reason::UsageRecordMissing => write!(f, "No usage record"),
            Reason::UsageRateBelowMinimum => write!(f, "Usage rate < {}%", COUNTER_MIN_USAGE_RATE),
            Reason::PairUnresolvable => write!(f, "Pair not resolvable"),
            Reason::InWhitelist => write!(f, "In whitelist"),
            Reason::NotInWhitelist => write!(f, "Not in whitelist"),
        }
    }
}

/// The engine's answer for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub status: PageStatus,
    pub reason: Reason,
    /// Counter pages only: whether effectiveness scores may be displayed.
    pub show_effectiveness: bool,
}

impl Eligibility {
    pub fn full(reason: Reason) -> Self {
        Self { status: PageStatus::Full, reason, show_effectiveness: false }
    }

    pub fn degraded(reason: Reason) -> Self {
        Self { status: PageStatus::Degraded, reason, show_effectiveness: false }
    }

    pub fn not_found(reason: Reason) -> Self {
        Self { status: PageStatus::NotFound, reason, show_effectiveness: false }
    }

    pub fn with_effectiveness(mut self, show: bool) -> Self {
        self.show_effectiveness = show;
        self
    }
}
