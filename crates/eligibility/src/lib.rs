//! Page eligibility gates for the stats site.
//!
//! This crate provides:
//! - [`EligibilityEngine`]: classifies core, counter, and archetype pages as
//!   full, degraded, or not-found from sample-size and replay evidence gates
//! - [`PairResolver`]: splits `a-b` pair slugs against a cached entity dictionary
//! - [`TimeBucketCache`]: latest statistics month per format
//! - the fixed thresholds the gates and renderer share

pub mod buckets;
pub mod cache;
pub mod clock;
pub mod counters;
pub mod dictionary;
pub mod engine;
pub mod gates;
pub mod resolver;
pub mod status;
pub mod thresholds;

#[cfg(test)]
mod testing;

pub use buckets::TimeBucketCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use counters::recommended_answers;
pub use dictionary::{DictionaryCache, EntityDictionary};
pub use engine::{CorePage, EligibilityEngine, PageKey, PageRequest};
pub use resolver::{split_pair, PairResolver, ResolveError};
pub use status::{Eligibility, PageStatus, Reason};
