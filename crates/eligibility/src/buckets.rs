//! Latest time bucket per format, cached.
//!
//! Pages that are not given an explicit bucket read the newest one. When
//! the store is unreachable or empty, the current calendar month is used
//! and nothing is cached, so the next call tries the store again.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use compass_core::TimeBucket;
use compass_store::{RowsOrEmpty, StatsStore};

use crate::cache::KeyedCache;
use crate::clock::Clock;

pub struct TimeBucketCache {
    store: Arc<dyn StatsStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    latest: KeyedCache<String, TimeBucket>,
}

impl TimeBucketCache {
    pub fn new(store: Arc<dyn StatsStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            latest: KeyedCache::new(),
        }
    }

    fn current_month(&self) -> TimeBucket {
        self.clock.now().format("%Y-%m").to_string()
    }

    /// Newest bucket for the format.
    pub async fn latest(&self, format_id: &str) -> TimeBucket {
        let key = format_id.to_string();
        if let Some(bucket) = self.latest.fresh(&key, self.clock.now(), self.ttl) {
            return bucket;
        }
        self.force_refresh(format_id).await
    }

    /// Re-read the newest bucket, bypassing the TTL.
    pub async fn force_refresh(&self, format_id: &str) -> TimeBucket {
        let now = self.clock.now();
        let rows = self
            .store
            .latest_time_bucket(format_id)
            .await
            .rows_or_empty("latest_time_bucket");

        match rows.into_iter().next() {
            Some(bucket) => {
                debug!(format = format_id, bucket = %bucket, "latest time bucket refreshed");
                self.latest.store(format_id.to_string(), bucket.clone(), now);
                bucket
            }
            None => {
                let fallback = self.current_month();
                warn!(format = format_id, fallback = %fallback, "no time bucket in store, using current month");
                fallback
            }
        }
    }

    /// `(current, previous)` for rise/fall comparisons.
    pub async fn last_two(&self, format_id: &str) -> (TimeBucket, Option<TimeBucket>) {
        let current = self.latest(format_id).await;
        let previous = self
            .store
            .previous_time_bucket(format_id, &current)
            .await
            .rows_or_empty("previous_time_bucket")
            .into_iter()
            .next();
        (current, previous)
    }
}
