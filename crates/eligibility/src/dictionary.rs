//! Known entity slugs, used to split compound pair slugs.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use compass_store::StatsStore;

use crate::cache::CacheSlot;
use crate::clock::Clock;

/// Slugs that are always known, even with no database.
pub const BUILTIN_ENTITIES: &[&str] = &[
    "incineroar", "rillaboom", "flutter-mane", "urshifu-rapid-strike", "landorus-therian",
    "iron-hands", "tornadus", "amoonguss", "chien-pao", "pelipper", "chi-yu", "iron-bundle",
    "gholdengo", "annihilape", "dragonite", "kingambit", "great-tusk", "iron-jugulis",
    "arcanine", "gothitelle", "farigiraf", "indeedee-f", "hatterene", "torkoal", "venusaur",
    "whimsicott", "murkrow", "talonflame", "dusclops", "porygon2", "oranguru", "ursaluna",
];

/// A set of canonical entity slugs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDictionary {
    slugs: HashSet<String>,
}

impl EntityDictionary {
    pub fn builtin() -> Self {
        BUILTIN_ENTITIES.iter().map(|s| s.to_string()).collect()
    }

    /// Store slugs merged with [`BUILTIN_ENTITIES`], so an incomplete
    /// `pokemon_dim` table never loses a slug the fallback knows.
    pub fn with_builtin(slugs: impl IntoIterator<Item = String>) -> Self {
        let mut dictionary: Self = slugs.into_iter().collect();
        dictionary
            .slugs
            .extend(BUILTIN_ENTITIES.iter().map(|s| s.to_string()));
        dictionary
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.slugs.contains(slug)
    }

    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}

impl FromIterator<String> for EntityDictionary {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self { slugs: iter.into_iter().collect() }
    }
}

/// TTL cache in front of the store's slug list.
pub struct DictionaryCache {
    store: Arc<dyn StatsStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slot: CacheSlot<Arc<EntityDictionary>>,
}

impl DictionaryCache {
    pub fn new(store: Arc<dyn StatsStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            slot: CacheSlot::new(),
        }
    }

    /// The current dictionary, refreshing first if the TTL has lapsed.
    pub async fn get(&self) -> Arc<EntityDictionary> {
        if let Some(dictionary) = self.slot.fresh(self.clock.now(), self.ttl) {
            return dictionary;
        }
        self.force_refresh().await
    }

    /// Reload from the store now. Never fails.
    ///
    /// On a store error the previous dictionary (or the builtin set) is
    /// re-stamped, so a dead database is retried once per TTL rather than
    /// on every lookup.
    pub async fn force_refresh(&self) -> Arc<EntityDictionary> {
        let now = self.clock.now();
        let dictionary = match self.store.entity_slugs().await {
            Ok(slugs) => {
                let dictionary = Arc::new(EntityDictionary::with_builtin(slugs));
                info!(
                    backend = self.store.backend_name(),
                    slugs = dictionary.len(),
                    "entity dictionary refreshed"
                );
                dictionary
            }
            Err(e) => {
                warn!(error = %e, "entity dictionary refresh failed, keeping last known slugs");
                self.slot.latest().unwrap_or_else(|| {
                    debug!("no previous dictionary, using builtin slugs");
                    Arc::new(EntityDictionary::builtin())
                })
            }
        };
        self.slot.store(dictionary.clone(), now);
        dictionary
    }
}
