//! Split a hyphen-joined pair slug into two known entities.
//!
//! Entity slugs contain hyphens themselves (`urshifu-rapid-strike`), so a
//! pair slug such as `iron-hands-urshifu-rapid-strike` has several possible
//! split points. The first split (shortest left-hand slug) for which both
//! halves are known entities wins; no other heuristic is applied.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use compass_core::CanonicalPair;

use crate::dictionary::{DictionaryCache, EntityDictionary};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No split yields two known entities. Render as not-found; retrying
    /// will not help.
    #[error("pair not resolvable: {0}")]
    Unresolvable(String),
}

/// Lowest-index split of `slug` into two dictionary entries, canonically ordered.
pub fn split_pair(slug: &str, dictionary: &EntityDictionary) -> Option<CanonicalPair> {
    let tokens: Vec<&str> = slug.split('-').collect();
    if tokens.len() < 2 {
        return None;
    }

    (1..tokens.len()).find_map(|i| {
        let first = tokens[..i].join("-");
        let second = tokens[i..].join("-");
        (dictionary.contains(&first) && dictionary.contains(&second))
            .then(|| CanonicalPair::new(first, second))
    })
}

/// Resolves pair slugs against the cached entity dictionary.
pub struct PairResolver {
    dictionary: Arc<DictionaryCache>,
}

impl PairResolver {
    pub fn new(dictionary: Arc<DictionaryCache>) -> Self {
        Self { dictionary }
    }

    pub async fn resolve(&self, slug: &str) -> Result<CanonicalPair, ResolveError> {
        let dictionary = self.dictionary.get().await;
        match split_pair(slug, &dictionary) {
            Some(pair) => {
                debug!(slug, a = pair.a(), b = pair.b(), "pair resolved");
                Ok(pair)
            }
            None => {
                debug!(slug, "pair not resolvable");
                Err(ResolveError::Unresolvable(slug.to_string()))
            }
        }
    }
}
