//! Match resolution — map a candidate to an existing canonical record.

use std::sync::Arc;

use talentgraph_common::{CompanyCandidate, CompanyRecord, TalentGraphError};
use tracing::debug;

use crate::normalize::normalize_name;
use crate::similarity::similarity_ratio;
use crate::store::CompanyStore;

/// Similarity at or above this resolves a candidate to an existing record.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Upper bound on the fuzzy-match candidate set pulled from the store.
const NAME_SEARCH_LIMIT: usize = 25;

pub struct MatchResolver {
    store: Arc<dyn CompanyStore>,
    threshold: f64,
}

impl MatchResolver {
    pub fn new(store: Arc<dyn CompanyStore>, threshold: f64) -> Self {
        Self { store, threshold }
    }

    /// Two phases; the second runs only when the first misses.
    ///
    /// 1. Identifier match: exact `external_id` lookup, returned
    ///    immediately with no further comparison.
    /// 2. Fuzzy name match: prefix search as a retrieval pre-filter, then
    ///    Ratcliff/Obershelp over normalized names; the best score wins if
    ///    it clears the threshold. Ties keep the store's search order, so
    ///    the result is deterministic for a fixed store state.
    pub async fn resolve(
        &self,
        candidate: &CompanyCandidate,
    ) -> Result<Option<CompanyRecord>, TalentGraphError> {
        if let Some(external_id) = candidate.external_id.as_deref() {
            if let Some(existing) = self.store.find_by_external_id(external_id).await? {
                debug!(
                    external_id,
                    record_id = %existing.id,
                    "Resolved by identifier"
                );
                return Ok(Some(existing));
            }
        }

        let normalized = normalize_name(&candidate.name);
        let Some(prefix) = normalized.split(' ').next().filter(|p| !p.is_empty()) else {
            return Ok(None);
        };

        let stored = self
            .store
            .search_by_name_prefix(prefix, NAME_SEARCH_LIMIT)
            .await?;

        let mut best: Option<(f64, CompanyRecord)> = None;
        for existing in stored {
            let score = similarity_ratio(&normalized, &normalize_name(&existing.name));
            // Strictly-greater keeps the earliest candidate on ties.
            if best.as_ref().map(|(b, _)| score > *b).unwrap_or(true) {
                best = Some((score, existing));
            }
        }

        match best {
            Some((score, existing)) if score >= self.threshold => {
                debug!(
                    candidate = candidate.name.as_str(),
                    matched = existing.name.as_str(),
                    score,
                    "Resolved by name similarity"
                );
                Ok(Some(existing))
            }
            Some((score, _)) => {
                debug!(
                    candidate = candidate.name.as_str(),
                    best_score = score,
                    "No name match above threshold"
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCompanyStore;
    use crate::testing::candidate;

    fn resolver(store: Arc<InMemoryCompanyStore>) -> MatchResolver {
        MatchResolver::new(store, DEFAULT_SIMILARITY_THRESHOLD)
    }

    #[tokio::test]
    async fn identifier_match_short_circuits() {
        let store = Arc::new(InMemoryCompanyStore::new());
        // A stored record whose name shares nothing with the candidate.
        let mut seeded = candidate("Completely Different", Some("acme"));
        seeded.description = Some("existing".to_string());
        store.create(&seeded).await.unwrap();

        let resolved = resolver(store)
            .resolve(&candidate("Acme", Some("acme")))
            .await
            .unwrap()
            .expect("identifier match");
        assert_eq!(resolved.name, "Completely Different");
    }

    #[tokio::test]
    async fn fuzzy_match_resolves_suffix_variants() {
        let store = Arc::new(InMemoryCompanyStore::new());
        store.create(&candidate("Test Corp", None)).await.unwrap();

        let resolved = resolver(store)
            .resolve(&candidate("Test Corporation", None))
            .await
            .unwrap();
        assert!(resolved.is_some(), "normalized names are identical");
    }

    #[tokio::test]
    async fn below_threshold_returns_none() {
        let store = Arc::new(InMemoryCompanyStore::new());
        store.create(&candidate("Testament Records", None)).await.unwrap();

        let resolved = resolver(store)
            .resolve(&candidate("Test Kitchen Labs", None))
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn unknown_identifier_falls_through_to_fuzzy() {
        let store = Arc::new(InMemoryCompanyStore::new());
        store.create(&candidate("Acme Data", None)).await.unwrap();

        let resolved = resolver(store)
            .resolve(&candidate("Acme Data Inc", Some("acme-data")))
            .await
            .unwrap();
        assert!(resolved.is_some(), "fuzzy phase should still run");
    }

    #[tokio::test]
    async fn equal_scores_keep_store_order() {
        let store = Arc::new(InMemoryCompanyStore::new());
        let first = store.create(&candidate("Test Corp", None)).await.unwrap();
        store.create(&candidate("Test Corporation", None)).await.unwrap();

        // Both normalize to "test": two perfect scores, first one wins.
        let resolved = resolver(store)
            .resolve(&candidate("Test Inc", None))
            .await
            .unwrap()
            .expect("match");
        assert_eq!(resolved.id, first.id);
    }
}
