//! Caller-owned cache of identifier resolutions.
//!
//! Maps an upstream `external_id` to the record it last resolved to, so
//! repeated reconciliation passes skip the store lookup. Owned by the
//! caller and passed into the reconciler as a constructor dependency,
//! never a module-level singleton. Entries expire after a TTL; staleness
//! within the TTL is acceptable because merges only add data.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use talentgraph_common::CompanyRecord;

struct CacheEntry {
    record: CompanyRecord,
    inserted_at: Instant,
}

/// TTL cache over resolved company records, keyed by `external_id`.
/// Interior mutability via a Mutex so the reconciler can share it behind
/// an `Arc` across batches.
pub struct ResolutionCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResolutionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a live entry. Expired entries are removed on the way out.
    pub fn lookup(&self, external_id: &str) -> Option<CompanyRecord> {
        let mut entries = self.lock();
        match entries.get(external_id) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.record.clone()),
            Some(_) => {
                entries.remove(external_id);
                None
            }
            None => None,
        }
    }

    /// Record a resolution, resetting the entry's TTL.
    pub fn record(&self, external_id: &str, record: &CompanyRecord) {
        self.lock().insert(
            external_id.to_string(),
            CacheEntry {
                record: record.clone(),
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop one entry, e.g. after a failed store write for that record.
    pub fn invalidate(&self, external_id: &str) {
        self.lock().remove(external_id);
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.inserted_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A poisoned cache only ever holds clones; recover the data.
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(name: &str) -> CompanyRecord {
        CompanyRecord {
            id: Uuid::new_v4(),
            external_id: Some("acme".to_string()),
            name: name.to_string(),
            domain: None,
            website: None,
            description: None,
            employee_count: None,
            employee_range: None,
            year_founded: None,
            industries: vec![],
            locations: vec![],
            funding: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn lookup_returns_recorded_entry() {
        let cache = ResolutionCache::new(Duration::from_secs(60));
        let rec = record("Acme");
        cache.record("acme", &rec);

        let hit = cache.lookup("acme").unwrap();
        assert_eq!(hit.id, rec.id);
        assert!(cache.lookup("other").is_none());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = ResolutionCache::new(Duration::ZERO);
        cache.record("acme", &record("Acme"));

        assert!(cache.lookup("acme").is_none());
        assert!(cache.is_empty(), "expired entry should be removed");
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = ResolutionCache::new(Duration::from_secs(60));
        cache.record("acme", &record("Acme"));
        cache.invalidate("acme");
        assert!(cache.lookup("acme").is_none());
    }

    #[test]
    fn purge_expired_counts_removals() {
        let cache = ResolutionCache::new(Duration::ZERO);
        cache.record("a", &record("A"));
        cache.record("b", &record("B"));

        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 0);
    }
}
