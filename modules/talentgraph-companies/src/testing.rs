//! Test doubles for the reconciliation pipeline.
//!
//! MockOrganizationFetcher replaces the identity source behind the
//! `OrganizationFetcher` trait: URL-keyed responses, failure injection,
//! optional per-call delay, and in-flight accounting for concurrency
//! assertions. No network, no database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use talentgraph_common::{
    CompanyCandidate, CompanyRef, OrganizationReference, PersonProfile, RoleEntry,
    TalentGraphError,
};

use crate::fetch::OrganizationFetcher;

// ---------------------------------------------------------------------------
// Fixture builders
// ---------------------------------------------------------------------------

/// A minimal valid candidate.
pub fn candidate(name: &str, external_id: Option<&str>) -> CompanyCandidate {
    CompanyCandidate {
        external_id: external_id.map(String::from),
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
    }
}

/// A profile with a current company URL and historical role URLs.
pub fn profile_with(current: Option<&str>, historical: &[&str]) -> PersonProfile {
    PersonProfile {
        full_name: Some("Test Person".to_string()),
        current_company: current.map(|url| CompanyRef {
            external_url: Some(url.to_string()),
            name: None,
        }),
        experiences: historical
            .iter()
            .map(|url| RoleEntry {
                title: None,
                company: Some(CompanyRef {
                    external_url: Some(url.to_string()),
                    name: None,
                }),
                start_date: None,
                end_date: None,
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// MockOrganizationFetcher
// ---------------------------------------------------------------------------

/// URL-keyed fetcher. Builder pattern: `.on_organization()`, `.failing()`,
/// `.with_delay()`. Unregistered URLs return a fetch error.
pub struct MockOrganizationFetcher {
    candidates: HashMap<String, CompanyCandidate>,
    failures: HashMap<String, String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl MockOrganizationFetcher {
    pub fn new() -> Self {
        Self {
            candidates: HashMap::new(),
            failures: HashMap::new(),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_organization(mut self, url: &str, candidate: CompanyCandidate) -> Self {
        self.candidates.insert(url.to_string(), candidate);
        self
    }

    pub fn failing(mut self, url: &str, message: &str) -> Self {
        self.failures.insert(url.to_string(), message.to_string());
        self
    }

    /// Hold each fetch open for `delay`, making concurrency observable.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Highest number of fetches that were ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockOrganizationFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrganizationFetcher for MockOrganizationFetcher {
    async fn fetch(
        &self,
        reference: &OrganizationReference,
    ) -> Result<CompanyCandidate, TalentGraphError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = if let Some(message) = self.failures.get(&reference.external_url) {
            Err(TalentGraphError::Fetch(message.clone()))
        } else {
            self.candidates
                .get(&reference.external_url)
                .cloned()
                .ok_or_else(|| {
                    TalentGraphError::Fetch(format!(
                        "no organization registered for {}",
                        reference.external_url
                    ))
                })
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
