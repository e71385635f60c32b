//! Batch reconciler — the public entry point of the pipeline.
//!
//! Drives extract → fetch → resolve → merge-or-create over one profile.
//! The fetch stage runs under a semaphore with pacing between dispatches;
//! every later stage is sequential. Each item fails independently: the
//! caller always gets one outcome per extracted reference, in extraction
//! order, and `reconcile` itself never errors.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use talentgraph_common::{
    CompanyCandidate, Config, PersonProfile, ReconcileOutcome, TalentGraphError,
};

use crate::cache::ResolutionCache;
use crate::extract::extract_references;
use crate::fetch::OrganizationFetcher;
use crate::merge::merge_candidate;
use crate::resolve::{MatchResolver, DEFAULT_SIMILARITY_THRESHOLD};
use crate::store::CompanyStore;

/// Maximum random jitter added to the pacing delay between dispatches.
const PACING_JITTER_MS: u64 = 50;

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Simultaneous upstream fetches. The store is not bounded by this.
    pub max_concurrent_fetches: usize,
    /// Delay between successive fetch dispatches within the bound.
    pub fetch_pacing: Duration,
    pub similarity_threshold: f64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 3,
            fetch_pacing: Duration::from_secs(1),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl ReconcilerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrent_fetches: config.max_concurrent_fetches,
            fetch_pacing: Duration::from_millis(config.fetch_pacing_ms),
            similarity_threshold: config.similarity_threshold,
        }
    }
}

pub struct Reconciler {
    store: Arc<dyn CompanyStore>,
    fetcher: Arc<dyn OrganizationFetcher>,
    resolver: MatchResolver,
    cache: Arc<ResolutionCache>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn CompanyStore>,
        fetcher: Arc<dyn OrganizationFetcher>,
        cache: Arc<ResolutionCache>,
        config: ReconcilerConfig,
    ) -> Self {
        let resolver = MatchResolver::new(store.clone(), config.similarity_threshold);
        Self {
            store,
            fetcher,
            resolver,
            cache,
            config,
        }
    }

    /// Resolve every organization referenced by `profile` into the store.
    /// Returns one outcome per extracted reference, in extraction order.
    /// Per-item failures are reported in the outcome list, never raised.
    pub async fn reconcile(&self, profile: &PersonProfile) -> Vec<ReconcileOutcome> {
        let references = extract_references(profile);
        if references.is_empty() {
            debug!("Profile references no organizations");
            return Vec::new();
        }
        info!(count = references.len(), "Reconciling organization references");

        let fetched = self.fetch_all(&references).await;

        let mut outcomes = Vec::with_capacity(references.len());
        for (reference, result) in references.iter().zip(fetched) {
            let outcome = match result {
                Ok(candidate) => match self.resolve_and_persist(candidate).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(
                            external_url = reference.external_url.as_str(),
                            error = %e,
                            "Failed to persist organization"
                        );
                        ReconcileOutcome::error(e.to_string())
                    }
                },
                Err(e) => {
                    log_fetch_failure(&reference.external_url, &e);
                    ReconcileOutcome::error(e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| !o.success).count();
        info!(
            total = outcomes.len(),
            failed,
            "Reconciliation batch complete"
        );
        outcomes
    }

    /// Fetch all references with bounded concurrency and pacing. Results
    /// come back in input order regardless of completion order.
    async fn fetch_all(
        &self,
        references: &[talentgraph_common::OrganizationReference],
    ) -> Vec<Result<CompanyCandidate, TalentGraphError>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_fetches.max(1)));
        let mut slots: Vec<Option<Result<CompanyCandidate, TalentGraphError>>> =
            references.iter().map(|_| None).collect();
        let mut handles = Vec::with_capacity(references.len());

        for (idx, reference) in references.iter().cloned().enumerate() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    slots[idx] = Some(Err(TalentGraphError::Fetch(
                        "fetch pool closed".to_string(),
                    )));
                    continue;
                }
            };

            // Pace dispatches while holding a permit, so the delay also
            // throttles throughput within the concurrency bound.
            if idx > 0 && !self.config.fetch_pacing.is_zero() {
                let jitter = Duration::from_millis(rand::rng().random_range(0..PACING_JITTER_MS));
                tokio::time::sleep(self.config.fetch_pacing + jitter).await;
            }

            let fetcher = self.fetcher.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let result = fetcher.fetch(&reference).await;
                (idx, result)
            }));
        }

        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => warn!(error = %e, "Fetch task aborted"),
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| Err(TalentGraphError::Fetch("fetch task aborted".to_string())))
            })
            .collect()
    }

    async fn resolve_and_persist(
        &self,
        candidate: CompanyCandidate,
    ) -> Result<ReconcileOutcome, TalentGraphError> {
        let existing = match candidate.external_id.as_deref() {
            Some(external_id) => match self.cache.lookup(external_id) {
                Some(cached) => {
                    debug!(external_id, "Identifier resolved from cache");
                    Some(cached)
                }
                None => self.resolver.resolve(&candidate).await?,
            },
            None => self.resolver.resolve(&candidate).await?,
        };

        match existing {
            Some(existing) => {
                let merged = merge_candidate(&existing, &candidate);
                let updated = match self.store.update(existing.id, &merged).await {
                    Ok(updated) => updated,
                    Err(e) => {
                        if let Some(external_id) = existing.external_id.as_deref() {
                            self.cache.invalidate(external_id);
                        }
                        return Err(e);
                    }
                };
                self.cache_record(&updated);
                info!(
                    company = updated.name.as_str(),
                    record_id = %updated.id,
                    "Updated existing company"
                );
                Ok(ReconcileOutcome::updated(&updated))
            }
            None if candidate.external_id.is_some() => {
                // Single-writer creation: a concurrent run creating the
                // same identified company resolves to a merge, not a
                // duplicate row.
                let (record, created) = self
                    .store
                    .create_or_merge_by_external_id(&candidate)
                    .await?;
                self.cache_record(&record);
                if created {
                    info!(
                        company = record.name.as_str(),
                        record_id = %record.id,
                        "Created company"
                    );
                    Ok(ReconcileOutcome::created(&record))
                } else {
                    info!(
                        company = record.name.as_str(),
                        record_id = %record.id,
                        "Lost create race, merged instead"
                    );
                    Ok(ReconcileOutcome::updated(&record))
                }
            }
            None => {
                let record = self.store.create(&candidate).await?;
                info!(
                    company = record.name.as_str(),
                    record_id = %record.id,
                    "Created company"
                );
                Ok(ReconcileOutcome::created(&record))
            }
        }
    }

    fn cache_record(&self, record: &talentgraph_common::CompanyRecord) {
        if let Some(external_id) = record.external_id.as_deref() {
            self.cache.record(external_id, record);
        }
    }
}

/// Conversion failures are low-noise data issues; everything else on the
/// fetch path is warn-worthy.
fn log_fetch_failure(external_url: &str, err: &TalentGraphError) {
    match err {
        TalentGraphError::Conversion(_) => {
            debug!(external_url, error = %err, "Dropped unmappable organization")
        }
        _ => warn!(external_url, error = %err, "Failed to fetch organization"),
    }
}
