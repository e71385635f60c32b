//! In-memory company store — deterministic, insertion-ordered.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use talentgraph_common::{CompanyCandidate, CompanyRecord, TalentGraphError};
use uuid::Uuid;

use super::CompanyStore;
use crate::merge::merge_candidate;

/// Vec-backed store. Insertion order doubles as the search order, which
/// keeps fuzzy-match tie-breaks deterministic in tests.
#[derive(Default)]
pub struct InMemoryCompanyStore {
    records: Mutex<Vec<CompanyRecord>>,
}

impl InMemoryCompanyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing record, bypassing candidate validation. Test setup
    /// helper.
    pub fn seed(&self, record: CompanyRecord) {
        self.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn all(&self) -> Vec<CompanyRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CompanyRecord>> {
        self.records.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn insert(records: &mut Vec<CompanyRecord>, candidate: &CompanyCandidate) -> Result<CompanyRecord, TalentGraphError> {
        if candidate.name.trim().is_empty() {
            return Err(TalentGraphError::Validation(
                "company name must not be empty".to_string(),
            ));
        }
        let now = Utc::now();
        let record = CompanyRecord {
            id: Uuid::new_v4(),
            external_id: candidate.external_id.clone(),
            name: candidate.name.clone(),
            domain: candidate.domain.clone(),
            website: candidate.website.clone(),
            description: candidate.description.clone(),
            employee_count: candidate.employee_count,
            employee_range: candidate.employee_range.clone(),
            year_founded: candidate.year_founded,
            industries: candidate.industries.clone(),
            locations: candidate.locations.clone(),
            funding: candidate.funding.clone(),
            created_at: now,
            updated_at: now,
        };
        records.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl CompanyStore for InMemoryCompanyStore {
    async fn create(
        &self,
        candidate: &CompanyCandidate,
    ) -> Result<CompanyRecord, TalentGraphError> {
        let mut records = self.lock();
        Self::insert(&mut records, candidate)
    }

    async fn update(
        &self,
        id: Uuid,
        record: &CompanyRecord,
    ) -> Result<CompanyRecord, TalentGraphError> {
        let mut records = self.lock();
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| TalentGraphError::Store(format!("no company with id {id}")))?;

        let mut updated = record.clone();
        updated.id = slot.id;
        updated.created_at = slot.created_at;
        updated.updated_at = Utc::now();
        *slot = updated.clone();
        Ok(updated)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<CompanyRecord>, TalentGraphError> {
        Ok(self
            .lock()
            .iter()
            .find(|r| r.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn search_by_name_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CompanyRecord>, TalentGraphError> {
        let prefix = prefix.to_lowercase();
        Ok(self
            .lock()
            .iter()
            .filter(|r| r.name.to_lowercase().starts_with(&prefix))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_or_merge_by_external_id(
        &self,
        candidate: &CompanyCandidate,
    ) -> Result<(CompanyRecord, bool), TalentGraphError> {
        let Some(external_id) = candidate.external_id.as_deref() else {
            let mut records = self.lock();
            return Self::insert(&mut records, candidate).map(|r| (r, true));
        };

        // One lock for the whole check-then-act: this is the single-writer
        // guarantee the reconciler relies on.
        let mut records = self.lock();
        if let Some(slot) = records
            .iter_mut()
            .find(|r| r.external_id.as_deref() == Some(external_id))
        {
            let mut merged = merge_candidate(slot, candidate);
            merged.updated_at = Utc::now();
            *slot = merged.clone();
            return Ok((merged, false));
        }

        Self::insert(&mut records, candidate).map(|r| (r, true))
    }
}
