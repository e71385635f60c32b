//! Company store boundary.
//!
//! One trait, two implementations: Postgres for production, in-memory for
//! deterministic tests and fixtures. All pipeline writes go through this
//! trait; no other component touches persistence.

mod memory;
mod postgres;

pub use memory::InMemoryCompanyStore;
pub use postgres::PgCompanyStore;

use async_trait::async_trait;
use talentgraph_common::{CompanyCandidate, CompanyRecord, TalentGraphError};
use uuid::Uuid;

#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Persist a new company. Fails with a validation error when the
    /// candidate name is empty.
    async fn create(&self, candidate: &CompanyCandidate)
        -> Result<CompanyRecord, TalentGraphError>;

    /// Replace the stored row for `id` with `record`, refreshing
    /// `updated_at`. `id` and `created_at` are preserved from the store.
    async fn update(
        &self,
        id: Uuid,
        record: &CompanyRecord,
    ) -> Result<CompanyRecord, TalentGraphError>;

    /// Exact lookup on the upstream identifier.
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<CompanyRecord>, TalentGraphError>;

    /// Cheap retrieval pre-filter for fuzzy matching: records whose name
    /// starts with `prefix`, case-insensitively, in a deterministic order
    /// for a fixed store state. Not the similarity judgment itself.
    async fn search_by_name_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CompanyRecord>, TalentGraphError>;

    /// Single-writer creation for identified companies: create the record,
    /// or merge the candidate atomically when a row with the same
    /// `external_id` already exists. Returns the record and whether it was
    /// newly created. This replaces find-then-create so two concurrent
    /// runs cannot both create the same identified organization.
    async fn create_or_merge_by_external_id(
        &self,
        candidate: &CompanyCandidate,
    ) -> Result<(CompanyRecord, bool), TalentGraphError>;
}
