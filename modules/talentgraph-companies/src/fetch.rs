//! Upstream fetch boundary.
//!
//! `OrganizationFetcher` is the trait the reconciler depends on; the one
//! production implementation wraps the identity client and the conversion
//! layer. Mock implementations live in `testing` for deterministic
//! pipeline tests with no network.

use async_trait::async_trait;
use identity_client::{IdentityClient, IdentityError};
use talentgraph_common::{CompanyCandidate, OrganizationReference, TalentGraphError};
use tracing::debug;

use crate::convert::candidate_from_raw;

#[async_trait]
pub trait OrganizationFetcher: Send + Sync {
    /// Fetch and convert the full organization record for one reference.
    /// One call, one upstream request; the reconciler supplies concurrency
    /// and pacing. No internal retry.
    async fn fetch(
        &self,
        reference: &OrganizationReference,
    ) -> Result<CompanyCandidate, TalentGraphError>;
}

/// Production fetcher backed by the identity source.
pub struct IdentitySourceFetcher {
    client: IdentityClient,
}

impl IdentitySourceFetcher {
    pub fn new(client: IdentityClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrganizationFetcher for IdentitySourceFetcher {
    async fn fetch(
        &self,
        reference: &OrganizationReference,
    ) -> Result<CompanyCandidate, TalentGraphError> {
        let raw = self
            .client
            .fetch_organization(&reference.external_url)
            .await
            .map_err(|e| fetch_error(&reference.external_url, e))?;

        let candidate = candidate_from_raw(&raw)?;
        debug!(
            external_url = reference.external_url.as_str(),
            company = candidate.name.as_str(),
            "Fetched organization candidate"
        );
        Ok(candidate)
    }
}

/// Not-found, timeout, and malformed responses all collapse into a fetch
/// error; the caller skips and continues either way, only the text differs.
fn fetch_error(external_url: &str, err: IdentityError) -> TalentGraphError {
    match err {
        IdentityError::Parse(msg) => {
            TalentGraphError::Fetch(format!("malformed response for {external_url}: {msg}"))
        }
        other => TalentGraphError::Fetch(format!("{external_url}: {other}")),
    }
}
