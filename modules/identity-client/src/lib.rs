pub mod error;
pub mod types;

pub use error::{IdentityError, Result};
pub use types::{Numberish, OneOrMany, RawFunding, RawLocation, RawOrganization};

use std::time::Duration;

/// Default per-request timeout. A hung upstream call must not stall a
/// reconciliation batch longer than this.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client with static config");
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Fetch the full organization record for a profile-supplied reference
    /// URL (e.g. "u/acme"). One request, no internal retry.
    pub async fn fetch_organization(&self, external_url: &str) -> Result<RawOrganization> {
        let url = format!("{}/v1/organizations", self.base_url);
        tracing::debug!(external_url, "Fetching organization from identity source");

        let resp = self
            .client
            .get(&url)
            .query(&[("url", external_url)])
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 404 {
            return Err(IdentityError::NotFound(external_url.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let org: RawOrganization = serde_json::from_str(&body)?;
        tracing::debug!(
            external_url,
            name = org.name.as_deref().unwrap_or("<unnamed>"),
            "Fetched organization"
        );
        Ok(org)
    }
}
