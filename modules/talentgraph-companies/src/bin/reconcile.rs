//! One-shot reconciliation pass over a profile JSON file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use identity_client::IdentityClient;
use talentgraph_common::{Config, PersonProfile};
use talentgraph_companies::{
    IdentitySourceFetcher, PgCompanyStore, Reconciler, ReconcilerConfig, ResolutionCache,
};

#[derive(Parser)]
#[command(about = "Resolve a profile's employer organizations into the company store")]
struct Args {
    /// Path to a profile JSON file.
    profile: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("talentgraph=info".parse()?))
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    config.log_redacted();

    let raw = std::fs::read_to_string(&args.profile)
        .with_context(|| format!("Failed to read {}", args.profile.display()))?;
    let profile: PersonProfile =
        serde_json::from_str(&raw).context("Profile file is not valid JSON")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    let store = PgCompanyStore::new(pool);
    store.migrate().await?;

    let client = IdentityClient::with_timeout(
        &config.identity_api_url,
        &config.identity_api_key,
        Duration::from_secs(config.identity_timeout_secs),
    );

    let cache = Arc::new(ResolutionCache::new(Duration::from_secs(
        config.resolution_cache_ttl_secs,
    )));
    let reconciler = Reconciler::new(
        Arc::new(store),
        Arc::new(IdentitySourceFetcher::new(client)),
        cache,
        ReconcilerConfig::from_config(&config),
    );

    let outcomes = reconciler.reconcile(&profile).await;

    for outcome in &outcomes {
        match (&outcome.name, &outcome.error_message) {
            (Some(name), _) => info!(
                action = %outcome.action,
                company = name.as_str(),
                "Outcome"
            ),
            (None, Some(message)) => warn!(action = %outcome.action, message = message.as_str(), "Outcome"),
            (None, None) => {}
        }
    }

    let failed = outcomes.iter().filter(|o| !o.success).count();
    info!(
        total = outcomes.len(),
        failed,
        "Reconciliation finished"
    );

    // Partial failure is success-with-warnings: the pass itself completed.
    Ok(())
}
