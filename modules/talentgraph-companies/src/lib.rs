//! Company resolution & reconciliation pipeline.
//!
//! Given a person profile referencing employer organizations, resolve each
//! reference to a single canonical company record: extract references,
//! fetch full records from the identity source under bounded concurrency,
//! match against the store (identifier first, fuzzy name second), and
//! merge without data loss. The sole public entry point is
//! [`reconciler::Reconciler::reconcile`].

pub mod cache;
pub mod convert;
pub mod extract;
pub mod fetch;
pub mod merge;
pub mod normalize;
pub mod reconciler;
pub mod resolve;
pub mod similarity;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;


pub use cache::ResolutionCache;
pub use fetch::{IdentitySourceFetcher, OrganizationFetcher};
pub use reconciler::{Reconciler, ReconcilerConfig};
pub use store::{CompanyStore, InMemoryCompanyStore, PgCompanyStore};
