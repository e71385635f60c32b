use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Profile Types ---

/// Where a company reference was found on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceContext {
    Current,
    Historical,
}

impl std::fmt::Display for SourceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceContext::Current => write!(f, "current"),
            SourceContext::Historical => write!(f, "historical"),
        }
    }
}

/// A company as it appears on a profile: a pointer, not a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRef {
    pub external_url: Option<String>,
    pub name: Option<String>,
}

/// One entry in a profile's work history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleEntry {
    pub title: Option<String>,
    pub company: Option<CompanyRef>,
    /// Display dates as they appear on the profile ("Jan 2019", "2021").
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// The slice of a person profile this subsystem reads. Profiles carry far
/// more; everything else is opaque to company resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonProfile {
    pub full_name: Option<String>,
    pub current_company: Option<CompanyRef>,
    #[serde(default)]
    pub experiences: Vec<RoleEntry>,
}

/// A pointer to an organization extracted from a profile. Ephemeral:
/// produced per extraction pass, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationReference {
    pub external_url: String,
    pub source_context: SourceContext,
}

// --- Company Types ---

/// One address entry on a company record. At most one entry per record is
/// flagged as headquarters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyLocation {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub is_headquarters: bool,
}

/// Most recent funding round, as reported by the upstream source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingInfo {
    pub round_type: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub investor_count: Option<u32>,
}

/// An unpersisted company produced by the fetch/conversion layer. Same
/// shape as [`CompanyRecord`] minus the store-managed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyCandidate {
    pub external_id: Option<String>,
    pub name: String,
    pub domain: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub employee_count: Option<u32>,
    pub employee_range: Option<String>,
    pub year_founded: Option<i32>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub locations: Vec<CompanyLocation>,
    pub funding: Option<FundingInfo>,
}

/// The canonical, deduplicated company record. Exactly one may exist per
/// non-null `external_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: Uuid,
    pub external_id: Option<String>,
    pub name: String,
    pub domain: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub employee_count: Option<u32>,
    pub employee_range: Option<String>,
    pub year_founded: Option<i32>,
    pub industries: Vec<String>,
    pub locations: Vec<CompanyLocation>,
    pub funding: Option<FundingInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyRecord {
    /// The headquarters view: the single flagged location entry, if any.
    /// Derived, not stored separately.
    pub fn headquarters(&self) -> Option<&CompanyLocation> {
        self.locations.iter().find(|l| l.is_headquarters)
    }
}

// --- Reconciliation Outcomes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    Created,
    Updated,
    Error,
}

impl std::fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileAction::Created => write!(f, "created"),
            ReconcileAction::Updated => write!(f, "updated"),
            ReconcileAction::Error => write!(f, "error"),
        }
    }
}

/// Per-reference outcome of a reconciliation pass. The batch always yields
/// one of these per extracted reference, in extraction order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub success: bool,
    pub action: ReconcileAction,
    pub record_id: Option<Uuid>,
    pub name: Option<String>,
    pub error_message: Option<String>,
}

impl ReconcileOutcome {
    pub fn created(record: &CompanyRecord) -> Self {
        Self {
            success: true,
            action: ReconcileAction::Created,
            record_id: Some(record.id),
            name: Some(record.name.clone()),
            error_message: None,
        }
    }

    pub fn updated(record: &CompanyRecord) -> Self {
        Self {
            success: true,
            action: ReconcileAction::Updated,
            record_id: Some(record.id),
            name: Some(record.name.clone()),
            error_message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            action: ReconcileAction::Error,
            record_id: None,
            name: None,
            error_message: Some(message.into()),
        }
    }
}
