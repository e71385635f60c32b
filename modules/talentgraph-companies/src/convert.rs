//! Conversion of raw upstream organizations into canonical candidates.
//!
//! All validation runs here, before any store call: an empty name, a
//! negative employee count, or an out-of-range founding year rejects the
//! record. Loose scalar shapes were already absorbed by the identity
//! client's wire types; this layer only bounds and assembles.

use chrono::{Datelike, Utc};
use identity_client::{Numberish, RawLocation, RawOrganization};
use talentgraph_common::{CompanyCandidate, CompanyLocation, FundingInfo, TalentGraphError};
use tracing::debug;

/// Founding years before this are treated as data errors.
const MIN_FOUNDING_YEAR: i64 = 1600;

/// Build a validated [`CompanyCandidate`] from a raw upstream record.
pub fn candidate_from_raw(raw: &RawOrganization) -> Result<CompanyCandidate, TalentGraphError> {
    let name = raw
        .name
        .as_deref()
        .map(collapse_whitespace)
        .unwrap_or_default();
    if name.is_empty() {
        return Err(TalentGraphError::Validation(
            "organization name is empty".to_string(),
        ));
    }

    let employee_count = match coerce_int("employeeCount", &raw.employee_count)? {
        Some(n) if n < 0 => {
            return Err(TalentGraphError::Validation(format!(
                "employee count is negative: {n}"
            )));
        }
        Some(n) => u32::try_from(n).ok(),
        None => None,
    };

    let year_founded = match coerce_int("yearFounded", &raw.year_founded)? {
        Some(year) => {
            let max_year = i64::from(Utc::now().year()) + 1;
            if !(MIN_FOUNDING_YEAR..=max_year).contains(&year) {
                return Err(TalentGraphError::Validation(format!(
                    "founding year out of range: {year}"
                )));
            }
            Some(year as i32)
        }
        None => None,
    };

    let industries = dedup_industries(
        raw.industries
            .clone()
            .map(|i| i.into_vec())
            .unwrap_or_default(),
    );

    let mut locations: Vec<CompanyLocation> = raw.locations.iter().map(location_from_raw).collect();
    keep_first_headquarters(&mut locations);
    synthesize_headquarters(&mut locations, raw);

    Ok(CompanyCandidate {
        external_id: raw.external_id(),
        name,
        domain: clean_opt(&raw.domain),
        website: clean_opt(&raw.website),
        description: clean_opt(&raw.description),
        employee_count,
        employee_range: clean_opt(&raw.employee_range),
        year_founded,
        industries,
        locations,
        funding: raw.funding.as_ref().map(|f| FundingInfo {
            round_type: clean_opt(&f.round_type),
            amount: f.amount.as_ref().and_then(|n| n.as_f64()),
            currency: clean_opt(&f.currency),
            year: f.year.as_ref().and_then(|n| n.as_i64()).map(|y| y as i32),
            month: f
                .month
                .as_ref()
                .and_then(|n| n.as_i64())
                .filter(|m| (1..=12).contains(m))
                .map(|m| m as u32),
            investor_count: f
                .investor_count
                .as_ref()
                .and_then(|n| n.as_i64())
                .and_then(|c| u32::try_from(c).ok()),
        }),
    })
}

/// A present-but-unparseable numeric field means the record cannot be
/// mapped; absence is fine.
fn coerce_int(field: &str, value: &Option<Numberish>) -> Result<Option<i64>, TalentGraphError> {
    match value {
        None => Ok(None),
        Some(n) => match n.as_i64() {
            Some(v) => Ok(Some(v)),
            None => {
                debug!(field, "Unparseable numeric field on upstream record");
                Err(TalentGraphError::Conversion(format!(
                    "{field} is not an integer"
                )))
            }
        },
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_opt(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn dedup_industries(raw: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for value in raw {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(trimmed.to_string());
    }
    out
}

fn location_from_raw(raw: &RawLocation) -> CompanyLocation {
    CompanyLocation {
        line1: clean_opt(&raw.line1),
        line2: clean_opt(&raw.line2),
        city: clean_opt(&raw.city),
        region: clean_opt(&raw.region),
        postal_code: clean_opt(&raw.postal_code),
        country: clean_opt(&raw.country),
        is_headquarters: raw.is_headquarters,
    }
}

/// Invariant repair: at most one location keeps the headquarters flag.
fn keep_first_headquarters(locations: &mut [CompanyLocation]) {
    let mut seen = false;
    for location in locations.iter_mut() {
        if location.is_headquarters {
            if seen {
                location.is_headquarters = false;
            }
            seen = true;
        }
    }
}

/// When the source reports explicit HQ fields but flags no location entry,
/// flag the matching entry instead of storing the view twice; append a new
/// entry only when nothing matches.
fn synthesize_headquarters(locations: &mut Vec<CompanyLocation>, raw: &RawOrganization) {
    if locations.iter().any(|l| l.is_headquarters) {
        return;
    }
    let hq_city = clean_opt(&raw.hq_city);
    let hq_region = clean_opt(&raw.hq_region);
    let hq_country = clean_opt(&raw.hq_country);
    if hq_city.is_none() && hq_region.is_none() && hq_country.is_none() {
        return;
    }

    let matches_hq = |l: &CompanyLocation| {
        eq_opt_ci(&l.city, &hq_city) && (hq_country.is_none() || eq_opt_ci(&l.country, &hq_country))
    };
    if hq_city.is_some() {
        if let Some(existing) = locations.iter_mut().find(|l| matches_hq(l)) {
            existing.is_headquarters = true;
            return;
        }
    }

    locations.push(CompanyLocation {
        line1: None,
        line2: None,
        city: hq_city,
        region: hq_region,
        postal_code: None,
        country: hq_country,
        is_headquarters: true,
    });
}

fn eq_opt_ci(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawOrganization {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn builds_candidate_with_normalized_name() {
        let candidate = candidate_from_raw(&raw(
            r#"{"slug": "acme", "name": "  Acme   Inc ", "employeeCount": 250}"#,
        ))
        .unwrap();
        assert_eq!(candidate.name, "Acme Inc");
        assert_eq!(candidate.external_id.as_deref(), Some("acme"));
        assert_eq!(candidate.employee_count, Some(250));
    }

    #[test]
    fn empty_name_is_a_validation_error() {
        let err = candidate_from_raw(&raw(r#"{"slug": "x", "name": "   "}"#)).unwrap_err();
        assert!(matches!(err, TalentGraphError::Validation(_)), "{err}");

        let err = candidate_from_raw(&raw(r#"{"slug": "x"}"#)).unwrap_err();
        assert!(matches!(err, TalentGraphError::Validation(_)), "{err}");
    }

    #[test]
    fn negative_employee_count_is_rejected() {
        let err =
            candidate_from_raw(&raw(r#"{"name": "Acme", "employeeCount": -3}"#)).unwrap_err();
        assert!(matches!(err, TalentGraphError::Validation(_)), "{err}");
    }

    #[test]
    fn founding_year_is_bounded() {
        let err = candidate_from_raw(&raw(r#"{"name": "Acme", "yearFounded": 1500}"#)).unwrap_err();
        assert!(matches!(err, TalentGraphError::Validation(_)), "{err}");

        let err = candidate_from_raw(&raw(r#"{"name": "Acme", "yearFounded": 3000}"#)).unwrap_err();
        assert!(matches!(err, TalentGraphError::Validation(_)), "{err}");

        let ok = candidate_from_raw(&raw(r#"{"name": "Acme", "yearFounded": "1999"}"#)).unwrap();
        assert_eq!(ok.year_founded, Some(1999));
    }

    #[test]
    fn unparseable_count_is_a_conversion_error() {
        let err =
            candidate_from_raw(&raw(r#"{"name": "Acme", "employeeCount": "lots"}"#)).unwrap_err();
        assert!(matches!(err, TalentGraphError::Conversion(_)), "{err}");
    }

    #[test]
    fn industries_are_deduplicated_case_insensitively() {
        let candidate = candidate_from_raw(&raw(
            r#"{"name": "Acme", "industries": ["Software", "software ", "Fintech"]}"#,
        ))
        .unwrap();
        assert_eq!(candidate.industries, vec!["Software", "Fintech"]);
    }

    #[test]
    fn hq_fields_flag_a_matching_location() {
        let candidate = candidate_from_raw(&raw(
            r#"{
                "name": "Acme",
                "locations": [
                    {"city": "Berlin", "country": "Germany"},
                    {"city": "Paris", "country": "France"}
                ],
                "hqCity": "berlin", "hqCountry": "germany"
            }"#,
        ))
        .unwrap();
        assert_eq!(candidate.locations.len(), 2);
        let hq = candidate
            .locations
            .iter()
            .find(|l| l.is_headquarters)
            .unwrap();
        assert_eq!(hq.city.as_deref(), Some("Berlin"));
    }

    #[test]
    fn hq_fields_append_when_nothing_matches() {
        let candidate = candidate_from_raw(&raw(
            r#"{"name": "Acme", "locations": [{"city": "Paris"}], "hqCity": "Berlin"}"#,
        ))
        .unwrap();
        assert_eq!(candidate.locations.len(), 2);
        assert!(candidate.locations[1].is_headquarters);
        assert_eq!(candidate.locations[1].city.as_deref(), Some("Berlin"));
    }

    #[test]
    fn flagged_location_suppresses_synthesis() {
        let candidate = candidate_from_raw(&raw(
            r#"{
                "name": "Acme",
                "locations": [{"city": "Paris", "isHeadquarters": true}],
                "hqCity": "Berlin"
            }"#,
        ))
        .unwrap();
        assert_eq!(candidate.locations.len(), 1);
    }

    #[test]
    fn multiple_flagged_locations_keep_only_the_first() {
        let candidate = candidate_from_raw(&raw(
            r#"{
                "name": "Acme",
                "locations": [
                    {"city": "Paris", "isHeadquarters": true},
                    {"city": "Berlin", "isHeadquarters": true}
                ]
            }"#,
        ))
        .unwrap();
        let flagged: Vec<_> = candidate
            .locations
            .iter()
            .filter(|l| l.is_headquarters)
            .collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].city.as_deref(), Some("Paris"));
    }

    #[test]
    fn funding_is_mapped_with_bounded_month() {
        let candidate = candidate_from_raw(&raw(
            r#"{
                "name": "Acme",
                "funding": {
                    "roundType": "Series B",
                    "amount": "42000000",
                    "currency": "USD",
                    "year": 2023,
                    "month": 14,
                    "investorCount": "6"
                }
            }"#,
        ))
        .unwrap();
        let funding = candidate.funding.unwrap();
        assert_eq!(funding.round_type.as_deref(), Some("Series B"));
        assert_eq!(funding.amount, Some(42_000_000.0));
        assert_eq!(funding.year, Some(2023));
        assert_eq!(funding.month, None);
        assert_eq!(funding.investor_count, Some(6));
    }
}
