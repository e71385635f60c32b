//! Merge engine — non-destructive combination of a candidate into an
//! existing canonical record.

use chrono::Utc;
use talentgraph_common::{CompanyCandidate, CompanyLocation, CompanyRecord};

/// Merge a candidate into an existing record. Pure function of its two
/// inputs:
///
/// - non-null candidate scalars replace existing values; null candidate
///   fields leave the existing value untouched,
/// - `industries` is a case-insensitive union, existing entries first,
/// - `locations` is an append-only concatenation (duplicate addresses are
///   tolerated), keeping at most one headquarters flag,
/// - `id`, `created_at`, and a non-null existing `external_id` are never
///   overwritten.
///
/// The store refreshes `updated_at` when the merged record is written.
pub fn merge_candidate(existing: &CompanyRecord, candidate: &CompanyCandidate) -> CompanyRecord {
    let external_id = existing
        .external_id
        .clone()
        .or_else(|| candidate.external_id.clone());

    let name = if candidate.name.trim().is_empty() {
        existing.name.clone()
    } else {
        candidate.name.clone()
    };

    CompanyRecord {
        id: existing.id,
        external_id,
        name,
        domain: candidate.domain.clone().or_else(|| existing.domain.clone()),
        website: candidate
            .website
            .clone()
            .or_else(|| existing.website.clone()),
        description: candidate
            .description
            .clone()
            .or_else(|| existing.description.clone()),
        employee_count: candidate.employee_count.or(existing.employee_count),
        employee_range: candidate
            .employee_range
            .clone()
            .or_else(|| existing.employee_range.clone()),
        year_founded: candidate.year_founded.or(existing.year_founded),
        industries: union_industries(&existing.industries, &candidate.industries),
        locations: concat_locations(&existing.locations, &candidate.locations),
        funding: candidate.funding.clone().or_else(|| existing.funding.clone()),
        created_at: existing.created_at,
        updated_at: Utc::now(),
    }
}

/// Union of industry lists, deduplicated case-insensitively after
/// trimming: existing entries in order, then candidate entries not already
/// present, in first-seen order.
fn union_industries(existing: &[String], candidate: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out: Vec<String> = Vec::new();

    for value in existing.iter().chain(candidate.iter()) {
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

/// Append candidate locations to the existing list. The existing
/// headquarters flag wins; candidate flags survive only when the existing
/// list has none, and only the first of them.
fn concat_locations(
    existing: &[CompanyLocation],
    candidate: &[CompanyLocation],
) -> Vec<CompanyLocation> {
    let mut out: Vec<CompanyLocation> = existing.to_vec();
    let mut has_hq = out.iter().any(|l| l.is_headquarters);

    for location in candidate {
        let mut location = location.clone();
        if location.is_headquarters {
            if has_hq {
                location.is_headquarters = false;
            } else {
                has_hq = true;
            }
        }
        out.push(location);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(name: &str) -> CompanyRecord {
        CompanyRecord {
            id: Uuid::new_v4(),
            external_id: None,
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
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn candidate(name: &str) -> CompanyCandidate {
        CompanyCandidate {
            external_id: None,
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

    fn location(city: &str, hq: bool) -> CompanyLocation {
        CompanyLocation {
            line1: None,
            line2: None,
            city: Some(city.to_string()),
            region: None,
            postal_code: None,
            country: None,
            is_headquarters: hq,
        }
    }

    #[test]
    fn null_candidate_fields_leave_existing_untouched() {
        let mut existing = record("Acme");
        existing.description = Some("Widget maker".to_string());
        existing.employee_count = Some(120);

        let merged = merge_candidate(&existing, &candidate("Acme"));
        assert_eq!(merged.description.as_deref(), Some("Widget maker"));
        assert_eq!(merged.employee_count, Some(120));
    }

    #[test]
    fn non_null_candidate_scalars_replace() {
        let mut existing = record("Acme");
        existing.description = Some("Old description".to_string());

        let mut cand = candidate("Acme Corp");
        cand.description = Some("New description".to_string());
        cand.year_founded = Some(2004);

        let merged = merge_candidate(&existing, &cand);
        assert_eq!(merged.name, "Acme Corp");
        assert_eq!(merged.description.as_deref(), Some("New description"));
        assert_eq!(merged.year_founded, Some(2004));
    }

    #[test]
    fn id_created_at_and_existing_external_id_survive() {
        let mut existing = record("Acme");
        existing.external_id = Some("acme".to_string());
        let id = existing.id;
        let created = existing.created_at;

        let mut cand = candidate("Acme");
        cand.external_id = Some("different-slug".to_string());

        let merged = merge_candidate(&existing, &cand);
        assert_eq!(merged.id, id);
        assert_eq!(merged.created_at, created);
        assert_eq!(merged.external_id.as_deref(), Some("acme"));
    }

    #[test]
    fn candidate_external_id_fills_a_null() {
        let existing = record("Acme");
        let mut cand = candidate("Acme");
        cand.external_id = Some("acme".to_string());

        let merged = merge_candidate(&existing, &cand);
        assert_eq!(merged.external_id.as_deref(), Some("acme"));
    }

    #[test]
    fn industries_union_is_case_insensitive_first_seen_order() {
        let mut existing = record("Acme");
        existing.industries = vec!["Software".to_string(), "Fintech".to_string()];

        let mut cand = candidate("Acme");
        cand.industries = vec![
            "software".to_string(),
            "  Robotics ".to_string(),
            "FINTECH".to_string(),
        ];

        let merged = merge_candidate(&existing, &cand);
        assert_eq!(merged.industries, vec!["Software", "Fintech", "Robotics"]);
    }

    #[test]
    fn industries_superset_law() {
        let mut existing = record("Acme");
        existing.industries = vec!["A".to_string(), "B".to_string()];
        let mut cand = candidate("Acme");
        cand.industries = vec!["b".to_string(), "C".to_string()];

        let merged = merge_candidate(&existing, &cand);
        for value in existing.industries.iter().chain(cand.industries.iter()) {
            assert!(
                merged
                    .industries
                    .iter()
                    .any(|m| m.eq_ignore_ascii_case(value)),
                "{value} missing from union"
            );
        }
    }

    #[test]
    fn locations_concatenate_append_only() {
        let mut existing = record("Acme");
        existing.locations = vec![location("Berlin", false)];
        let mut cand = candidate("Acme");
        cand.locations = vec![location("Berlin", false), location("Paris", false)];

        let merged = merge_candidate(&existing, &cand);
        assert_eq!(merged.locations.len(), 3);
    }

    #[test]
    fn existing_headquarters_flag_wins() {
        let mut existing = record("Acme");
        existing.locations = vec![location("Berlin", true)];
        let mut cand = candidate("Acme");
        cand.locations = vec![location("Paris", true)];

        let merged = merge_candidate(&existing, &cand);
        let flagged: Vec<_> = merged
            .locations
            .iter()
            .filter(|l| l.is_headquarters)
            .collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].city.as_deref(), Some("Berlin"));
    }

    #[test]
    fn candidate_headquarters_used_when_existing_has_none() {
        let mut existing = record("Acme");
        existing.locations = vec![location("Berlin", false)];
        let mut cand = candidate("Acme");
        cand.locations = vec![location("Paris", true), location("Lyon", true)];

        let merged = merge_candidate(&existing, &cand);
        let flagged: Vec<_> = merged
            .locations
            .iter()
            .filter(|l| l.is_headquarters)
            .collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].city.as_deref(), Some("Paris"));
    }
}
