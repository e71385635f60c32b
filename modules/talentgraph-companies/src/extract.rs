//! Reference extraction — scan a profile for employer organizations.

use std::collections::HashSet;

use talentgraph_common::{CompanyRef, OrganizationReference, PersonProfile, SourceContext};

/// Extract the deduplicated, order-preserving list of organization
/// references from a profile: current company first (if present), then
/// historical roles in their original order. A URL already emitted is
/// skipped on later occurrences; references with no usable URL are
/// silently dropped. No cap is applied here; cost control belongs to the
/// reconciler.
pub fn extract_references(profile: &PersonProfile) -> Vec<OrganizationReference> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut references = Vec::new();

    if let Some(current) = &profile.current_company {
        if let Some(url) = usable_url(current) {
            seen.insert(url.clone());
            references.push(OrganizationReference {
                external_url: url,
                source_context: SourceContext::Current,
            });
        }
    }

    for role in &profile.experiences {
        let Some(company) = &role.company else {
            continue;
        };
        let Some(url) = usable_url(company) else {
            continue;
        };
        if seen.insert(url.clone()) {
            references.push(OrganizationReference {
                external_url: url,
                source_context: SourceContext::Historical,
            });
        }
    }

    references
}

fn usable_url(company: &CompanyRef) -> Option<String> {
    let url = company.external_url.as_deref()?.trim();
    if url.is_empty() {
        return None;
    }
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use talentgraph_common::RoleEntry;

    fn company(url: Option<&str>) -> CompanyRef {
        CompanyRef {
            external_url: url.map(String::from),
            name: None,
        }
    }

    fn role(url: Option<&str>) -> RoleEntry {
        RoleEntry {
            title: None,
            company: Some(company(url)),
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn current_first_then_historical_in_order() {
        let profile = PersonProfile {
            full_name: None,
            current_company: Some(company(Some("u/acme"))),
            experiences: vec![role(Some("u/beta")), role(Some("u/gamma"))],
        };

        let refs = extract_references(&profile);
        let urls: Vec<&str> = refs.iter().map(|r| r.external_url.as_str()).collect();
        assert_eq!(urls, vec!["u/acme", "u/beta", "u/gamma"]);
        assert_eq!(refs[0].source_context, SourceContext::Current);
        assert_eq!(refs[1].source_context, SourceContext::Historical);
    }

    #[test]
    fn duplicate_url_keeps_first_occurrence_and_position() {
        let profile = PersonProfile {
            full_name: None,
            current_company: Some(company(Some("u/acme"))),
            experiences: vec![role(Some("u/acme")), role(Some("u/beta"))],
        };

        let refs = extract_references(&profile);
        let urls: Vec<&str> = refs.iter().map(|r| r.external_url.as_str()).collect();
        assert_eq!(urls, vec!["u/acme", "u/beta"]);
        assert_eq!(refs[0].source_context, SourceContext::Current);
    }

    #[test]
    fn missing_and_blank_urls_are_skipped() {
        let profile = PersonProfile {
            full_name: None,
            current_company: Some(company(None)),
            experiences: vec![
                role(Some("  ")),
                role(None),
                RoleEntry {
                    title: Some("Advisor".to_string()),
                    company: None,
                    start_date: None,
                    end_date: None,
                },
                role(Some("u/delta")),
            ],
        };

        let refs = extract_references(&profile);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].external_url, "u/delta");
    }

    #[test]
    fn no_cap_on_reference_count() {
        let experiences: Vec<RoleEntry> = (0..40)
            .map(|i| role(Some(&format!("u/org-{i}"))))
            .collect();
        let profile = PersonProfile {
            full_name: None,
            current_company: None,
            experiences,
        };

        assert_eq!(extract_references(&profile).len(), 40);
    }
}
