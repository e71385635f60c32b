use serde::Deserialize;

// --- Coercion helpers ---
//
// The identity source is loose about scalar shapes: counts arrive as
// numbers or numeric strings depending on the enrichment path that
// produced them. All of that tolerance lives in this module; callers only
// ever see typed options.

/// A JSON value that may be a number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numberish {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Numberish {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Numberish::Int(n) => Some(*n),
            Numberish::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Numberish::Float(_) => None,
            Numberish::Str(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Numberish::Int(n) => Some(*n as f64),
            Numberish::Float(f) => Some(*f),
            Numberish::Str(s) => s.trim().parse().ok(),
        }
    }
}

/// A field that may be a single string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

// --- Wire types ---

/// A location entry as the identity source reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLocation {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    #[serde(rename = "postalCode")]
    pub postal_code: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "isHeadquarters", default)]
    pub is_headquarters: bool,
}

/// Latest funding round data, when the source has it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFunding {
    #[serde(rename = "roundType")]
    pub round_type: Option<String>,
    pub amount: Option<Numberish>,
    pub currency: Option<String>,
    pub year: Option<Numberish>,
    pub month: Option<Numberish>,
    #[serde(rename = "investorCount")]
    pub investor_count: Option<Numberish>,
}

/// A raw organization record from the identity source. Field shapes are
/// deliberately loose here; use the typed accessors.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrganization {
    /// Numeric id assigned by the source.
    pub id: Option<Numberish>,
    /// URL slug, the stable identifier ("acme" in "u/acme").
    pub slug: Option<String>,
    pub name: Option<String>,
    pub domain: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "employeeCount")]
    pub employee_count: Option<Numberish>,
    #[serde(rename = "employeeRange")]
    pub employee_range: Option<String>,
    #[serde(rename = "yearFounded")]
    pub year_founded: Option<Numberish>,
    pub industries: Option<OneOrMany>,
    #[serde(default)]
    pub locations: Vec<RawLocation>,
    /// Explicit HQ fields, reported separately from the locations list.
    #[serde(rename = "hqCity")]
    pub hq_city: Option<String>,
    #[serde(rename = "hqRegion")]
    pub hq_region: Option<String>,
    #[serde(rename = "hqCountry")]
    pub hq_country: Option<String>,
    pub funding: Option<RawFunding>,
}

impl RawOrganization {
    /// The stable external identifier: the slug when present, otherwise
    /// the numeric id rendered as a string.
    pub fn external_id(&self) -> Option<String> {
        if let Some(slug) = self.slug.as_deref() {
            let slug = slug.trim();
            if !slug.is_empty() {
                return Some(slug.to_string());
            }
        }
        self.id.as_ref().and_then(|n| n.as_i64()).map(|n| n.to_string())
    }

    pub fn employee_count(&self) -> Option<i64> {
        self.employee_count.as_ref().and_then(|n| n.as_i64())
    }

    pub fn year_founded(&self) -> Option<i64> {
        self.year_founded.as_ref().and_then(|n| n.as_i64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numberish_accepts_numbers_and_numeric_strings() {
        let org: RawOrganization = serde_json::from_str(
            r#"{"id": "4412", "name": "Acme", "employeeCount": "250", "yearFounded": 1999}"#,
        )
        .unwrap();
        assert_eq!(org.external_id().as_deref(), Some("4412"));
        assert_eq!(org.employee_count(), Some(250));
        assert_eq!(org.year_founded(), Some(1999));
    }

    #[test]
    fn slug_wins_over_numeric_id() {
        let org: RawOrganization =
            serde_json::from_str(r#"{"id": 4412, "slug": "acme", "name": "Acme"}"#).unwrap();
        assert_eq!(org.external_id().as_deref(), Some("acme"));
    }

    #[test]
    fn unparseable_count_coerces_to_none() {
        let org: RawOrganization =
            serde_json::from_str(r#"{"name": "Acme", "employeeCount": "lots"}"#).unwrap();
        assert_eq!(org.employee_count(), None);
    }

    #[test]
    fn industries_accept_single_string() {
        let org: RawOrganization =
            serde_json::from_str(r#"{"name": "Acme", "industries": "Software"}"#).unwrap();
        assert_eq!(
            org.industries.unwrap().into_vec(),
            vec!["Software".to_string()]
        );
    }
}
