//! Shared FHIR datatypes used across resource kinds.
//!
//! These are deliberately loose: every field is optional and unknown keys are
//! ignored, because upstream record systems disagree about which fields they
//! populate. Accessors follow a safe-navigation pattern; absence is an
//! `Option::None`, never a panic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single coded value from some terminology system.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// A concept carried as zero or more codings plus optional free text.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// First coding's code, if any.
    pub fn primary_code(&self) -> Option<&str> {
        self.coding.first().and_then(|c| c.code.as_deref())
    }

    /// First coding's display text, if any.
    pub fn primary_display(&self) -> Option<&str> {
        self.coding.first().and_then(|c| c.display.as_deref())
    }

    /// Code from the first coding whose `system` URL contains the given
    /// fragment (e.g. "snomed", "icd-10", "rxnorm").
    pub fn code_for_system(&self, system_fragment: &str) -> Option<&str> {
        self.coding
            .iter()
            .find(|c| {
                c.system
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(system_fragment))
            })
            .and_then(|c| c.code.as_deref())
    }

    /// Best human-readable label: `text`, else the first coding display.
    pub fn label(&self) -> Option<&str> {
        self.text.as_deref().or_else(|| self.primary_display())
    }
}

/// A measured quantity with optional unit.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Quantity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// A relative reference to another resource in the bundle, e.g.
/// `"Medication/med-123"` or `"#med-123"`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Reference {
    /// The referenced resource id, with any `Type/` prefix or `#` anchor
    /// stripped.
    pub fn target_id(&self) -> Option<&str> {
        let raw = self.reference.as_deref()?;
        let raw = raw.strip_prefix('#').unwrap_or(raw);
        Some(raw.rsplit('/').next().unwrap_or(raw))
    }
}

/// Parse a FHIR date or dateTime string into a calendar date.
///
/// FHIR allows `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, and full instants such as
/// `2024-03-01T09:30:00Z`. Recency comparison and age calculation only need
/// day precision, so any usable form is reduced to a `NaiveDate`; partial
/// dates coarser than a day and unparseable text yield `None`.
pub fn parse_fhir_date(input: &str) -> Option<NaiveDate> {
    let date_part = input.split('T').next().unwrap_or(input);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_date_and_instant() {
        let d = parse_fhir_date("2024-03-01").expect("plain date");
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 1).expect("ymd"));

        let d = parse_fhir_date("2024-03-01T09:30:00Z").expect("instant");
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 1).expect("ymd"));
    }

    #[test]
    fn rejects_partial_and_garbage_dates() {
        assert_eq!(parse_fhir_date("2024"), None);
        assert_eq!(parse_fhir_date("2024-03"), None);
        assert_eq!(parse_fhir_date("not a date"), None);
    }

    #[test]
    fn reference_target_id_strips_type_prefix_and_anchor() {
        let r = Reference {
            reference: Some("Medication/med-123".into()),
        };
        assert_eq!(r.target_id(), Some("med-123"));

        let r = Reference {
            reference: Some("#med-456".into()),
        };
        assert_eq!(r.target_id(), Some("med-456"));
    }

    #[test]
    fn code_for_system_matches_on_url_fragment() {
        let concept = CodeableConcept {
            coding: vec![
                Coding {
                    system: Some("http://hl7.org/fhir/sid/icd-10-cm".into()),
                    code: Some("I25.110".into()),
                    display: None,
                },
                Coding {
                    system: Some("http://snomed.info/sct".into()),
                    code: Some("53741008".into()),
                    display: Some("Coronary arteriosclerosis".into()),
                },
            ],
            text: None,
        };

        assert_eq!(concept.code_for_system("snomed"), Some("53741008"));
        assert_eq!(concept.code_for_system("icd-10"), Some("I25.110"));
        assert_eq!(concept.code_for_system("rxnorm"), None);
    }
}
