//! Rule-based applicability evaluation.
//!
//! Given a snapshot and a paper's structured criteria, run a fixed, ordered
//! checklist and produce a pass/fail with itemized, human-readable reasons.
//! Every check runs; evaluation never short-circuits on the first failure,
//! so the reasons list is maximally informative and deterministic for
//! identical inputs. A patient is applicable exactly when the reasons list
//! is empty.
//!
//! Absence of data is not evidence of non-applicability: age checks are
//! skipped (not failed) when either the patient's age or the criteria bound
//! is unknown, and the biomarker check only fails when none of the study's
//! key biomarkers can be found.

use serde::{Deserialize, Serialize};

use crate::resolver::{biomarker_value, has_condition, has_medication};
use crate::snapshot::PatientSnapshot;

/// How many of the study's leading biomarkers the availability check
/// inspects. Carried over from the product behaviour as a named constant;
/// use [`evaluate_applicability_with_limit`] to override.
pub const BIOMARKER_AVAILABILITY_LIMIT: usize = 3;

/// Structured criteria for one study, as produced by the external paper
/// parser. Consumed, not owned: unknown fields from newer parser versions
/// are ignored.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyCriteria {
    /// Biomarkers the paper reports on, ordered by importance.
    pub biomarkers: Vec<String>,
    pub inclusion_criteria: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusion_criteria: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population_demographics: Option<PopulationDemographics>,
}

/// Population constraints extracted from the paper.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PopulationDemographics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_range: Option<AgeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u32>,
    pub required_conditions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_condition_logic: Option<ConditionLogic>,
    pub required_medications: Vec<String>,
    pub excluded_conditions: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AgeRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

/// Combination mode for the required-conditions list.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ConditionLogic {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl StudyCriteria {
    /// Effective minimum age: the flat field wins over the nested range
    /// (newer parser payloads emit the flat fields).
    fn min_age(&self) -> Option<u32> {
        let demo = self.population_demographics.as_ref()?;
        demo.min_age.or(demo.age_range.and_then(|r| r.min))
    }

    fn max_age(&self) -> Option<u32> {
        let demo = self.population_demographics.as_ref()?;
        demo.max_age.or(demo.age_range.and_then(|r| r.max))
    }
}

/// Category of a non-applicability reason.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReasonKind {
    Age,
    Condition,
    Medication,
    Exclusion,
    Biomarker,
}

/// One itemized reason the patient does not fit the study population.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reason {
    pub kind: ReasonKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Reason {
    fn new(kind: ReasonKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Outcome of an applicability evaluation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicabilityResult {
    pub is_applicable: bool,
    pub reasons: Vec<Reason>,
}

impl ApplicabilityResult {
    /// Build a result from collected reasons, enforcing the invariant that
    /// applicability holds exactly when no reasons were produced.
    fn from_reasons(reasons: Vec<Reason>) -> Self {
        Self {
            is_applicable: reasons.is_empty(),
            reasons,
        }
    }
}

/// Evaluate a snapshot against a study's criteria with the default
/// biomarker-availability limit.
pub fn evaluate_applicability(
    snapshot: &PatientSnapshot,
    criteria: &StudyCriteria,
) -> ApplicabilityResult {
    evaluate_applicability_with_limit(snapshot, criteria, BIOMARKER_AVAILABILITY_LIMIT)
}

/// Evaluate with an explicit biomarker-availability limit.
///
/// Checks run in a fixed order (age bounds, required conditions, required
/// medications, excluded conditions, biomarker availability); each appends
/// zero or more reasons and none aborts the rest.
pub fn evaluate_applicability_with_limit(
    snapshot: &PatientSnapshot,
    criteria: &StudyCriteria,
    biomarker_limit: usize,
) -> ApplicabilityResult {
    let mut reasons = Vec::new();

    check_age(snapshot, criteria, &mut reasons);
    check_required_conditions(snapshot, criteria, &mut reasons);
    check_required_medications(snapshot, criteria, &mut reasons);
    check_excluded_conditions(snapshot, criteria, &mut reasons);
    check_biomarker_availability(snapshot, criteria, biomarker_limit, &mut reasons);

    ApplicabilityResult::from_reasons(reasons)
}

fn check_age(snapshot: &PatientSnapshot, criteria: &StudyCriteria, reasons: &mut Vec<Reason>) {
    // Skipped entirely, not failed, when either side is unknown.
    let Some(age) = snapshot.age else {
        return;
    };

    if let Some(min) = criteria.min_age() {
        if age < min {
            reasons.push(Reason::new(
                ReasonKind::Age,
                format!("Patient age {age} is below the study minimum age of {min}"),
            ));
        }
    }

    if let Some(max) = criteria.max_age() {
        if age > max {
            reasons.push(Reason::new(
                ReasonKind::Age,
                format!("Patient age {age} is above the study maximum age of {max}"),
            ));
        }
    }
}

fn check_required_conditions(
    snapshot: &PatientSnapshot,
    criteria: &StudyCriteria,
    reasons: &mut Vec<Reason>,
) {
    let Some(demo) = criteria.population_demographics.as_ref() else {
        return;
    };
    if demo.required_conditions.is_empty() {
        return;
    }

    match demo.required_condition_logic.unwrap_or_default() {
        ConditionLogic::Or => {
            let any_present = demo
                .required_conditions
                .iter()
                .any(|c| has_condition(snapshot, c));
            if !any_present {
                reasons.push(
                    Reason::new(
                        ReasonKind::Condition,
                        "None of the study's required conditions are present in the patient's record",
                    )
                    .with_details(demo.required_conditions.join(", ")),
                );
            }
        }
        ConditionLogic::And => {
            for condition in &demo.required_conditions {
                if !has_condition(snapshot, condition) {
                    reasons.push(Reason::new(
                        ReasonKind::Condition,
                        format!(
                            "Required condition '{condition}' was not found in the patient's record"
                        ),
                    ));
                }
            }
        }
    }
}

fn check_required_medications(
    snapshot: &PatientSnapshot,
    criteria: &StudyCriteria,
    reasons: &mut Vec<Reason>,
) {
    let Some(demo) = criteria.population_demographics.as_ref() else {
        return;
    };

    for medication in &demo.required_medications {
        if !has_medication(snapshot, medication) {
            reasons.push(Reason::new(
                ReasonKind::Medication,
                format!(
                    "Required medication '{medication}' is not in the patient's active medication list"
                ),
            ));
        }
    }
}

fn check_excluded_conditions(
    snapshot: &PatientSnapshot,
    criteria: &StudyCriteria,
    reasons: &mut Vec<Reason>,
) {
    let Some(demo) = criteria.population_demographics.as_ref() else {
        return;
    };

    for condition in &demo.excluded_conditions {
        if has_condition(snapshot, condition) {
            reasons.push(Reason::new(
                ReasonKind::Exclusion,
                format!("Patient has excluded condition '{condition}'"),
            ));
        }
    }
}

fn check_biomarker_availability(
    snapshot: &PatientSnapshot,
    criteria: &StudyCriteria,
    limit: usize,
    reasons: &mut Vec<Reason>,
) {
    if criteria.biomarkers.is_empty() {
        return;
    }

    let leading = &criteria.biomarkers[..criteria.biomarkers.len().min(limit)];
    let available = leading
        .iter()
        .filter(|b| biomarker_value(snapshot, b).is_some())
        .count();

    // Partial availability is fine; the narrative stage works with whatever
    // is present. Only a total absence makes the paper inapplicable.
    if available == 0 {
        let primary = &criteria.biomarkers[0];
        reasons.push(
            Reason::new(
                ReasonKind::Biomarker,
                format!(
                    "None of the study's key biomarkers are available in the patient's record; the primary biomarker '{primary}' was not found"
                ),
            )
            .with_details(leading.join(", ")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{
        ClinicalStatus, ConditionEntry, MedicationEntry, MedicationStatus, Observation,
    };

    fn base_snapshot() -> PatientSnapshot {
        let mut snapshot = PatientSnapshot {
            age: Some(58),
            conditions: vec![ConditionEntry {
                display: "Myocardial infarction".into(),
                snomed_code: Some("22298006".into()),
                icd10_code: None,
                status: ClinicalStatus::Active,
                onset: None,
            }],
            medications: vec![MedicationEntry {
                name: "Atorvastatin 40mg".into(),
                status: MedicationStatus::Active,
                dosage: None,
                started: None,
                rxnorm_code: None,
            }],
            ..Default::default()
        };
        snapshot.observations.insert(
            "18262-6".into(),
            Observation {
                value: 150.0,
                unit: Some("mg/dL".into()),
                observed: None,
                display: "LDL cholesterol".into(),
                interpretation: None,
            },
        );
        snapshot
    }

    fn criteria_json(json: &str) -> StudyCriteria {
        serde_json::from_str(json).expect("criteria json")
    }

    #[test]
    fn end_to_end_applicable_scenario() {
        let criteria = criteria_json(
            r#"{
                "biomarkers": ["LDL cholesterol"],
                "inclusionCriteria": "Adults 40-75 with ASCVD on statin therapy",
                "populationDemographics": {
                    "minAge": 40,
                    "maxAge": 75,
                    "requiredConditions": ["atherosclerotic cardiovascular disease"],
                    "requiredMedications": ["statin"]
                }
            }"#,
        );

        let result = evaluate_applicability(&base_snapshot(), &criteria);
        assert!(result.is_applicable);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn end_to_end_rejection_on_age() {
        let mut snapshot = base_snapshot();
        snapshot.age = Some(82);
        let criteria = criteria_json(
            r#"{ "populationDemographics": { "maxAge": 75 } }"#,
        );

        let result = evaluate_applicability(&snapshot, &criteria);
        assert!(!result.is_applicable);
        assert_eq!(result.reasons.len(), 1);
        assert_eq!(result.reasons[0].kind, ReasonKind::Age);
        assert!(result.reasons[0].description.contains("82"));
        assert!(result.reasons[0].description.contains("75"));
    }

    #[test]
    fn unknown_age_skips_age_checks() {
        let mut snapshot = base_snapshot();
        snapshot.age = None;
        let criteria =
            criteria_json(r#"{ "populationDemographics": { "minAge": 40, "maxAge": 75 } }"#);

        let result = evaluate_applicability(&snapshot, &criteria);
        assert!(result.is_applicable);
        assert!(!result.reasons.iter().any(|r| r.kind == ReasonKind::Age));
    }

    #[test]
    fn age_range_is_fallback_for_flat_bounds() {
        let mut snapshot = base_snapshot();
        snapshot.age = Some(30);
        let criteria =
            criteria_json(r#"{ "populationDemographics": { "ageRange": { "min": 40 } } }"#);

        let result = evaluate_applicability(&snapshot, &criteria);
        assert_eq!(result.reasons.len(), 1);
        assert_eq!(result.reasons[0].kind, ReasonKind::Age);
    }

    #[test]
    fn and_logic_reports_each_missing_condition() {
        let criteria = criteria_json(
            r#"{ "populationDemographics": {
                "requiredConditions": ["chronic kidney disease", "heart failure", "myocardial infarction"]
            } }"#,
        );

        let result = evaluate_applicability(&base_snapshot(), &criteria);
        let condition_reasons: Vec<_> = result
            .reasons
            .iter()
            .filter(|r| r.kind == ReasonKind::Condition)
            .collect();
        // MI is present; CKD and heart failure each get their own reason.
        assert_eq!(condition_reasons.len(), 2);
        assert!(condition_reasons[0].description.contains("chronic kidney disease"));
        assert!(condition_reasons[1].description.contains("heart failure"));
    }

    #[test]
    fn or_logic_passes_with_one_present_and_fails_as_one_reason() {
        let heart_failure_only = PatientSnapshot {
            conditions: vec![ConditionEntry {
                display: "Congestive heart failure".into(),
                snomed_code: Some("84114007".into()),
                icd10_code: None,
                status: ClinicalStatus::Active,
                onset: None,
            }],
            ..Default::default()
        };
        let criteria = criteria_json(
            r#"{ "populationDemographics": {
                "requiredConditions": ["stroke", "heart failure"],
                "requiredConditionLogic": "OR"
            } }"#,
        );
        let result = evaluate_applicability(&heart_failure_only, &criteria);
        assert!(result.is_applicable);

        let neither = PatientSnapshot::default();
        let result = evaluate_applicability(&neither, &criteria);
        let condition_reasons: Vec<_> = result
            .reasons
            .iter()
            .filter(|r| r.kind == ReasonKind::Condition)
            .collect();
        assert_eq!(condition_reasons.len(), 1);
    }

    #[test]
    fn missing_required_medication_is_reported() {
        let criteria = criteria_json(
            r#"{ "populationDemographics": { "requiredMedications": ["metformin"] } }"#,
        );

        let result = evaluate_applicability(&base_snapshot(), &criteria);
        assert!(!result.is_applicable);
        assert_eq!(result.reasons[0].kind, ReasonKind::Medication);
        assert!(result.reasons[0].description.contains("metformin"));
    }

    #[test]
    fn present_excluded_condition_is_reported() {
        let criteria = criteria_json(
            r#"{ "populationDemographics": { "excludedConditions": ["myocardial infarction"] } }"#,
        );

        let result = evaluate_applicability(&base_snapshot(), &criteria);
        assert!(!result.is_applicable);
        assert_eq!(result.reasons[0].kind, ReasonKind::Exclusion);
    }

    #[test]
    fn partial_biomarker_availability_is_accepted() {
        // Snapshot has only LDL; two of the three leading biomarkers are
        // missing, which is still fine.
        let criteria = criteria_json(r#"{ "biomarkers": ["LDL", "HbA1c", "CRP"] }"#);
        let result = evaluate_applicability(&base_snapshot(), &criteria);
        assert!(result.is_applicable);
    }

    #[test]
    fn total_biomarker_absence_yields_one_reason_citing_primary() {
        let criteria = criteria_json(r#"{ "biomarkers": ["HbA1c", "CRP", "eGFR", "LDL"] }"#);
        // LDL is present in the snapshot but sits outside the inspected
        // leading three, so availability is zero.
        let result = evaluate_applicability(&base_snapshot(), &criteria);
        let biomarker_reasons: Vec<_> = result
            .reasons
            .iter()
            .filter(|r| r.kind == ReasonKind::Biomarker)
            .collect();
        assert_eq!(biomarker_reasons.len(), 1);
        assert!(biomarker_reasons[0].description.contains("HbA1c"));

        // Raising the limit brings LDL into scope and clears the reason.
        let result = evaluate_applicability_with_limit(&base_snapshot(), &criteria, 4);
        assert!(result.is_applicable);
    }

    #[test]
    fn applicability_tracks_reason_emptiness() {
        let criteria = criteria_json(
            r#"{
                "biomarkers": ["HbA1c"],
                "populationDemographics": {
                    "minAge": 60,
                    "requiredConditions": ["heart failure"],
                    "requiredMedications": ["metformin"],
                    "excludedConditions": ["myocardial infarction"]
                }
            }"#,
        );

        let result = evaluate_applicability(&base_snapshot(), &criteria);
        assert!(!result.is_applicable);
        assert_eq!(result.is_applicable, result.reasons.is_empty());
        // Fixed check order: age, condition, medication, exclusion, biomarker.
        let kinds: Vec<_> = result.reasons.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ReasonKind::Age,
                ReasonKind::Condition,
                ReasonKind::Medication,
                ReasonKind::Exclusion,
                ReasonKind::Biomarker,
            ]
        );
    }
}
