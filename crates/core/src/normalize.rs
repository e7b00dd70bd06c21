//! Record normalization: raw bundle → canonical snapshot.
//!
//! This is a total transform. Real-world bundles mix coded, vendor-specific
//! and free-text encodings, omit optional fields, and repeat observations
//! across years of records; normalization reconciles all of that into the
//! snapshot invariants without ever failing. A resource missing required
//! sub-fields is skipped, an unparseable date drops the record from recency
//! tracking, and an unknown status lands in the excluded `Unknown` bucket.

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};

use fhir::{
    parse_fhir_date, Bundle, CodeableConcept, ConditionResource, MedicationRequestResource,
    ObservationResource, PatientResource, Resource,
};

use crate::snapshot::{
    ClinicalStatus, ConditionEntry, MedicationEntry, MedicationStatus, Observation,
    PatientSnapshot, Sex,
};
use crate::terminology;

/// Fallback display name when a medication carries neither an inline concept
/// nor a resolvable reference.
const UNKNOWN_MEDICATION: &str = "Unknown medication";

/// Build the canonical snapshot for one patient bundle.
///
/// `today` is injected rather than read from a clock so that age computation
/// is a pure function of its inputs and normalization is idempotent.
pub fn normalize(bundle: &Bundle, today: NaiveDate) -> PatientSnapshot {
    let resources = bundle.resources();

    // Medication definitions are referenced by id from medication requests
    // elsewhere in the same bundle, so index them first.
    let medication_defs: HashMap<&str, &CodeableConcept> = resources
        .iter()
        .filter_map(|r| match r {
            Resource::Medication(m) => Some((m.id.as_deref()?, m.code.as_ref()?)),
            _ => None,
        })
        .collect();

    let mut snapshot = PatientSnapshot::default();

    for resource in &resources {
        match resource {
            Resource::Patient(p) => apply_demographics(&mut snapshot, p, today),
            Resource::Condition(c) => {
                if let Some(entry) = normalize_condition(c) {
                    snapshot.conditions.push(entry);
                }
            }
            Resource::MedicationRequest(m) => {
                if let Some(entry) = normalize_medication(m, &medication_defs) {
                    snapshot.medications.push(entry);
                }
            }
            // Observations need a recency pass over the whole bundle; handled below.
            Resource::Observation(_) | Resource::Medication(_) => {}
        }
    }

    snapshot.observations = dedupe_observations(resources.iter().filter_map(|r| match r {
        Resource::Observation(o) => Some(o),
        _ => None,
    }));

    snapshot
}

fn apply_demographics(snapshot: &mut PatientSnapshot, patient: &PatientResource, today: NaiveDate) {
    if let Some(gender) = patient.gender.as_deref() {
        snapshot.sex = Sex::from_wire(gender);
    }
    snapshot.age = patient
        .birth_date
        .as_deref()
        .and_then(parse_fhir_date)
        .and_then(|birth| age_on(birth, today));
}

/// Whole years between birth and `today`, anniversary-based: the year
/// difference is decremented by one when today's month/day precedes the
/// birthday within the current year.
fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut years = i64::from(today.year()) - i64::from(birth.year());
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Keep the most recent observation per lab code.
///
/// Records are sorted descending by effective date and the first entry seen
/// for each code wins. Observations without a parseable date, a code, or a
/// numeric value are dropped; without a date there is no recency to compare.
fn dedupe_observations<'a>(
    observations: impl Iterator<Item = &'a ObservationResource>,
) -> BTreeMap<String, Observation> {
    let mut dated: Vec<(NaiveDate, String, Observation)> = observations
        .filter_map(|obs| {
            let concept = obs.code.as_ref()?;
            let code = concept.primary_code()?.to_string();
            let date = obs.effective_date_time.as_deref().and_then(parse_fhir_date)?;
            let quantity = obs.value_quantity.as_ref()?;
            let value = quantity.value?;

            let entry = Observation {
                value,
                unit: quantity.unit.clone(),
                observed: Some(date),
                display: concept
                    .label()
                    .map(str::to_string)
                    .unwrap_or_else(|| code.clone()),
                interpretation: obs
                    .interpretation
                    .first()
                    .and_then(|i| i.label())
                    .map(str::to_string),
            };
            Some((date, code, entry))
        })
        .collect();

    // Descending by date so the first entry per code is the most recent.
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = BTreeMap::new();
    for (_, code, entry) in dated {
        out.entry(code).or_insert(entry);
    }
    out
}

fn normalize_condition(condition: &ConditionResource) -> Option<ConditionEntry> {
    let concept = condition.code.as_ref()?;
    let display = concept.label()?.to_string();

    let status = normalize_clinical_status(condition.clinical_status.as_ref());
    if !status.is_retained() {
        return None;
    }

    Some(ConditionEntry {
        display,
        snomed_code: standard_code(concept).map(str::to_string),
        icd10_code: concept.code_for_system("icd").map(str::to_string),
        status,
        onset: condition.onset_date_time.as_deref().and_then(parse_fhir_date),
    })
}

/// The standard (SNOMED) code for a condition concept. Bare codings with no
/// system URL are treated as standard, since some upstream systems omit it.
fn standard_code(concept: &CodeableConcept) -> Option<&str> {
    concept.code_for_system("snomed").or_else(|| {
        concept
            .coding
            .iter()
            .find(|c| c.system.is_none())
            .and_then(|c| c.code.as_deref())
    })
}

/// Resolve a condition's clinical status.
///
/// Resolution order: plain status token on the first coding, then the coded
/// SNOMED status table, then the free-text field, and `Unknown` when none of
/// those yields a known token.
fn normalize_clinical_status(concept: Option<&CodeableConcept>) -> ClinicalStatus {
    let Some(concept) = concept else {
        return ClinicalStatus::Unknown;
    };

    if let Some(code) = concept.primary_code() {
        let status = ClinicalStatus::from_token(code);
        if status != ClinicalStatus::Unknown {
            return status;
        }
        if let Some(token) = terminology::status_token_for_code(code) {
            return ClinicalStatus::from_token(token);
        }
    }

    if let Some(text) = concept.text.as_deref().or_else(|| concept.primary_display()) {
        let status = ClinicalStatus::from_token(text);
        if status != ClinicalStatus::Unknown {
            return status;
        }
    }

    ClinicalStatus::Unknown
}

fn normalize_medication(
    request: &MedicationRequestResource,
    defs: &HashMap<&str, &CodeableConcept>,
) -> Option<MedicationEntry> {
    let status = MedicationStatus::from_wire(request.status.as_deref().unwrap_or_default());
    if !status.is_active() {
        return None;
    }

    // Name/code resolution: inline concept first, then the referenced
    // Medication definition, then the unknown sentinel.
    let referenced = request
        .medication_reference
        .as_ref()
        .and_then(|r| r.target_id())
        .and_then(|id| defs.get(id).copied());
    let concept = request.medication_codeable_concept.as_ref().or(referenced);

    let name = concept
        .and_then(|c| c.label())
        .map(str::to_string)
        .unwrap_or_else(|| {
            tracing::warn!("medication request has no resolvable name, keeping sentinel");
            UNKNOWN_MEDICATION.to_string()
        });

    Some(MedicationEntry {
        name,
        status,
        dosage: request
            .dosage_instruction
            .first()
            .and_then(|d| d.text.clone()),
        started: request.authored_on.as_deref().and_then(parse_fhir_date),
        rxnorm_code: concept.and_then(rxnorm_code).map(str::to_string),
    })
}

/// The RxNorm code for a medication concept, tolerating bare codings.
fn rxnorm_code(concept: &CodeableConcept) -> Option<&str> {
    concept.code_for_system("rxnorm").or_else(|| {
        concept
            .coding
            .iter()
            .find(|c| c.system.is_none())
            .and_then(|c| c.code.as_deref())
    })
}
