//! Bundle wire model and typed resource dispatch.
//!
//! A bundle arrives as one JSON document holding a heterogeneous sequence of
//! resource entries. Parsing is strict only about the top-level JSON being
//! well formed; individual entries with an unknown `resourceType`, a missing
//! `resourceType`, or a shape that fails to deserialise are skipped so that
//! one malformed record never discards the rest of the patient's data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::datatypes::{CodeableConcept, Quantity, Reference};
use crate::{FhirError, FhirResult};

/// A raw FHIR bundle: the outer envelope around resource entries.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Bundle {
    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

/// One entry in a bundle. The resource is kept as raw JSON until dispatch so
/// that unknown kinds survive parsing.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BundleEntry {
    #[serde(default)]
    pub resource: Value,
}

/// A typed view of one bundle resource, restricted to the kinds the matching
/// engine consumes.
#[derive(Clone, Debug)]
pub enum Resource {
    Patient(PatientResource),
    Observation(ObservationResource),
    Condition(ConditionResource),
    MedicationRequest(MedicationRequestResource),
    Medication(MedicationResource),
}

impl Bundle {
    /// Parse a bundle from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] only when the document is not valid JSON or the
    /// root is not an object. Entry-level problems are deferred to
    /// [`Bundle::resources`], which skips rather than fails.
    pub fn parse(json_text: &str) -> FhirResult<Self> {
        let root: Value = serde_json::from_str(json_text)?;
        if !root.is_object() {
            return Err(FhirError::InvalidInput(
                "bundle root must be a JSON object".into(),
            ));
        }
        Ok(serde_json::from_value(root)?)
    }

    /// Dispatch entries into typed resources, skipping unknown kinds and
    /// entries that do not deserialise.
    pub fn resources(&self) -> Vec<Resource> {
        self.entry
            .iter()
            .filter_map(|e| dispatch_resource(&e.resource))
            .collect()
    }
}

fn dispatch_resource(resource: &Value) -> Option<Resource> {
    let kind = resource.get("resourceType")?.as_str()?;
    match kind {
        "Patient" => from_value(resource).map(Resource::Patient),
        "Observation" => from_value(resource).map(Resource::Observation),
        "Condition" => from_value(resource).map(Resource::Condition),
        "MedicationRequest" => from_value(resource).map(Resource::MedicationRequest),
        "Medication" => from_value(resource).map(Resource::Medication),
        _ => None,
    }
}

fn from_value<T: serde::de::DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

// ============================================================================
// Resource wire types
// ============================================================================

/// Patient demographics resource.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PatientResource {
    #[serde(rename = "birthDate", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// A single lab/vital observation.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ObservationResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(rename = "valueQuantity", skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,

    #[serde(rename = "effectiveDateTime", skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interpretation: Vec<CodeableConcept>,
}

/// A diagnosed condition with its clinical status.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ConditionResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(rename = "clinicalStatus", skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodeableConcept>,

    #[serde(rename = "onsetDateTime", skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<String>,
}

/// A medication order/intent. The medication itself may be inline
/// (`medicationCodeableConcept`) or a reference to a `Medication` resource
/// elsewhere in the bundle.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MedicationRequestResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(
        rename = "medicationCodeableConcept",
        skip_serializing_if = "Option::is_none"
    )]
    pub medication_codeable_concept: Option<CodeableConcept>,

    #[serde(rename = "medicationReference", skip_serializing_if = "Option::is_none")]
    pub medication_reference: Option<Reference>,

    #[serde(
        rename = "dosageInstruction",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub dosage_instruction: Vec<DosageInstruction>,

    #[serde(rename = "authoredOn", skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,
}

/// Free-text dosage line on a medication request.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DosageInstruction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A medication definition referenced by one or more requests.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MedicationResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
}
