//! FHIR wire/boundary support for the applicability matching core.
//!
//! This crate provides **wire models** for the raw health-record bundles that
//! callers hand to the matching engine:
//! - JSON bundle parsing (`Bundle::parse`)
//! - typed resource dispatch over the kinds the engine consumes
//!   (Patient, Observation, Condition, MedicationRequest, Medication)
//! - safe accessors over optional nested FHIR datatypes
//!
//! This crate focuses on:
//! - FHIR semantic alignment (without FHIR REST transport)
//! - tolerant deserialisation: real-world bundles have absent optional
//!   fields and resource kinds we do not consume; both are skipped, not errors
//!
//! Clinical meaning lives in `litmatch-core`. This crate handles wire shapes
//! only.

pub mod bundle;
pub mod datatypes;

// Re-export facades
pub use bundle::{Bundle, Resource};

// Re-export resource and datatype structs
pub use bundle::{
    ConditionResource, DosageInstruction, MedicationRequestResource, MedicationResource,
    ObservationResource, PatientResource,
};
pub use datatypes::{parse_fhir_date, CodeableConcept, Coding, Quantity, Reference};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
