//! # litmatch core
//!
//! Patient-applicability matching engine: decides whether the patient behind
//! a health-record bundle qualifies for a research study's population.
//!
//! This crate contains pure, stateless logic:
//! - Record normalization into a canonical per-request snapshot
//! - Condition/medication/biomarker resolution against curated terminology
//! - Rule-based applicability evaluation with itemized reasons
//! - A swappable seam for the LLM-backed nuanced second stage
//!
//! **No API concerns**: HTTP routing, paper retrieval, LLM prompting, and the
//! personalised-narrative generation belong to the calling service. Nothing
//! here performs I/O, and every function is safe to call concurrently across
//! requests because each request operates on its own snapshot.

pub mod applicability;
pub mod normalize;
pub mod nuance;
pub mod resolver;
pub mod snapshot;
pub mod terminology;

pub use applicability::{
    evaluate_applicability, evaluate_applicability_with_limit, AgeRange, ApplicabilityResult,
    ConditionLogic, PopulationDemographics, Reason, ReasonKind, StudyCriteria,
    BIOMARKER_AVAILABILITY_LIMIT,
};
pub use normalize::normalize;
pub use nuance::{evaluate_with_nuance, NuanceError, NuancedAssessment, NuancedCheck};
pub use resolver::{biomarker_value, has_condition, has_medication};
pub use snapshot::{
    ClinicalStatus, ConditionEntry, MedicationEntry, MedicationStatus, Observation,
    PatientSnapshot, Sex,
};
