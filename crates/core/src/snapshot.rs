//! Canonical patient snapshot.
//!
//! The snapshot is the normalized representation of one patient's relevant
//! clinical data for a single evaluation. It is built once per request from
//! the raw bundle, consumed read-only by the resolver and evaluator, and
//! discarded when the response is sent. Nothing here persists or is shared
//! across requests.
//!
//! Invariants maintained by the normalizer:
//! - `observations` holds at most one entry per lab code, the most recent
//! - `conditions` holds only active/resolved/recurrence entries
//! - `medications` holds only active/intended/on-hold entries

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Patient sex as recorded in demographics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

impl Sex {
    /// Parse from the demographics wire token.
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Sex::Male,
            "female" | "f" => Sex::Female,
            "other" => Sex::Other,
            _ => Sex::Unknown,
        }
    }
}

/// Normalized clinical status of a condition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClinicalStatus {
    Active,
    Resolved,
    Recurrence,
    Inactive,
    Remission,
    Relapse,
    #[default]
    Unknown,
}

impl ClinicalStatus {
    /// Parse a plain status token. Unrecognized tokens map to `Unknown`.
    pub fn from_token(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" => ClinicalStatus::Active,
            "resolved" => ClinicalStatus::Resolved,
            "recurrence" => ClinicalStatus::Recurrence,
            "inactive" => ClinicalStatus::Inactive,
            "remission" => ClinicalStatus::Remission,
            "relapse" => ClinicalStatus::Relapse,
            _ => ClinicalStatus::Unknown,
        }
    }

    /// Whether a condition with this status is kept in the snapshot.
    ///
    /// Resolved and recurrence stay because study criteria are usually
    /// phrased as history ("prior myocardial infarction"); ruled-out,
    /// in-remission and unknown statuses are dropped.
    pub fn is_retained(self) -> bool {
        matches!(
            self,
            ClinicalStatus::Active | ClinicalStatus::Resolved | ClinicalStatus::Recurrence
        )
    }
}

/// Normalized status of a medication order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MedicationStatus {
    Active,
    Intended,
    OnHold,
    #[default]
    Other,
}

impl MedicationStatus {
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" => MedicationStatus::Active,
            "intended" => MedicationStatus::Intended,
            "on-hold" => MedicationStatus::OnHold,
            _ => MedicationStatus::Other,
        }
    }

    /// Whether a medication with this status counts as current therapy.
    pub fn is_active(self) -> bool {
        !matches!(self, MedicationStatus::Other)
    }
}

/// The most recent observation for one lab code.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<NaiveDate>,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

/// One retained condition.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionEntry {
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snomed_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icd10_code: Option<String>,
    pub status: ClinicalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset: Option<NaiveDate>,
}

/// One retained medication.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationEntry {
    pub name: String,
    pub status: MedicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rxnorm_code: Option<String>,
}

/// Canonical, normalized view of one patient for one evaluation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSnapshot {
    /// Anniversary-based age in whole years; `None` when the birth date is
    /// absent from the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    pub sex: Sex,
    /// Keyed by lab code; at most one (the most recent) entry per code.
    pub observations: BTreeMap<String, Observation>,
    pub conditions: Vec<ConditionEntry>,
    pub medications: Vec<MedicationEntry>,
}
