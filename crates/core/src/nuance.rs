//! Nuanced second-stage review.
//!
//! The rule engine cannot read nuance in free-text exclusion criteria; an
//! external LLM-backed collaborator can. That collaborator is the only
//! asynchronous boundary in the engine, so it is isolated behind the
//! [`NuancedCheck`] trait: the calling service supplies the real
//! implementation (with its own timeout policy) and tests substitute stubs.
//!
//! Policy: the nuanced stage runs only when the rule-based stage passed,
//! and may then independently add reasons or reverse the determination.
//! When the collaborator fails or is unavailable the engine keeps the
//! rule-stage pass (availability over strict correctness in this advisory
//! step) and logs the caveat for the caller to surface.

use std::future::Future;

use crate::applicability::{evaluate_applicability, ApplicabilityResult, StudyCriteria};
use crate::snapshot::PatientSnapshot;

/// Errors surfaced by a nuanced-check collaborator.
#[derive(Debug, thiserror::Error)]
pub enum NuanceError {
    #[error("nuanced check collaborator is unavailable")]
    Unavailable,

    #[error("nuanced check collaborator failed: {0}")]
    Collaborator(String),
}

/// The collaborator's judgement over a rule-stage pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NuancedAssessment {
    pub is_applicable: bool,
    pub reasons: Vec<crate::applicability::Reason>,
}

/// Strategy seam for the LLM-backed second stage.
pub trait NuancedCheck {
    /// Review a rule-stage pass with broader contextual judgement.
    ///
    /// Only invoked when `rule_result.is_applicable` is true.
    fn review(
        &self,
        snapshot: &PatientSnapshot,
        criteria: &StudyCriteria,
        rule_result: &ApplicabilityResult,
    ) -> impl Future<Output = Result<NuancedAssessment, NuanceError>> + Send;
}

/// Run the rule-based stage and, when it passes, the nuanced stage.
///
/// A rule-stage failure is final: the checker is not consulted. A checker
/// error falls back to the rule-stage result (optimistic default).
pub async fn evaluate_with_nuance<N: NuancedCheck>(
    snapshot: &PatientSnapshot,
    criteria: &StudyCriteria,
    checker: &N,
) -> ApplicabilityResult {
    let rule_result = evaluate_applicability(snapshot, criteria);
    if !rule_result.is_applicable {
        return rule_result;
    }

    match checker.review(snapshot, criteria, &rule_result).await {
        Ok(assessment) => ApplicabilityResult {
            is_applicable: assessment.is_applicable,
            reasons: assessment.reasons,
        },
        Err(err) => {
            tracing::warn!("nuanced check unavailable, keeping rule-based pass: {err}");
            rule_result
        }
    }
}
