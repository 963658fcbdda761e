//! Verification outcome value objects.

use serde::{Deserialize, Serialize};

/// Which pipeline phase produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Stage 1 - textual rule check.
    RuleCheck,
    /// Stage 2 - numeric reconciliation.
    NumericCheck,
    /// Every stage ran without a finding.
    AllPassed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::RuleCheck => "rule_check",
            Stage::NumericCheck => "numeric_check",
            Stage::AllPassed => "all_passed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detectable failure mode. Each kind maps 1:1 to a fixed
/// correction-prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InverseProblemWrongOperation,
    InverseProblemMissingCorrectOperation,
    NumericalInconsistency,
    OptimizationMissingDerivative,
    OptimizationMissingCriticalPoint,
    QuadraticMissingFormula,
    ProbabilityMissingCalculation,
    GeometryMissingFormula,
    LogicMissingReasoning,
    CalculusMissingDerivative,
    PercentageFormulaMissing,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InverseProblemWrongOperation => "inverse_problem_wrong_operation",
            ErrorKind::InverseProblemMissingCorrectOperation => {
                "inverse_problem_missing_correct_operation"
            }
            ErrorKind::NumericalInconsistency => "numerical_inconsistency",
            ErrorKind::OptimizationMissingDerivative => "optimization_missing_derivative",
            ErrorKind::OptimizationMissingCriticalPoint => "optimization_missing_critical_point",
            ErrorKind::QuadraticMissingFormula => "quadratic_missing_formula",
            ErrorKind::ProbabilityMissingCalculation => "probability_missing_calculation",
            ErrorKind::GeometryMissingFormula => "geometry_missing_formula",
            ErrorKind::LogicMissingReasoning => "logic_missing_reasoning",
            ErrorKind::CalculusMissingDerivative => "calculus_missing_derivative",
            ErrorKind::PercentageFormulaMissing => "percentage_formula_missing",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A Stage 1 finding: the answer lacks (or misuses) the required method.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFinding {
    pub error_type: ErrorKind,
    pub correction_prompt: String,
}

impl RuleFinding {
    pub fn new(error_type: ErrorKind, correction_prompt: impl Into<String>) -> Self {
        Self {
            error_type,
            correction_prompt: correction_prompt.into(),
        }
    }
}

/// A Stage 2 finding: the claimed value disagrees with the recomputed one.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericFinding {
    pub correction_prompt: String,
}

impl NumericFinding {
    pub fn new(correction_prompt: impl Into<String>) -> Self {
        Self {
            correction_prompt: correction_prompt.into(),
        }
    }
}

/// The outcome of a full verification pass. Produced fresh per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Whether a corrective round-trip is warranted.
    pub needs_correction: bool,

    /// The detected failure mode, when one was found.
    pub error_type: Option<ErrorKind>,

    /// The corrective prompt to append to the conversation.
    pub suggested_prompt: Option<String>,

    /// Fixed per-stage trust scalar in [0, 1]; a retry gate, not a
    /// learned probability.
    pub confidence: f64,

    /// Which stage produced this result.
    pub stage: Stage,
}

impl VerificationResult {
    /// A finding that warrants correction.
    pub fn flagged(
        error_type: ErrorKind,
        suggested_prompt: impl Into<String>,
        confidence: f64,
        stage: Stage,
    ) -> Self {
        Self {
            needs_correction: true,
            error_type: Some(error_type),
            suggested_prompt: Some(suggested_prompt.into()),
            confidence,
            stage,
        }
    }

    /// All stages passed without a finding.
    pub fn clean(confidence: f64) -> Self {
        Self {
            needs_correction: false,
            error_type: None,
            suggested_prompt: None,
            confidence,
            stage: Stage::AllPassed,
        }
    }

    /// Caller gate: only retry when flagged above the confidence threshold.
    pub fn requires_retry(&self, threshold: f64) -> bool {
        self.needs_correction && self.confidence > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_as_str() {
        assert_eq!(Stage::RuleCheck.as_str(), "rule_check");
        assert_eq!(Stage::NumericCheck.as_str(), "numeric_check");
        assert_eq!(Stage::AllPassed.as_str(), "all_passed");
    }

    #[test]
    fn test_error_kind_as_str() {
        assert_eq!(
            ErrorKind::InverseProblemWrongOperation.as_str(),
            "inverse_problem_wrong_operation"
        );
        assert_eq!(
            ErrorKind::NumericalInconsistency.as_str(),
            "numerical_inconsistency"
        );
    }

    #[test]
    fn test_error_kind_serde_tag() {
        let json = serde_json::to_string(&ErrorKind::PercentageFormulaMissing).unwrap();
        assert_eq!(json, "\"percentage_formula_missing\"");
    }

    #[test]
    fn test_flagged_result() {
        let result = VerificationResult::flagged(
            ErrorKind::QuadraticMissingFormula,
            "usa la fórmula cuadrática",
            0.9,
            Stage::RuleCheck,
        );
        assert!(result.needs_correction);
        assert_eq!(result.error_type, Some(ErrorKind::QuadraticMissingFormula));
        assert!(result.suggested_prompt.is_some());
        assert_eq!(result.stage, Stage::RuleCheck);
    }

    #[test]
    fn test_clean_result() {
        let result = VerificationResult::clean(0.95);
        assert!(!result.needs_correction);
        assert!(result.error_type.is_none());
        assert!(result.suggested_prompt.is_none());
        assert_eq!(result.stage, Stage::AllPassed);
    }

    #[test]
    fn test_requires_retry_threshold() {
        let flagged = VerificationResult::flagged(
            ErrorKind::NumericalInconsistency,
            "revisa",
            0.85,
            Stage::NumericCheck,
        );
        assert!(flagged.requires_retry(0.7));
        assert!(!flagged.requires_retry(0.85));

        let clean = VerificationResult::clean(0.95);
        assert!(!clean.requires_retry(0.7));
    }
}
