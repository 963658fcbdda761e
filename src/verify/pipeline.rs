//! The verification pipeline and its eligibility gate.
//!
//! `Verifier` runs the stages in sequence and returns early on the first
//! finding. `ComplexityGate` decides beforehand whether a question deserves a
//! verification pass at all, bounding latency and the cost of a possible
//! second LLM call.

use std::sync::LazyLock;

use regex::Regex;

use super::numeric;
use super::result::{ErrorKind, Stage, VerificationResult};
use super::rules;
use crate::classify;
use crate::config::VerificationConfig;

/// Trust assigned to a Stage 1 (rule check) finding.
const STAGE1_CONFIDENCE: f64 = 0.9;
/// Trust assigned to a Stage 2 (numeric) finding.
const STAGE2_CONFIDENCE: f64 = 0.85;
/// Trust when every stage passes.
const ALL_PASSED_CONFIDENCE: f64 = 0.95;

/// Multi-stage answer verifier. Stateless; every call is independent and
/// reentrant.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerificationConfig,
}

impl Verifier {
    pub fn new(config: VerificationConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline over a question/answer pair.
    ///
    /// Never fails: unparseable input simply passes through unflagged.
    pub fn verify(&self, question: &str, answer: &str) -> VerificationResult {
        let problem_type = classify::classify(question);
        tracing::debug!(problem_type = %problem_type, "verifying answer");

        if let Some(finding) = rules::check_logic(problem_type, question, answer) {
            tracing::debug!(error_type = %finding.error_type, "rule check flagged answer");
            return VerificationResult::flagged(
                finding.error_type,
                finding.correction_prompt,
                STAGE1_CONFIDENCE,
                Stage::RuleCheck,
            );
        }

        if let Some(finding) = numeric::verify_numbers(
            problem_type,
            question,
            answer,
            self.config.price_tolerance_eur,
            self.config.percent_tolerance_points,
        ) {
            tracing::debug!("numeric reconciliation flagged answer");
            return VerificationResult::flagged(
                ErrorKind::NumericalInconsistency,
                finding.correction_prompt,
                STAGE2_CONFIDENCE,
                Stage::NumericCheck,
            );
        }

        VerificationResult::clean(ALL_PASSED_CONFIDENCE)
    }
}

/// Signature of a question worth verifying: inverse-discount, optimization or
/// original-price phrasing.
static RE_COMPLEX_PROBLEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)descuento.*precio|precio.*original|costaba.*antes|coste.*inicial|optimiza|máximo.*área|mínimo.*cost|mayor.*beneficio",
    )
    .unwrap()
});

/// Decides whether a verification pass is attempted at all.
#[derive(Debug, Clone, Default)]
pub struct ComplexityGate {
    config: VerificationConfig,
}

impl ComplexityGate {
    pub fn new(config: VerificationConfig) -> Self {
        Self { config }
    }

    /// True only for sufficiently long questions matching the
    /// complex-problem signature. The decision is a function of the
    /// question alone; the answer is accepted for contract symmetry with
    /// [`Verifier::verify`].
    pub fn should_verify(&self, question: &str, _answer: &str) -> bool {
        question.chars().count() > self.config.min_question_chars
            && RE_COMPLEX_PROBLEM.is_match(question)
    }
}

/// Generic fallback correction prompt for error kinds without a specific
/// template in the caller.
pub fn generic_correction_prompt(question: &str, error_type: Option<ErrorKind>) -> String {
    match error_type {
        Some(ErrorKind::InverseProblemWrongOperation) => format!(
            "ANALIZA CUIDADOSAMENTE:\n\n\
             Esta pregunta: \"{question}\"\n\n\
             Te da el precio FINAL con descuento y pregunta el precio ORIGINAL.\n\n\
             Fórmula: Original = Final ÷ (1 - descuento%)\n\n\
             Responde correctamente usando esta fórmula."
        ),
        _ => format!(
            "Verifica tu respuesta para: \"{question}\"\n\n\
             Piensa paso a paso y asegúrate de usar la fórmula correcta."
        ),
    }
}
