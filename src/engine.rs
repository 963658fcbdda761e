//! Chat-turn engine.
//!
//! Coordinates one user turn: profiles the question's complexity to pick
//! sampling parameters, makes the primary LLM call, then runs the loop guard
//! and - for eligible questions - the verification pipeline. A flagged answer
//! triggers exactly one corrective round-trip; the corrected answer is never
//! re-verified, and a failed corrective call falls back to the primary answer
//! rather than failing the turn.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::error::{Result, RevisorError};
use crate::llm::{ChatClient, ChatRequest, Message, VisionRequest};
use crate::loopguard::LoopGuard;
use crate::verify::pipeline::generic_correction_prompt;
use crate::verify::{ComplexityGate, Verifier};

static RE_MATH_PROBLEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)calcul|resuelve|cuanto|cuánto|porcentaje|%|descuento|precio|dividid|multiplicad|elevado|notacion|científica|primo|factoriza|determina",
    )
    .unwrap()
});

static RE_NUMBER_THEORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)primo|primalidad|divisor|factoriza|entero.*tal que|determina.*enteros")
        .unwrap()
});

static RE_PROOF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)demuestra|prueba|demostración|para todo.*n").unwrap());

static RE_ADVANCED_NOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[²³⁴⁵⁶⁷⁸⁹]|\^|∑|∏|∫").unwrap());

/// Complexity profile of a question, used to pick sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathComplexity {
    pub is_advanced: bool,
    pub is_number_theory: bool,
    pub requires_proof: bool,
    pub has_advanced_notation: bool,
    pub needs_verification: bool,
    pub needs_low_temp: bool,
    pub needs_more_tokens: bool,
}

/// Profile a question for number theory, proofs and advanced notation.
pub fn detect_math_complexity(text: &str) -> MathComplexity {
    let is_number_theory = RE_NUMBER_THEORY.is_match(text);
    let requires_proof = RE_PROOF.is_match(text);
    let has_advanced_notation = RE_ADVANCED_NOTATION.is_match(text);

    let is_advanced = is_number_theory || requires_proof || has_advanced_notation;

    MathComplexity {
        is_advanced,
        is_number_theory,
        requires_proof,
        has_advanced_notation,
        needs_verification: is_advanced,
        needs_low_temp: is_advanced,
        needs_more_tokens: requires_proof || is_number_theory,
    }
}

/// The outcome of one chat turn.
#[derive(Debug, Clone)]
pub struct Reply {
    pub response: String,
    /// Whether a corrective round-trip replaced the primary answer.
    pub corrected: bool,
}

/// One-turn coordinator over an LLM client.
pub struct Engine {
    client: Arc<dyn ChatClient>,
    verifier: Verifier,
    gate: ComplexityGate,
    loop_guard: LoopGuard,
    base_temperature: f64,
    low_temperature: f64,
    max_tokens: u32,
    proof_max_tokens: u32,
    retry_threshold: f64,
}

impl Engine {
    pub fn new(client: Arc<dyn ChatClient>, config: &Config) -> Self {
        Self {
            client,
            verifier: Verifier::new(config.verification.clone()),
            gate: ComplexityGate::new(config.verification.clone()),
            loop_guard: LoopGuard::new(config.loop_guard.clone()),
            base_temperature: config.engine.base_temperature,
            low_temperature: config.engine.low_temperature,
            max_tokens: config.engine.max_tokens,
            proof_max_tokens: config.engine.proof_max_tokens,
            retry_threshold: config.verification.retry_confidence_threshold,
        }
    }

    /// Answer one user message, verifying and correcting where warranted.
    ///
    /// `image_data` switches the turn to the vision path; verification only
    /// applies to text turns.
    pub async fn generate(
        &self,
        user_message: &str,
        history: &[Message],
        image_data: Option<&str>,
    ) -> Result<Reply> {
        let complexity = detect_math_complexity(user_message);
        let temperature = if complexity.needs_low_temp {
            self.low_temperature
        } else {
            self.base_temperature
        };
        let max_tokens = if complexity.needs_more_tokens {
            self.proof_max_tokens
        } else {
            self.max_tokens
        };

        tracing::debug!(
            advanced = complexity.is_advanced,
            proof = complexity.requires_proof,
            "problem complexity"
        );

        if let Some(image) = image_data {
            let response = self
                .client
                .vision(VisionRequest {
                    user_message: Some(user_message.to_string()).filter(|m| !m.is_empty()),
                    image_data: image.to_string(),
                    history: history.to_vec(),
                })
                .await
                .map_err(|e| RevisorError::Llm(e.to_string()))?;
            return Ok(Reply {
                response: response.response,
                corrected: false,
            });
        }

        let mut messages = history.to_vec();
        messages.push(Message::user(user_message));
        let request = ChatRequest::new(messages)
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);

        let primary = self
            .client
            .chat(request)
            .await
            .map_err(|e| RevisorError::Llm(e.to_string()))?
            .response;

        // Degenerate output is corrected before (and instead of) the math
        // checks; either way the turn gets at most one retry.
        if let Some(signal) = self.loop_guard.detect_loop(&primary) {
            tracing::debug!(kind = %signal.kind, "loop detected in answer");
            let prompt = self.loop_guard.generate_correction_prompt(&signal, user_message);
            return Ok(self
                .correct(user_message, history, &primary, &prompt, max_tokens)
                .await);
        }

        if self.gate.should_verify(user_message, &primary) {
            let result = self.verifier.verify(user_message, &primary);

            if result.requires_retry(self.retry_threshold) {
                let error_type = result.error_type;
                tracing::debug!(error_type = ?error_type, "answer flagged, correcting");
                let prompt = result
                    .suggested_prompt
                    .unwrap_or_else(|| generic_correction_prompt(user_message, error_type));
                return Ok(self
                    .correct(user_message, history, &primary, &prompt, max_tokens)
                    .await);
            }

            tracing::debug!(confidence = result.confidence, "answer passed verification");
        } else if RE_MATH_PROBLEM.is_match(user_message) {
            tracing::debug!("simple math problem, skipping verification");
        }

        Ok(Reply {
            response: primary,
            corrected: false,
        })
    }

    /// One corrective round-trip. The corrective prompt is appended after the
    /// prior turns; failure keeps the primary answer.
    async fn correct(
        &self,
        user_message: &str,
        history: &[Message],
        primary: &str,
        correction_prompt: &str,
        max_tokens: u32,
    ) -> Reply {
        let mut messages = history.to_vec();
        messages.push(Message::user(user_message));
        messages.push(Message::assistant(primary));
        messages.push(Message::user(correction_prompt));

        let request = ChatRequest::new(messages)
            .with_temperature(self.low_temperature)
            .with_max_tokens(max_tokens);

        match self.client.chat(request).await {
            Ok(corrected) => Reply {
                response: corrected.response,
                corrected: true,
            },
            Err(e) => {
                tracing::warn!(error = %e, "corrective call failed, keeping primary answer");
                Reply {
                    response: primary.to_string(),
                    corrected: false,
                }
            }
        }
    }
}
