//! Degenerate-output detection.
//!
//! Scans LLM output for repeated sentences, circular phrasing, truncation and
//! repetitive case enumeration. A separate safety net from the verification
//! pipeline: this catches style degeneracy, not mathematical errors, and can
//! run before or instead of it. Checks run in order; the first signal wins.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::LoopGuardConfig;

/// Texts shorter than this are never considered loops.
const MIN_TEXT_CHARS: usize = 50;

/// Sentences must be longer than this (normalized) to count as repeats.
const MIN_SENTENCE_CHARS: usize = 15;

/// Kind of degeneracy detected in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopKind {
    RepeatingPhrases,
    CircularReasoning,
    TruncatedResponse,
    RepetitiveArguments,
}

impl LoopKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopKind::RepeatingPhrases => "repeating_phrases",
            LoopKind::CircularReasoning => "circular_reasoning",
            LoopKind::TruncatedResponse => "truncated_response",
            LoopKind::RepetitiveArguments => "repetitive_arguments",
        }
    }
}

impl std::fmt::Display for LoopKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected loop, with a human-readable diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopSignal {
    pub kind: LoopKind,
    /// The offending phrase or pattern, when one was isolated.
    pub pattern: Option<String>,
    /// How many times it occurred, when counted.
    pub count: Option<usize>,
    pub message: String,
}

static RE_SENTENCE_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\n").unwrap());

static RE_CONNECTIVE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Pero si|Sin embargo|Por lo tanto|Entonces)\s+[^.]{10,50}").unwrap()
});

static RE_CASE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Si\s+n\s*=\s*[^.]{5,30}").unwrap());

static RE_DANGLING_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Pero si n = [^.]*$").unwrap());

static RE_NO_TERMINAL_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?\s]\s*$").unwrap());

static RE_CASE_ENUMERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Si\s+n\s*=\s*-?\d+[^.]{20,}").unwrap());

/// Detector for loops, repetition and truncation in model output.
#[derive(Debug, Clone, Default)]
pub struct LoopGuard {
    config: LoopGuardConfig,
}

impl LoopGuard {
    pub fn new(config: LoopGuardConfig) -> Self {
        Self { config }
    }

    /// Scan a response for degeneracy. Returns the first signal found.
    pub fn detect_loop(&self, text: &str) -> Option<LoopSignal> {
        if text.chars().count() < MIN_TEXT_CHARS {
            return None;
        }

        if let Some((phrase, count)) = self.find_repeating_phrase(text) {
            return Some(LoopSignal {
                kind: LoopKind::RepeatingPhrases,
                message: format!(
                    "Detecté que estoy repitiendo \"{phrase}\" {count} veces. \
                     Necesito cambiar de enfoque."
                ),
                pattern: Some(phrase),
                count: Some(count),
            });
        }

        if let Some(pattern) = find_circular_reasoning(text) {
            return Some(LoopSignal {
                kind: LoopKind::CircularReasoning,
                pattern: Some(pattern),
                count: None,
                message: "Estoy en un razonamiento circular sin llegar a una conclusión. \
                          Debo usar otro método."
                    .to_string(),
            });
        }

        if is_truncated(text) {
            return Some(LoopSignal {
                kind: LoopKind::TruncatedResponse,
                pattern: None,
                count: None,
                message: "Mi respuesta parece estar incompleta o cortada. \
                          Necesito reformular más concisamente."
                    .to_string(),
            });
        }

        if let Some(count) = find_repetitive_arguments(text) {
            return Some(LoopSignal {
                kind: LoopKind::RepetitiveArguments,
                pattern: None,
                count: Some(count),
                message: "Estoy repitiendo argumentos similares sin avanzar en la solución."
                    .to_string(),
            });
        }

        None
    }

    /// Any normalized sentence repeated at least `min_repetitions` times.
    fn find_repeating_phrase(&self, text: &str) -> Option<(String, usize)> {
        let sentences: Vec<String> = RE_SENTENCE_SPLIT
            .split(text)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
            .collect();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for sentence in &sentences {
            *counts.entry(sentence.as_str()).or_default() += 1;
        }

        // earliest qualifying sentence wins, not hash order
        for sentence in &sentences {
            let count = counts[sentence.as_str()];
            if count >= self.config.min_repetitions {
                let truncated: String = sentence.chars().take(50).collect();
                return Some((format!("{truncated}..."), count));
            }
        }

        None
    }

    /// Build a corrective prompt tailored to the detected signal.
    pub fn generate_correction_prompt(&self, signal: &LoopSignal, question: &str) -> String {
        let base = format!(
            "❌ LOOP DETECTADO: {}\n\n\
             Pregunta original: {question}\n\n\
             INSTRUCCIONES PARA CORREGIR:\n\
             1. NO repitas frases ni argumentos\n\
             2. Usa un enfoque matemático diferente\n\
             3. Sé directo: máximo 3 ejemplos\n\
             4. Llega a una CONCLUSIÓN CLARA\n\n",
            signal.message
        );

        match signal.kind {
            LoopKind::CircularReasoning => format!(
                "{base}\
                 Estrategias alternativas:\n\
                 - Si el problema es sobre primos, considera factorización\n\
                 - Si es sobre enteros, prueba casos pequeños (n = 0, ±1, ±2)\n\
                 - Si estás atascado, reformula el problema\n\n\
                 Responde de forma CONCISA y DIRECTA."
            ),
            LoopKind::RepetitiveArguments => format!(
                "{base}\
                 En vez de probar cada valor manualmente:\n\
                 - Busca un PATRÓN general\n\
                 - Usa FACTORIZACIÓN o identidades algebraicas\n\
                 - Llega a una conclusión matemática rigurosa\n\n\
                 Máximo 300 palabras."
            ),
            _ => format!(
                "{base}\
                 Reformula tu respuesta de forma:\n\
                 - CONCISA (máximo 400 palabras)\n\
                 - DIRECTA (ve al grano)\n\
                 - CONCLUYENTE (termina con la respuesta clara)"
            ),
        }
    }
}

/// A discourse-connective run: 5+ matches collapsing to 3 or fewer unique
/// forms means the same pivot is being restated.
fn find_circular_reasoning(text: &str) -> Option<String> {
    for pattern in [&*RE_CONNECTIVE_RUN, &*RE_CASE_RUN] {
        let matches: Vec<String> = pattern
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect();

        if matches.len() >= 5 {
            let unique: std::collections::HashSet<&str> =
                matches.iter().map(String::as_str).collect();
            if unique.len() <= 3 {
                return Some(matches[0].clone());
            }
        }
    }
    None
}

/// Trailing-truncation signals over the last few lines, plus a scan for a
/// block repeated several times right before the end.
fn is_truncated(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().collect();
    let tail_start = lines.len().saturating_sub(5);
    let last_lines = lines[tail_start..].join("\n");

    if RE_DANGLING_CASE.is_match(&last_lines) {
        return true;
    }
    if RE_NO_TERMINAL_PUNCT.is_match(&last_lines) {
        return true;
    }
    if last_lines.chars().count() < 20 {
        return true;
    }

    has_trailing_repetition(text)
}

/// A >=20-char block repeated at least three times consecutively, with no
/// sentence end after the repeats. The regex crate has no backreferences, so
/// this is a windowed scan over the tail.
fn has_trailing_repetition(text: &str) -> bool {
    const MAX_TAIL: usize = 400;
    const MIN_BLOCK: usize = 20;
    const MAX_BLOCK: usize = 60;

    let chars: Vec<char> = text.chars().collect();
    let tail_start = chars.len().saturating_sub(MAX_TAIL);
    let tail = &chars[tail_start..];

    for i in 0..tail.len() {
        let remaining = tail.len() - i;
        let max_len = (remaining / 3).min(MAX_BLOCK);
        for len in MIN_BLOCK..=max_len {
            let block = &tail[i..i + len];
            if block.contains(&'\n') {
                continue;
            }
            if block == &tail[i + len..i + 2 * len]
                && block == &tail[i + 2 * len..i + 3 * len]
                && !tail[i + 3 * len..].contains(&'.')
            {
                return true;
            }
        }
    }

    false
}

/// 5+ "Si n = k, ..." case enumerations suggest brute-force flailing.
fn find_repetitive_arguments(text: &str) -> Option<usize> {
    let count = RE_CASE_ENUMERATION.find_iter(text).count();
    if count > 5 { Some(count) } else { None }
}
