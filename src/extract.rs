//! Numeric extraction from question and answer text.
//!
//! Pulls numeric literals and percentages out of free text via per-role regex
//! templates. Extraction is best-effort: no match yields an empty result,
//! never an error, and callers treat "nothing extracted" as "cannot verify
//! numerically" rather than as a failure.
//!
//! The patterns assume Spanish phrasing with decimal points (no thousands
//! separators) and `€` / `%` suffix tokens.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// What an extracted number means in its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuantityRole {
    /// The discounted price stated in the question.
    FinalPrice,
    /// The discount percentage stated in the question.
    DiscountPercent,
    /// The "part" in an "X of Y" percentage question.
    Part,
    /// The "total" in an "X of Y" percentage question.
    Total,
    /// The euro amount an answer claims as its result.
    ClaimedResult,
    /// The percentage an answer claims as its result.
    ClaimedPercent,
}

/// A number pulled out of question or answer text.
///
/// Ephemeral - produced per verification call, no identity beyond it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedQuantity {
    pub value: f64,
    pub role: QuantityRole,
    /// The matched text the value came from.
    pub source_span: String,
}

impl ExtractedQuantity {
    pub fn new(value: f64, role: QuantityRole, source_span: impl Into<String>) -> Self {
        Self {
            value,
            role,
            source_span: source_span.into(),
        }
    }
}

// ── Role templates ──────────────────────────────────────────────────────

/// A decimal followed by `%`, e.g. "25%" or "12.5 %".
static RE_PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").unwrap());

/// Integer percentage form used for discounts, e.g. the 20 in "20%".
static RE_DISCOUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)%").unwrap());

/// A price directly before "con", e.g. the 80 in "cuesta 80€ con un 20%".
static RE_PRICE_BEFORE_CON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)[€\s]*con").unwrap());

/// "X de Y" part-of-total pattern. Lazy in between so the total captures the
/// whole second number instead of its last digit.
static RE_PART_OF_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+).*?de.*?(\d+)").unwrap());

/// The euro amount an answer presents as its result, after an `=` or a
/// result word, e.g. the 100 in "Precio original = 80 ÷ 0.8 = 100€".
static RE_CLAIMED_EUR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:=|resultado|respuesta|costaba).*?(\d+(?:\.\d+)?)\s*€").unwrap()
});

/// Extract every number a pattern's first capture group matches in `text`.
///
/// Returns an empty vec when nothing matches; never errors. Matches whose
/// capture does not parse as a float are skipped.
pub fn extract_numbers(text: &str, pattern: &Regex, role: QuantityRole) -> Vec<ExtractedQuantity> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let full = caps.get(0)?.as_str();
            let value = caps.get(1)?.as_str().parse::<f64>().ok()?;
            Some(ExtractedQuantity::new(value, role, full))
        })
        .collect()
}

/// First percentage in the text, e.g. a claimed "25%" in an answer.
pub fn claimed_percent(text: &str) -> Option<ExtractedQuantity> {
    extract_numbers(text, &RE_PERCENTAGE, QuantityRole::ClaimedPercent)
        .into_iter()
        .next()
}

/// Integer discount percent from a question, e.g. 20 from "un 20% de descuento".
pub fn discount_percent(text: &str) -> Option<u32> {
    let caps = RE_DISCOUNT.captures(text)?;
    caps.get(1)?.as_str().parse().ok()
}

/// The final (discounted) price from a question's "X€ con ..." phrasing.
pub fn final_price(text: &str) -> Option<ExtractedQuantity> {
    extract_numbers(text, &RE_PRICE_BEFORE_CON, QuantityRole::FinalPrice)
        .into_iter()
        .next()
}

/// The (part, total) pair from an "X de Y" question.
pub fn part_of_total(text: &str) -> Option<(ExtractedQuantity, ExtractedQuantity)> {
    let caps = RE_PART_OF_TOTAL.captures(text)?;
    let full = caps.get(0)?.as_str();
    let part = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let total = caps.get(2)?.as_str().parse::<f64>().ok()?;
    Some((
        ExtractedQuantity::new(part, QuantityRole::Part, full),
        ExtractedQuantity::new(total, QuantityRole::Total, full),
    ))
}

/// The euro amount an answer claims as its result.
pub fn claimed_result_eur(text: &str) -> Option<ExtractedQuantity> {
    let caps = RE_CLAIMED_EUR.captures(text)?;
    let full = caps.get(0)?.as_str();
    let value = caps.get(1)?.as_str().parse::<f64>().ok()?;
    Some(ExtractedQuantity::new(
        value,
        QuantityRole::ClaimedResult,
        full,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_numbers_empty_on_no_match() {
        assert!(extract_numbers("sin números aquí", &RE_PERCENTAGE, QuantityRole::ClaimedPercent).is_empty());
        assert!(extract_numbers("", &RE_PERCENTAGE, QuantityRole::ClaimedPercent).is_empty());
    }

    #[test]
    fn test_extract_numbers_multiple_matches() {
        let found = extract_numbers("un 20% y luego un 5%", &RE_PERCENTAGE, QuantityRole::ClaimedPercent);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].value, 20.0);
        assert_eq!(found[1].value, 5.0);
    }

    #[test]
    fn test_claimed_percent_decimal() {
        let q = claimed_percent("El resultado es 12.5 %").unwrap();
        assert_eq!(q.value, 12.5);
        assert_eq!(q.role, QuantityRole::ClaimedPercent);
        assert!(q.source_span.contains("12.5"));
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(
            discount_percent("cuesta 80€ con un 20% de descuento"),
            Some(20)
        );
        assert_eq!(discount_percent("sin descuento"), None);
    }

    #[test]
    fn test_final_price_with_euro_sign() {
        let q = final_price("Un producto cuesta 80€ con un 20% de descuento").unwrap();
        assert_eq!(q.value, 80.0);
        assert_eq!(q.role, QuantityRole::FinalPrice);
    }

    #[test]
    fn test_final_price_with_space() {
        let q = final_price("cuesta 45.50 con rebaja").unwrap();
        assert_eq!(q.value, 45.50);
    }

    #[test]
    fn test_part_of_total() {
        let (part, total) = part_of_total("¿Qué porcentaje es 5 de 20?").unwrap();
        assert_eq!(part.value, 5.0);
        assert_eq!(total.value, 20.0);
        assert_eq!(part.role, QuantityRole::Part);
        assert_eq!(total.role, QuantityRole::Total);
    }

    #[test]
    fn test_part_of_total_none() {
        assert!(part_of_total("¿qué porcentaje del grupo?").is_none());
    }

    #[test]
    fn test_claimed_result_after_equals() {
        let q = claimed_result_eur("Precio original = 80 ÷ 0.8 = 100€").unwrap();
        assert_eq!(q.value, 100.0);
    }

    #[test]
    fn test_claimed_result_after_result_word() {
        let q = claimed_result_eur("El resultado es 95.5€").unwrap();
        assert_eq!(q.value, 95.5);
    }

    #[test]
    fn test_claimed_result_none_without_euro() {
        assert!(claimed_result_eur("la respuesta es 100").is_none());
    }
}
