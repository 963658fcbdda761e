//! Stage 2: numeric reconciliation.
//!
//! Only implemented for the two problem types where both sides of the
//! equation are cheaply recoverable from text: inverse discount problems and
//! percentage-of-total. The expected value is recomputed from the question's
//! numbers and compared against the answer's claimed value within a
//! tolerance. When extraction fails on either side the stage reports no
//! finding - "cannot verify" is not "verified wrong".

use super::result::NumericFinding;
use crate::classify::ProblemType;
use crate::extract;

/// Dispatch to the per-type reconciler.
pub fn verify_numbers(
    problem_type: ProblemType,
    question: &str,
    answer: &str,
    price_tolerance_eur: f64,
    percent_tolerance_points: f64,
) -> Option<NumericFinding> {
    match problem_type {
        ProblemType::InverseProblem => {
            verify_inverse_problem(question, answer, price_tolerance_eur)
        }
        ProblemType::PercentageOfTotal => {
            verify_percentage_of_total(question, answer, percent_tolerance_points)
        }
        _ => None,
    }
}

/// Check a claimed original price by running the discount forward:
/// `claimed × (1 - d/100)` must land on the question's final price.
fn verify_inverse_problem(
    question: &str,
    answer: &str,
    tolerance_eur: f64,
) -> Option<NumericFinding> {
    let final_price = extract::final_price(question)?.value;
    let discount = extract::discount_percent(question)?;
    let claimed_original = extract::claimed_result_eur(answer)?.value;

    let discount_fraction = f64::from(discount) / 100.0;
    let calculated_final = claimed_original * (1.0 - discount_fraction);

    if (calculated_final - final_price).abs() > tolerance_eur {
        let correct_original = final_price / (1.0 - discount_fraction);
        let factor = (100 - discount.min(100)) as f64 / 100.0;
        return Some(NumericFinding::new(format!(
            "❌ ERROR NUMÉRICO DETECTADO:\n\n\
             Tu respuesta dice {claimed_original}€, pero verificación:\n\
             {claimed_original}€ × (1 - {discount}%) = {calculated:.2}€ ≠ {final_price}€\n\n\
             La respuesta correcta es:\n\
             Precio Original = {final_price}€ ÷ (1 - {discount}%)\n\
             Precio Original = {final_price}€ ÷ {factor}\n\
             Precio Original = {correct:.2}€\n\n\
             Reformula con el cálculo correcto.",
            calculated = calculated_final,
            correct = correct_original,
        )));
    }

    None
}

/// Check a claimed percentage against `part / total × 100`.
fn verify_percentage_of_total(
    question: &str,
    answer: &str,
    tolerance_points: f64,
) -> Option<NumericFinding> {
    let (part, total) = extract::part_of_total(question)?;
    let claimed_percent = extract::claimed_percent(answer)?.value;

    if total.value == 0.0 {
        return None;
    }
    let correct_percent = part.value / total.value * 100.0;

    if (claimed_percent - correct_percent).abs() > tolerance_points {
        return Some(NumericFinding::new(format!(
            "❌ ERROR NUMÉRICO:\n\n\
             Cálculo: ({part} ÷ {total}) × 100 = {correct:.2}%\n\n\
             Tu respuesta de {claimed_percent}% es incorrecta. Usa la fórmula correcta.",
            part = part.value,
            total = total.value,
            correct = correct_percent,
        )));
    }

    None
}
