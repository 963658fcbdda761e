//! Stage 1: per-type method checks.
//!
//! Each checker tests for the presence of required textual markers in the
//! answer, not the correctness of its arithmetic - a cheap proxy for "did the
//! model apply the right method". Presence of the right method is necessary
//! but not sufficient, which is why Stage 2 re-derives the numbers.
//!
//! Checkers return `None` both when the answer looks fine and when the
//! question lacks the tokens needed to judge it: an unparseable question can
//! never block an answer.

use std::sync::LazyLock;

use regex::Regex;

use super::result::{ErrorKind, RuleFinding};
use crate::classify::ProblemType;
use crate::extract;

// ── Static markers ──────────────────────────────────────────────────────

static RE_DIVISION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)divid|÷|divide|entre").unwrap());

static RE_PERCENT_FORMULA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(.*÷.*\).*×.*100|/.*\*.*100").unwrap());

static RE_DERIVATIVE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)deriva|V'|f'|dV/dx|df/dx").unwrap());

static RE_SETS_TO_ZERO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)=\s*0|igual.*cero").unwrap());

static RE_QUADRATIC_FORMULA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-b.*±.*√|fórmula.*cuadrática|x.*=.*-b").unwrap());

static RE_QUESTION_QUADRATIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)cuadrática|x²").unwrap());

static RE_FRACTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/|÷|entre").unwrap());

static RE_QUESTION_PROBABILITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)probabilidad").unwrap());

static RE_GEOMETRY_FORMULA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)π|pi|²|área.*=|perímetro.*=").unwrap());

static RE_QUESTION_GEOMETRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)área|perímetro|volumen").unwrap());

static RE_REASONING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)por lo tanto|entonces|implica|se deduce|concluimos").unwrap()
});

static RE_QUESTION_LOGIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)todos.*son|si.*entonces").unwrap());

static RE_CALCULUS_DERIVATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)f'|deriv|d/dx|'").unwrap());

static RE_QUESTION_DERIVATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)deriva").unwrap());

/// Dispatch to the per-type checker. Unhandled types never produce a finding.
pub fn check_logic(
    problem_type: ProblemType,
    question: &str,
    answer: &str,
) -> Option<RuleFinding> {
    match problem_type {
        ProblemType::InverseProblem => check_inverse_problem(question, answer),
        ProblemType::PercentageOfTotal => check_percentage_of_total(question, answer),
        ProblemType::OptimizationProblem => check_optimization(question, answer),
        ProblemType::QuadraticEquation => check_quadratic(question, answer),
        ProblemType::Probability => check_probability(question, answer),
        ProblemType::Geometry => check_geometry(question, answer),
        ProblemType::PropositionalLogic => check_propositional_logic(question, answer),
        ProblemType::Calculus => check_calculus(question, answer),
        _ => None,
    }
}

/// Inverse discount problems: the classic mistake is multiplying the final
/// price by the raw discount fraction instead of dividing by (1 - d/100).
fn check_inverse_problem(question: &str, answer: &str) -> Option<RuleFinding> {
    let discount = extract::discount_percent(question)?;
    let factor = (100 - discount.min(100)) as f64 / 100.0;

    // "80 × 0.20" or "20% ... = 16" style multiplication by the discount
    let wrong_multiplication = Regex::new(&format!(
        r"(?i)\d+\s*[×*]\s*0?\.?{discount}|{discount}%.*=.*\d+"
    ))
    .ok()?;

    if wrong_multiplication.is_match(answer) {
        return Some(RuleFinding::new(
            ErrorKind::InverseProblemWrongOperation,
            format!(
                "¡ALTO! Este es un problema INVERSO.\n\n\
                 Te dan: Precio FINAL con descuento = X€\n\
                 Te preguntan: ¿Cuál era el precio ORIGINAL?\n\n\
                 ❌ ERROR DETECTADO: Estás multiplicando el precio final por el descuento.\n\
                 ✅ DEBES: Dividir el precio final entre (1 - descuento%)\n\n\
                 Fórmula correcta:\n\
                 Precio Original = Precio Final ÷ (1 - {discount}%)\n\
                 Precio Original = Precio Final ÷ {factor}\n\n\
                 Reformula tu respuesta usando la fórmula correcta."
            ),
        ));
    }

    let has_division = RE_DIVISION_MARKER.is_match(answer);
    let correct_factor = Regex::new(&format!(
        r"(?i)0\.{}|{}",
        100 - discount.min(100),
        regex::escape(&factor.to_string())
    ))
    .ok()?;
    let has_correct_factor = correct_factor.is_match(answer);

    if !has_division && !has_correct_factor {
        return Some(RuleFinding::new(
            ErrorKind::InverseProblemMissingCorrectOperation,
            format!(
                "Este es un problema INVERSO. Debes usar la fórmula:\n\n\
                 Precio Original = Precio Final ÷ (1 - {discount}%)\n\n\
                 Asegúrate de DIVIDIR, no multiplicar."
            ),
        ));
    }

    None
}

/// Percentage-of-total: the answer must show the (part ÷ total) × 100 formula.
fn check_percentage_of_total(question: &str, answer: &str) -> Option<RuleFinding> {
    extract::part_of_total(question)?;

    if !RE_PERCENT_FORMULA.is_match(answer) {
        return Some(RuleFinding::new(
            ErrorKind::PercentageFormulaMissing,
            "Para calcular un porcentaje de un total, usa:\n\n\
             Porcentaje = (Parte ÷ Total) × 100\n\n\
             Asegúrate de dividir primero y luego multiplicar por 100.",
        ));
    }

    None
}

/// Optimization: requires a derivative, then a critical-point step.
fn check_optimization(_question: &str, answer: &str) -> Option<RuleFinding> {
    if !RE_DERIVATIVE_MARKER.is_match(answer) {
        return Some(RuleFinding::new(
            ErrorKind::OptimizationMissingDerivative,
            "Para problemas de optimización (máximos/mínimos):\n\n\
             1. Primero expresa la función a optimizar\n\
             2. Calcula la DERIVADA de la función\n\
             3. Iguala la derivada a cero y resuelve\n\
             4. Verifica que el resultado sea válido\n\n\
             ¿Puedes mostrar el desarrollo completo con la derivada?",
        ));
    }

    if !RE_SETS_TO_ZERO.is_match(answer) {
        return Some(RuleFinding::new(
            ErrorKind::OptimizationMissingCriticalPoint,
            "En problemas de optimización, después de calcular la derivada debes:\n\n\
             1. Igualar la derivada a CERO: f'(x) = 0\n\
             2. Resolver la ecuación resultante\n\
             3. Verificar que el punto crítico sea máximo o mínimo\n\n\
             Completa el desarrollo igualando a cero.",
        ));
    }

    None
}

fn check_quadratic(question: &str, answer: &str) -> Option<RuleFinding> {
    let has_formula = RE_QUADRATIC_FORMULA.is_match(answer);

    if !has_formula && RE_QUESTION_QUADRATIC.is_match(question) {
        return Some(RuleFinding::new(
            ErrorKind::QuadraticMissingFormula,
            "Para ecuaciones cuadráticas ax² + bx + c = 0, usa la fórmula:\n\n\
             x = (-b ± √(b² - 4ac)) / 2a\n\n\
             Muestra los pasos: identificar a, b, c → calcular discriminante → \
             aplicar fórmula → verificar soluciones.",
        ));
    }

    None
}

fn check_probability(question: &str, answer: &str) -> Option<RuleFinding> {
    let has_fraction = RE_FRACTION_MARKER.is_match(answer);

    if RE_QUESTION_PROBABILITY.is_match(question) && !has_fraction {
        return Some(RuleFinding::new(
            ErrorKind::ProbabilityMissingCalculation,
            "Para problemas de probabilidad, usa:\n\n\
             P(evento) = Casos favorables / Casos totales\n\n\
             Identifica claramente cuántos casos favorables hay y cuál es el \
             total de casos posibles.",
        ));
    }

    None
}

fn check_geometry(question: &str, answer: &str) -> Option<RuleFinding> {
    let has_formula = RE_GEOMETRY_FORMULA.is_match(answer);

    if RE_QUESTION_GEOMETRY.is_match(question) && !has_formula {
        return Some(RuleFinding::new(
            ErrorKind::GeometryMissingFormula,
            "Para problemas de geometría, recuerda las fórmulas básicas:\n\
             - Círculo: A = πr², P = 2πr\n\
             - Rectángulo: A = base × altura, P = 2(base + altura)\n\
             - Triángulo: A = (base × altura) / 2\n\n\
             Muestra la fórmula usada y los cálculos.",
        ));
    }

    None
}

fn check_propositional_logic(question: &str, answer: &str) -> Option<RuleFinding> {
    let has_reasoning = RE_REASONING_MARKER.is_match(answer);

    if RE_QUESTION_LOGIC.is_match(question) && !has_reasoning {
        return Some(RuleFinding::new(
            ErrorKind::LogicMissingReasoning,
            "Para problemas de lógica:\n\
             1. Identifica las premisas (lo que se afirma como verdadero)\n\
             2. Analiza las relaciones lógicas\n\
             3. Deriva la conclusión paso a paso\n\
             4. Verifica si la conclusión es válida o hay contraejemplos",
        ));
    }

    None
}

fn check_calculus(question: &str, answer: &str) -> Option<RuleFinding> {
    let has_derivative = RE_CALCULUS_DERIVATIVE.is_match(answer);

    if RE_QUESTION_DERIVATIVE.is_match(question) && !has_derivative {
        return Some(RuleFinding::new(
            ErrorKind::CalculusMissingDerivative,
            "Para derivadas, aplica las reglas:\n\
             - Potencia: d/dx(x^n) = n·x^(n-1)\n\
             - Cadena: d/dx(f(g(x))) = f'(g(x))·g'(x)\n\
             - Producto: d/dx(f·g) = f'·g + f·g'\n\n\
             Muestra cada paso de la derivación.",
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVERSE_Q: &str = "Un producto cuesta 80€ con un 20% de descuento, ¿cuánto costaba antes?";

    #[test]
    fn test_inverse_flags_wrong_multiplication() {
        let answer = "El precio original era 80 × 0.20 = 16€";
        let finding = check_logic(ProblemType::InverseProblem, INVERSE_Q, answer).unwrap();
        assert_eq!(finding.error_type, ErrorKind::InverseProblemWrongOperation);
        assert!(finding.correction_prompt.contains("1 - 20%"));
        assert!(finding.correction_prompt.contains("0.8"));
    }

    #[test]
    fn test_inverse_accepts_division() {
        let answer = "Precio original = 80 ÷ (1 - 0.20) = 100€";
        assert!(check_logic(ProblemType::InverseProblem, INVERSE_Q, answer).is_none());
    }

    #[test]
    fn test_inverse_accepts_correct_factor_without_division_word() {
        let answer = "Usando el factor 0.8: el precio original resulta 100€";
        assert!(check_logic(ProblemType::InverseProblem, INVERSE_Q, answer).is_none());
    }

    #[test]
    fn test_inverse_flags_missing_operation() {
        let answer = "El precio era más alto, unos 96 euros aproximadamente";
        let finding = check_logic(ProblemType::InverseProblem, INVERSE_Q, answer).unwrap();
        assert_eq!(
            finding.error_type,
            ErrorKind::InverseProblemMissingCorrectOperation
        );
    }

    #[test]
    fn test_inverse_without_discount_in_question_passes() {
        let q = "Un producto cuesta menos que antes, ¿cuánto costaba?";
        assert!(check_logic(ProblemType::InverseProblem, q, "no sé").is_none());
    }

    #[test]
    fn test_percentage_of_total_requires_formula() {
        let q = "¿Qué porcentaje es 5 de 20?";
        let finding = check_logic(ProblemType::PercentageOfTotal, q, "Es el 20%").unwrap();
        assert_eq!(finding.error_type, ErrorKind::PercentageFormulaMissing);
    }

    #[test]
    fn test_percentage_of_total_accepts_formula() {
        let q = "¿Qué porcentaje es 5 de 20?";
        let answer = "(5 ÷ 20) × 100 = 25%";
        assert!(check_logic(ProblemType::PercentageOfTotal, q, answer).is_none());
    }

    #[test]
    fn test_optimization_missing_derivative() {
        let q = "Maximiza el volumen de la caja";
        let finding = check_logic(ProblemType::OptimizationProblem, q, "La caja más grande posible mide 10").unwrap();
        assert_eq!(finding.error_type, ErrorKind::OptimizationMissingDerivative);
    }

    #[test]
    fn test_optimization_missing_critical_point() {
        let q = "Maximiza el volumen de la caja";
        let answer = "Calculamos la derivada V'(x) y estudiamos su signo";
        let finding = check_logic(ProblemType::OptimizationProblem, q, answer).unwrap();
        assert_eq!(finding.error_type, ErrorKind::OptimizationMissingCriticalPoint);
    }

    #[test]
    fn test_optimization_full_method_passes() {
        let q = "Maximiza el volumen de la caja";
        let answer = "Derivamos: V'(x) = 12x² - 60x, igualamos V'(x) = 0 y resolvemos";
        assert!(check_logic(ProblemType::OptimizationProblem, q, answer).is_none());
    }

    #[test]
    fn test_quadratic_missing_formula() {
        let q = "Resuelve la ecuación x² + 3x - 4 = 0";
        let finding = check_logic(ProblemType::QuadraticEquation, q, "x vale 1 o -4").unwrap();
        assert_eq!(finding.error_type, ErrorKind::QuadraticMissingFormula);
    }

    #[test]
    fn test_quadratic_with_formula_passes() {
        let q = "Resuelve la ecuación x² + 3x - 4 = 0";
        let answer = "x = (-b ± √(b² - 4ac)) / 2a = (-3 ± 5) / 2";
        assert!(check_logic(ProblemType::QuadraticEquation, q, answer).is_none());
    }

    #[test]
    fn test_probability_missing_fraction() {
        let q = "¿Cuál es la probabilidad de sacar cara?";
        let finding = check_logic(ProblemType::Probability, q, "Es bastante probable").unwrap();
        assert_eq!(finding.error_type, ErrorKind::ProbabilityMissingCalculation);
    }

    #[test]
    fn test_probability_with_fraction_passes() {
        let q = "¿Cuál es la probabilidad de sacar cara?";
        assert!(check_logic(ProblemType::Probability, q, "P = 1/2").is_none());
    }

    #[test]
    fn test_geometry_missing_formula() {
        let q = "Calcula el área del círculo de radio 3";
        let finding = check_logic(ProblemType::Geometry, q, "El resultado es 28.27").unwrap();
        assert_eq!(finding.error_type, ErrorKind::GeometryMissingFormula);
    }

    #[test]
    fn test_geometry_with_formula_passes() {
        let q = "Calcula el área del círculo de radio 3";
        assert!(check_logic(ProblemType::Geometry, q, "A = πr² = 9π ≈ 28.27 cm²").is_none());
    }

    #[test]
    fn test_logic_missing_reasoning() {
        let q = "Todos los gatos son mamíferos, ¿los siameses son mamíferos?";
        let finding = check_logic(ProblemType::PropositionalLogic, q, "Sí").unwrap();
        assert_eq!(finding.error_type, ErrorKind::LogicMissingReasoning);
    }

    #[test]
    fn test_logic_with_reasoning_passes() {
        let q = "Todos los gatos son mamíferos, ¿los siameses son mamíferos?";
        let answer = "Los siameses son gatos, por lo tanto son mamíferos";
        assert!(check_logic(ProblemType::PropositionalLogic, q, answer).is_none());
    }

    #[test]
    fn test_calculus_missing_derivative() {
        let q = "Deriva la función f(x) = x³";
        let finding = check_logic(ProblemType::Calculus, q, "El resultado final es 3x al cuadrado, sin pasos").unwrap();
        assert_eq!(finding.error_type, ErrorKind::CalculusMissingDerivative);
    }

    #[test]
    fn test_calculus_with_derivative_passes() {
        let q = "Deriva la función f(x) = x³";
        assert!(check_logic(ProblemType::Calculus, q, "f'(x) = 3x²").is_none());
    }

    #[test]
    fn test_unhandled_types_never_flag() {
        assert!(check_logic(ProblemType::GeneralMath, "¿Cuánto es 2+2?", "4").is_none());
        assert!(check_logic(ProblemType::Programming, "arregla el bug", "hecho").is_none());
        assert!(check_logic(ProblemType::Sequences, "", "").is_none());
    }
}
