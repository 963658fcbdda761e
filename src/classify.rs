//! Problem-type classification.
//!
//! Maps a free-text question onto a closed set of problem-type tags using an
//! ordered rule table. Each rule is a named predicate over case-insensitive
//! keyword regexes; the first matching rule wins, so specific types (inverse
//! discount problems, percentage-of-total) are tested before broad ones
//! (generic percentage change). Unclassifiable input falls back to
//! `GeneralMath` - classification is total and never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Tag for the kind of math problem a question describes.
///
/// Derived purely from the question text, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    InverseProblem,
    PercentageOfTotal,
    PercentageChange,
    PenaltyCalculation,
    OptimizationProblem,
    QuadraticEquation,
    EquationSystem,
    Probability,
    Geometry,
    PropositionalLogic,
    Programming,
    Sequences,
    Calculus,
    GeneralMath,
}

impl ProblemType {
    /// Snake_case tag name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::InverseProblem => "inverse_problem",
            ProblemType::PercentageOfTotal => "percentage_of_total",
            ProblemType::PercentageChange => "percentage_change",
            ProblemType::PenaltyCalculation => "penalty_calculation",
            ProblemType::OptimizationProblem => "optimization_problem",
            ProblemType::QuadraticEquation => "quadratic_equation",
            ProblemType::EquationSystem => "equation_system",
            ProblemType::Probability => "probability",
            ProblemType::Geometry => "geometry",
            ProblemType::PropositionalLogic => "propositional_logic",
            ProblemType::Programming => "programming",
            ProblemType::Sequences => "sequences",
            ProblemType::Calculus => "calculus",
            ProblemType::GeneralMath => "general_math",
        }
    }
}

impl std::fmt::Display for ProblemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Rule predicates ─────────────────────────────────────────────────────

static RE_OPTIMIZE_GOAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)maxim|minim|optimiz|mayor volumen|menor costo|máximo|mínimo").unwrap()
});

static RE_OPTIMIZE_QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)volumen|área|costo|función|deriva").unwrap());

static RE_DISCOUNTED_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)cuesta|vale|precio.*con.*%|con.*\d+%.*descuento|con.*\d+%.*rebaja").unwrap()
});

static RE_ORIGINAL_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)costaba|valía|antes|precio original|sin descuento").unwrap()
});

static RE_ASKS_PERCENTAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)qué porcentaje|que porcentaje|cuál es el porcentaje").unwrap()
});

static RE_PART_OF_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+.*de.*\d+|\d+.*total").unwrap());

static RE_CHANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)aument|disminuir|disminuye|increment|decrece").unwrap());

static RE_PENALTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)recargo|multa|sanción").unwrap());

static RE_QUADRATIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)x²|x\^2|ecuación cuadrática|ax².*bx.*c|formula.*cuadrática").unwrap()
});

static RE_EQUATION_SYSTEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)sistema.*ecuacion|ecuaciones simultáneas|despeja.*sustituye").unwrap()
});

static RE_PROBABILITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)probabilidad|dado|moneda|baraja|combinatoria|permutación").unwrap()
});

static RE_GEOMETRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)triángulo|círculo|cuadrado|rectángulo|perímetro|área|hipotenusa|pitágoras")
        .unwrap()
});

static RE_LOGIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)todos.*son|algunos.*son|ningún.*es|si.*entonces|implica|silogismo").unwrap()
});

static RE_PROGRAMMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)código|programa|función.*retorna|algoritmo|bug|error.*código").unwrap()
});

static RE_SEQUENCES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)sucesión|serie|término.*n|fibonacci|aritmética|geométrica").unwrap()
});

static RE_CALCULUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)deriva|integral|∫|d/dx|f'\(x\)").unwrap());

/// Max/min goal plus an optimizable quantity (volume, area, cost, function).
pub fn is_optimization(text: &str) -> bool {
    RE_OPTIMIZE_GOAL.is_match(text) && RE_OPTIMIZE_QUANTITY.is_match(text)
}

/// A final-price-with-discount phrase plus an "original/before" phrase.
pub fn is_inverse_problem(text: &str) -> bool {
    RE_DISCOUNTED_PRICE.is_match(text) && RE_ORIGINAL_PRICE.is_match(text)
}

/// "What percentage" phrasing plus an "X of Y" numeric pattern.
pub fn is_percentage_of_total(text: &str) -> bool {
    RE_ASKS_PERCENTAGE.is_match(text) && RE_PART_OF_TOTAL.is_match(text)
}

pub fn is_percentage_change(text: &str) -> bool {
    RE_CHANGE.is_match(text)
}

pub fn is_penalty_calculation(text: &str) -> bool {
    RE_PENALTY.is_match(text)
}

pub fn is_quadratic_equation(text: &str) -> bool {
    RE_QUADRATIC.is_match(text)
}

pub fn is_equation_system(text: &str) -> bool {
    RE_EQUATION_SYSTEM.is_match(text)
}

pub fn is_probability(text: &str) -> bool {
    RE_PROBABILITY.is_match(text)
}

pub fn is_geometry(text: &str) -> bool {
    RE_GEOMETRY.is_match(text)
}

pub fn is_propositional_logic(text: &str) -> bool {
    RE_LOGIC.is_match(text)
}

pub fn is_programming(text: &str) -> bool {
    RE_PROGRAMMING.is_match(text)
}

pub fn is_sequences(text: &str) -> bool {
    RE_SEQUENCES.is_match(text)
}

pub fn is_calculus(text: &str) -> bool {
    RE_CALCULUS.is_match(text)
}

/// Ordered rule table. Order is load-bearing: rules earlier in the table are
/// more specific and must shadow the broad ones below them.
static RULES: &[(fn(&str) -> bool, ProblemType)] = &[
    (is_optimization, ProblemType::OptimizationProblem),
    (is_inverse_problem, ProblemType::InverseProblem),
    (is_percentage_of_total, ProblemType::PercentageOfTotal),
    (is_percentage_change, ProblemType::PercentageChange),
    (is_penalty_calculation, ProblemType::PenaltyCalculation),
    (is_quadratic_equation, ProblemType::QuadraticEquation),
    (is_equation_system, ProblemType::EquationSystem),
    (is_probability, ProblemType::Probability),
    (is_geometry, ProblemType::Geometry),
    (is_propositional_logic, ProblemType::PropositionalLogic),
    (is_programming, ProblemType::Programming),
    (is_sequences, ProblemType::Sequences),
    (is_calculus, ProblemType::Calculus),
];

/// Classify a question into a problem type.
///
/// First matching rule wins; anything unmatched is `GeneralMath`.
pub fn classify(question: &str) -> ProblemType {
    for (predicate, tag) in RULES {
        if predicate(question) {
            return *tag;
        }
    }
    ProblemType::GeneralMath
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_type_as_str() {
        assert_eq!(ProblemType::InverseProblem.as_str(), "inverse_problem");
        assert_eq!(ProblemType::GeneralMath.as_str(), "general_math");
        assert_eq!(ProblemType::Calculus.as_str(), "calculus");
    }

    #[test]
    fn test_problem_type_serde_tag() {
        let json = serde_json::to_string(&ProblemType::PercentageOfTotal).unwrap();
        assert_eq!(json, "\"percentage_of_total\"");
    }

    #[test]
    fn test_classify_inverse_problem() {
        let q = "Un producto cuesta 80€ con un 20% de descuento, ¿cuánto costaba antes?";
        assert_eq!(classify(q), ProblemType::InverseProblem);
    }

    #[test]
    fn test_classify_discount_with_original_price_phrase() {
        // Any explicit discount token plus "precio original" phrasing is inverse
        let q = "Pagué 45€ con un 10% de descuento, ¿cuál era el precio original?";
        assert_eq!(classify(q), ProblemType::InverseProblem);
    }

    #[test]
    fn test_classify_percentage_of_total() {
        assert_eq!(
            classify("¿Qué porcentaje es 5 de 20?"),
            ProblemType::PercentageOfTotal
        );
    }

    #[test]
    fn test_classify_optimization_before_geometry() {
        // "área" alone is geometry, but a max/min goal makes it optimization
        let q = "Halla las dimensiones que dan el área máxima del rectángulo";
        assert_eq!(classify(q), ProblemType::OptimizationProblem);
    }

    #[test]
    fn test_classify_percentage_change() {
        assert_eq!(
            classify("Un precio de 30€ aumenta un 20%, ¿cuánto vale ahora?"),
            ProblemType::PercentageChange
        );
    }

    #[test]
    fn test_classify_penalty() {
        assert_eq!(
            classify("Una multa de 100€ tiene un recargo del 5%"),
            ProblemType::PenaltyCalculation
        );
    }

    #[test]
    fn test_classify_quadratic() {
        assert_eq!(
            classify("Resuelve la ecuación x² + 3x - 4 = 0"),
            ProblemType::QuadraticEquation
        );
        assert_eq!(
            classify("Resuelve x^2 - 9 = 0"),
            ProblemType::QuadraticEquation
        );
    }

    #[test]
    fn test_classify_equation_system() {
        assert_eq!(
            classify("Resuelve el sistema de ecuaciones: x + y = 3, x - y = 1"),
            ProblemType::EquationSystem
        );
    }

    #[test]
    fn test_classify_probability() {
        assert_eq!(
            classify("¿Cuál es la probabilidad de sacar un 6 al lanzar un dado?"),
            ProblemType::Probability
        );
    }

    #[test]
    fn test_classify_geometry() {
        assert_eq!(
            classify("Calcula el perímetro de un triángulo de lados 3, 4 y 5"),
            ProblemType::Geometry
        );
    }

    #[test]
    fn test_classify_propositional_logic() {
        assert_eq!(
            classify("Todos los gatos son mamíferos. ¿Es válido el silogismo?"),
            ProblemType::PropositionalLogic
        );
    }

    #[test]
    fn test_classify_programming() {
        assert_eq!(
            classify("Encuentra el bug en este código"),
            ProblemType::Programming
        );
    }

    #[test]
    fn test_classify_sequences() {
        assert_eq!(
            classify("Halla el término general de la sucesión 2, 4, 8, 16"),
            ProblemType::Sequences
        );
    }

    #[test]
    fn test_classify_calculus() {
        assert_eq!(classify("Calcula la integral de x dx"), ProblemType::Calculus);
    }

    #[test]
    fn test_classify_fallback() {
        assert_eq!(classify("¿Cuánto es 2 + 2?"), ProblemType::GeneralMath);
        assert_eq!(classify(""), ProblemType::GeneralMath);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let q = "Un producto cuesta 80€ con un 20% de descuento, ¿cuánto costaba antes?";
        assert_eq!(classify(q), classify(q));
    }
}
