// 🧪 Purity / Impurity - two related but NON-interchangeable formulas
//
// decompose_purity:        given an alloy of known karat, how much of it is gold?
// compute_impurity_to_add: given pure gold, how much alloy makes it a karat?
//
// Both take (weight, karat). They return different types so one cannot be
// used where the other is expected.

use serde::{Deserialize, Serialize};

use crate::karat::purity;

/// Content of an alloy of known karat
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PurityBreakdown {
    pub total_weight: f64,
    pub pure_gold: f64,
    pub impurity: f64,
    pub purity_percent: f64,
}

/// Recipe for turning pure gold into an alloy of a given karat
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImpurityMix {
    pub pure_gold: f64,
    pub impurity_to_add: f64,
    pub final_weight: f64,
    pub purity_percent: f64,
}

pub fn purity_percent(karat: u32) -> f64 {
    purity(karat) * 100.0
}

/// `pure = total × percent / 100`, `impurity = total − pure`
pub fn decompose_purity(total_weight: f64, karat: u32) -> PurityBreakdown {
    let percent = purity_percent(karat);
    let pure_gold = total_weight * (percent / 100.0);

    PurityBreakdown {
        total_weight,
        pure_gold,
        impurity: total_weight - pure_gold,
        purity_percent: percent,
    }
}

/// `final = pure / (percent / 100)`, `impurity = final − pure`
pub fn compute_impurity_to_add(pure_gold_weight: f64, karat: u32) -> ImpurityMix {
    let percent = purity_percent(karat);
    let final_weight = pure_gold_weight / (percent / 100.0);

    ImpurityMix {
        pure_gold: pure_gold_weight,
        impurity_to_add: final_weight - pure_gold_weight,
        final_weight,
        purity_percent: percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_decompose_22k() {
        let breakdown = decompose_purity(10.0, 22);
        assert!((breakdown.pure_gold - 9.167).abs() < EPS);
        assert!((breakdown.impurity - 0.833).abs() < EPS);
        assert_eq!(breakdown.total_weight, 10.0);
        assert!((breakdown.purity_percent - 91.67).abs() < EPS);
    }

    #[test]
    fn test_impurity_to_add_18k() {
        let mix = compute_impurity_to_add(7.5, 18);
        assert!((mix.final_weight - 10.0).abs() < EPS);
        assert!((mix.impurity_to_add - 2.5).abs() < EPS);
        assert_eq!(mix.pure_gold, 7.5);
    }

    #[test]
    fn test_formulas_are_inverses() {
        for karat in [24, 22, 21, 20, 18, 16, 14, 12, 10, 9] {
            for weight in [0.5, 10.0, 11.664, 123.456] {
                let pure = decompose_purity(weight, karat).pure_gold;
                let back = compute_impurity_to_add(pure, karat).final_weight;
                assert!((back - weight).abs() < EPS, "{}K {}g -> {}", karat, weight, back);
            }
        }
    }

    #[test]
    fn test_formulas_differ_for_same_input() {
        // Same (weight, karat) answers two different questions
        let breakdown = decompose_purity(10.0, 22);
        let mix = compute_impurity_to_add(10.0, 22);
        assert!(mix.final_weight > 10.0);
        assert!(breakdown.pure_gold < 10.0);
        assert!((mix.impurity_to_add - breakdown.impurity).abs() > 1e-3);
    }

    #[test]
    fn test_pure_gold_needs_no_impurity() {
        let mix = compute_impurity_to_add(5.0, 24);
        assert_eq!(mix.impurity_to_add, 0.0);
        let breakdown = decompose_purity(5.0, 24);
        assert_eq!(breakdown.impurity, 0.0);
    }

    #[test]
    fn test_zero_weight() {
        let breakdown = decompose_purity(0.0, 22);
        assert_eq!(breakdown.pure_gold, 0.0);
        assert_eq!(breakdown.impurity, 0.0);

        let mix = compute_impurity_to_add(0.0, 22);
        assert_eq!(mix.final_weight, 0.0);
        assert_eq!(mix.impurity_to_add, 0.0);
    }
}
