// 💰 Valuation - gold weight <-> currency at the quoted rate
//
// The rate is currency per one tola of 24K gold. Every path that divides
// by a rate checks it first and reports 0 instead of inf/NaN.

use serde::{Deserialize, Serialize};

use crate::karat::{purity, Karat};
use crate::units::TOLA_IN_GRAMS;

fn usable_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Price of one gram of 24K gold
pub fn rate_per_gram(rate: f64) -> f64 {
    rate / TOLA_IN_GRAMS
}

/// `grams × purity(karat) × rate / 11.664`
pub fn value_of(grams: f64, karat: u32, rate: f64) -> f64 {
    grams * purity(karat) * rate_per_gram(rate)
}

/// Money -> 24K gold weight: `money × 11.664 / rate`
pub fn grams_for_money(money: f64, rate: f64) -> f64 {
    if !usable_rate(rate) {
        return 0.0;
    }
    (money * TOLA_IN_GRAMS) / rate
}

/// Amount -> gold weight at a karat's effective rate (sale slip flow)
pub fn grams_for_amount(amount: f64, karat: u32, rate: f64) -> f64 {
    let effective_rate = rate * purity(karat);
    if !usable_rate(effective_rate) {
        return 0.0;
    }
    amount / (effective_rate / TOLA_IN_GRAMS)
}

// ============================================================================
// PER-KARAT RATE TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KaratRate {
    pub karat: Karat,
    pub purity_percent: f64,
    /// `round(rate × purity)`
    pub per_tola: f64,
    /// `round(per_tola / 11.664)`
    pub per_gram: f64,
}

pub fn karat_rate(karat: Karat, rate: f64) -> KaratRate {
    let per_tola = (rate * karat.purity()).round();
    KaratRate {
        karat,
        purity_percent: karat.purity_percent(),
        per_tola,
        per_gram: (per_tola / TOLA_IN_GRAMS).round(),
    }
}

pub fn karat_rate_table(rate: f64) -> Vec<KaratRate> {
    Karat::ALL.iter().map(|k| karat_rate(*k, rate)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_tola_of_pure_gold_costs_the_rate() {
        for rate in [1.0, 341000.0, 250000.5, 1e7] {
            let value = value_of(11.664, 24, rate);
            assert!((value - rate).abs() < 1e-6 * rate, "{} vs {}", value, rate);
        }
    }

    #[test]
    fn test_value_of_22k() {
        let value = value_of(11.664, 22, 341000.0);
        assert!((value - 341000.0 * 0.9167).abs() < 1e-6);
        assert!((value - 312594.7).abs() < 0.01);
    }

    #[test]
    fn test_value_of_unknown_karat_is_priced_as_pure() {
        assert_eq!(value_of(5.0, 23, 1000.0), value_of(5.0, 24, 1000.0));
    }

    #[test]
    fn test_money_to_gold() {
        let grams = grams_for_money(341000.0, 341000.0);
        assert!((grams - 11.664).abs() < 1e-9);
        assert_eq!(grams_for_money(1000.0, 0.0), 0.0);
        assert_eq!(grams_for_money(1000.0, -5.0), 0.0);
        assert_eq!(grams_for_money(1000.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_amount_to_gold_with_karat() {
        let grams = grams_for_amount(312594.7, 22, 341000.0);
        assert!((grams - 11.664).abs() < 1e-6);
        assert_eq!(grams_for_amount(1000.0, 22, 0.0), 0.0);

        // Inverse of value_of
        let amount = value_of(7.5, 18, 200000.0);
        assert!((grams_for_amount(amount, 18, 200000.0) - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_karat_rate_table() {
        let table = karat_rate_table(341000.0);
        assert_eq!(table.len(), Karat::ALL.len());

        let k24 = &table[0];
        assert_eq!(k24.karat, Karat::K24);
        assert_eq!(k24.per_tola, 341000.0);
        assert_eq!(k24.per_gram, (341000.0f64 / 11.664).round());

        let k22 = karat_rate(Karat::K22, 341000.0);
        assert_eq!(k22.per_tola, 312595.0);
    }
}
