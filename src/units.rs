// ⚖️ Unit Conversion - Tola / Masha / Ratti <-> grams
//
// One canonical constant set, internally consistent:
//   12 masha = 1 tola, 8 ratti = 1 masha, 96 ratti = 1 tola
//   12 × 0.972 = 11.664, 8 × 0.1215 = 0.972

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parser::parse_number;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const TOLA_IN_GRAMS: f64 = 11.664;
pub const MASHA_IN_GRAMS: f64 = 0.972;
pub const RATTI_IN_GRAMS: f64 = 0.1215;

pub const MASHAS_PER_TOLA: u32 = 12;
pub const RATTIS_PER_MASHA: u32 = 8;
pub const RATTIS_PER_TOLA: u32 = 96;

/// Rounding slack, in ULPs of the ratti count, still treated as a whole number
const SNAP_ULPS: f64 = 16.0;

// ============================================================================
// MASS UNIT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassUnit {
    Tola,
    Masha,
    Ratti,
    Gram,
}

impl MassUnit {
    pub fn grams_per_unit(&self) -> f64 {
        match self {
            MassUnit::Tola => TOLA_IN_GRAMS,
            MassUnit::Masha => MASHA_IN_GRAMS,
            MassUnit::Ratti => RATTI_IN_GRAMS,
            MassUnit::Gram => 1.0,
        }
    }

    pub fn to_grams(&self, magnitude: f64) -> f64 {
        magnitude * self.grams_per_unit()
    }

    pub fn name(&self) -> &'static str {
        match self {
            MassUnit::Tola => "Tola",
            MassUnit::Masha => "Masha",
            MassUnit::Ratti => "Ratti",
            MassUnit::Gram => "Gram",
        }
    }
}

// ============================================================================
// TMR COMPOSITE
// ============================================================================

/// Weight as (Tola, Masha, Ratti).
///
/// After decomposition `tola` and `masha` are whole numbers and `ratti`
/// keeps its fraction, since ratti is the smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Tmr {
    pub tola: f64,
    pub masha: f64,
    pub ratti: f64,
}

impl Tmr {
    pub fn new(tola: f64, masha: f64, ratti: f64) -> Self {
        Tmr { tola, masha, ratti }
    }

    pub fn to_grams(&self) -> f64 {
        grams_from_tmr(self.tola, self.masha, self.ratti)
    }

    pub fn total_rattis(&self) -> f64 {
        self.tola * RATTIS_PER_TOLA as f64 + self.masha * RATTIS_PER_MASHA as f64 + self.ratti
    }

    /// Copy with ratti rounded to `decimals` places (sale slips show 2)
    pub fn rounded_ratti(&self, decimals: u32) -> Tmr {
        let factor = 10f64.powi(decimals as i32);
        Tmr {
            ratti: (self.ratti * factor).round() / factor,
            ..*self
        }
    }

}

impl fmt::Display for Tmr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} T {} M {:.2} R", self.tola, self.masha, self.ratti)
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

/// `tola × 11.664 + masha × 0.972 + ratti × 0.1215`
pub fn grams_from_tmr(tola: f64, masha: f64, ratti: f64) -> f64 {
    tola * TOLA_IN_GRAMS + masha * MASHA_IN_GRAMS + ratti * RATTI_IN_GRAMS
}

/// Same as `grams_from_tmr` from raw field text; unparsable fields count as 0
pub fn grams_from_tmr_input(tola: &str, masha: &str, ratti: &str) -> f64 {
    grams_from_tmr(parse_number(tola), parse_number(masha), parse_number(ratti))
}

/// Greedy base-96/8 decomposition of a gram weight.
///
/// Non-positive and non-finite weights give an all-zero result.
pub fn tmr_from_grams(grams: f64) -> Tmr {
    if !grams.is_finite() || grams <= 0.0 {
        return Tmr::default();
    }

    let total_rattis = snap_to_whole(grams / RATTI_IN_GRAMS);
    let per_tola = RATTIS_PER_TOLA as f64;
    let per_masha = RATTIS_PER_MASHA as f64;

    let tola = (total_rattis / per_tola).floor();
    let remainder = total_rattis % per_tola;
    let masha = (remainder / per_masha).floor();
    let ratti = remainder % per_masha;

    Tmr { tola, masha, ratti }
}

fn snap_to_whole(value: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() <= SNAP_ULPS * f64::EPSILON * value.abs().max(1.0) {
        nearest
    } else {
        value
    }
}

// ============================================================================
// RATTI CONVERSION TABLE
// ============================================================================

/// One ratti count with its whole masha/tola and remainders
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionRow {
    pub ratti: u32,
    pub masha: u32,
    pub masha_remainder: u32,
    pub tola: u32,
    pub tola_remainder: u32,
    pub milligrams: f64,
    pub grams: f64,
}

impl ConversionRow {
    pub fn for_ratti(ratti: u32) -> Self {
        let grams = MassUnit::Ratti.to_grams(ratti as f64);
        ConversionRow {
            ratti,
            masha: ratti / RATTIS_PER_MASHA,
            masha_remainder: ratti % RATTIS_PER_MASHA,
            tola: ratti / RATTIS_PER_TOLA,
            tola_remainder: ratti % RATTIS_PER_TOLA,
            milligrams: grams * 1000.0,
            grams,
        }
    }

    /// Substring match on ratti, masha, tola or grams (4 decimals)
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        self.ratti.to_string().contains(&query)
            || self.masha.to_string().contains(&query)
            || self.tola.to_string().contains(&query)
            || format!("{:.4}", self.grams).contains(&query)
    }
}

/// Rows for 1 through 96 ratti (one tola)
pub fn conversion_table() -> Vec<ConversionRow> {
    (1..=RATTIS_PER_TOLA).map(ConversionRow::for_ratti).collect()
}

/// `conversion_table` filtered by `query`; an empty query keeps every row
pub fn search_conversion_table(query: &str) -> Vec<ConversionRow> {
    conversion_table()
        .into_iter()
        .filter(|row| row.matches(query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_constants_are_consistent() {
        assert!((MASHA_IN_GRAMS * MASHAS_PER_TOLA as f64 - TOLA_IN_GRAMS).abs() < EPS);
        assert!((RATTI_IN_GRAMS * RATTIS_PER_MASHA as f64 - MASHA_IN_GRAMS).abs() < EPS);
        assert_eq!(MASHAS_PER_TOLA * RATTIS_PER_MASHA, RATTIS_PER_TOLA);
    }

    #[test]
    fn test_grams_from_tmr_formula() {
        assert_eq!(grams_from_tmr(1.0, 0.0, 0.0), 11.664);

        for &(t, m, r) in &[(0.0, 0.0, 0.0), (2.0, 5.0, 3.5), (10.0, 11.0, 7.99), (0.5, 1.5, 0.25)] {
            let expected = t * 11.664 + m * 0.972 + r * 0.1215;
            assert_eq!(grams_from_tmr(t, m, r), expected);
        }
    }

    #[test]
    fn test_grams_from_tmr_input_coerces() {
        assert_eq!(grams_from_tmr_input("1", "", ""), 11.664);
        assert_eq!(grams_from_tmr_input("abc", "", "x"), 0.0);
        assert!((grams_from_tmr_input("", "12", "") - 11.664).abs() < EPS);
    }

    #[test]
    fn test_one_tola_decomposes_exactly() {
        let tmr = tmr_from_grams(11.664);
        assert_eq!(tmr, Tmr::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_zero_and_negative_grams() {
        assert_eq!(tmr_from_grams(0.0), Tmr::default());
        assert_eq!(tmr_from_grams(-3.0), Tmr::default());
        assert_eq!(tmr_from_grams(f64::NAN), Tmr::default());
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (3.0, 7.0, 0.0),
            (2.0, 5.0, 3.5),
            (0.0, 11.0, 7.99),
            (15.0, 0.0, 0.25),
            (7.0, 3.0, 6.0),
        ];

        for &(t, m, r) in &cases {
            let tmr = tmr_from_grams(grams_from_tmr(t, m, r));
            assert_eq!(tmr.tola, t, "tola for {:?}", (t, m, r));
            assert_eq!(tmr.masha, m, "masha for {:?}", (t, m, r));
            assert!((tmr.ratti - r).abs() < EPS, "ratti {} vs {}", tmr.ratti, r);
        }
    }

    #[test]
    fn test_fractional_ratti_is_kept() {
        // 1.5 ratti
        let tmr = tmr_from_grams(0.18225);
        assert_eq!(tmr.tola, 0.0);
        assert_eq!(tmr.masha, 0.0);
        assert!((tmr.ratti - 1.5).abs() < EPS);
    }

    #[test]
    fn test_tmr_helpers() {
        let tmr = Tmr::new(1.0, 2.0, 3.456);
        assert!((tmr.total_rattis() - 115.456).abs() < EPS);
        assert_eq!(tmr.rounded_ratti(2).ratti, 3.46);
        assert!((tmr.to_grams() - grams_from_tmr(1.0, 2.0, 3.456)).abs() < EPS);
    }

    #[test]
    fn test_mass_unit() {
        assert_eq!(MassUnit::Tola.to_grams(2.0), 23.328);
        assert_eq!(MassUnit::Gram.to_grams(5.0), 5.0);
        assert_eq!(MassUnit::Ratti.grams_per_unit(), RATTI_IN_GRAMS);
        assert_eq!(MassUnit::Masha.name(), "Masha");
    }

    #[test]
    fn test_large_weights_keep_ratti() {
        let near_next_tola = tmr_from_grams(grams_from_tmr(1000.0, 11.0, 7.99995));
        assert_eq!(near_next_tola.tola, 1000.0);
        assert_eq!(near_next_tola.masha, 11.0);
        assert!((near_next_tola.ratti - 7.99995).abs() < EPS, "ratti {}", near_next_tola.ratti);

        let tiny_ratti = tmr_from_grams(grams_from_tmr(1000.0, 0.0, 0.00005));
        assert_eq!(tiny_ratti.tola, 1000.0);
        assert_eq!(tiny_ratti.masha, 0.0);
        assert!((tiny_ratti.ratti - 0.00005).abs() < EPS, "ratti {}", tiny_ratti.ratti);

        assert_eq!(tmr_from_grams(1000.0 * TOLA_IN_GRAMS), Tmr::new(1000.0, 0.0, 0.0));
    }

    #[test]
    fn test_conversion_table_rows() {
        let table = conversion_table();
        assert_eq!(table.len(), 96);
        assert_eq!(table[0].ratti, 1);

        let one_masha = table[7];
        assert_eq!(one_masha.ratti, 8);
        assert_eq!(one_masha.masha, 1);
        assert_eq!(one_masha.masha_remainder, 0);
        assert_eq!(one_masha.tola, 0);
        assert!((one_masha.grams - 0.972).abs() < EPS);
        assert!((one_masha.milligrams - 972.0).abs() < 1e-6);

        let one_tola = table[95];
        assert_eq!(one_tola.ratti, 96);
        assert_eq!(one_tola.tola, 1);
        assert_eq!(one_tola.tola_remainder, 0);
        assert_eq!(one_tola.masha, 12);
        assert!((one_tola.grams - TOLA_IN_GRAMS).abs() < EPS);
    }

    #[test]
    fn test_conversion_table_search() {
        assert_eq!(search_conversion_table("").len(), 96);
        assert_eq!(search_conversion_table("   ").len(), 96);

        let hits = search_conversion_table("0.9720");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ratti, 8);

        let hits = search_conversion_table("11.6640");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].tola, 1);

        assert!(search_conversion_table("xyz").is_empty());
    }
}
