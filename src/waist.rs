// ✂️ Waist (wastage) - jeweler's weight surcharge/deduction

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AurumError;
use crate::parser::parse_number;
use crate::units::{RATTIS_PER_TOLA, TOLA_IN_GRAMS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaistMethod {
    /// Waist value is stated per tola
    #[default]
    Grams,
    /// Waist value is stated in ratti per tola
    Ratti,
}

impl WaistMethod {
    pub fn divisor(&self) -> f64 {
        match self {
            WaistMethod::Grams => TOLA_IN_GRAMS,
            WaistMethod::Ratti => RATTIS_PER_TOLA as f64,
        }
    }

    pub fn formula(&self) -> &'static str {
        match self {
            WaistMethod::Grams => "(Gold Weight × Waist Value) ÷ 11.664",
            WaistMethod::Ratti => "(Gold Weight × Ratti Value) ÷ 96",
        }
    }
}

impl fmt::Display for WaistMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaistMethod::Grams => write!(f, "grams"),
            WaistMethod::Ratti => write!(f, "ratti"),
        }
    }
}

impl FromStr for WaistMethod {
    type Err = AurumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grams" | "gram" | "g" => Ok(WaistMethod::Grams),
            "ratti" | "r" => Ok(WaistMethod::Ratti),
            other => Err(AurumError::UnknownMethod(other.to_string())),
        }
    }
}

/// `gold_weight × factor ÷ divisor`; 0 whenever either input is 0
pub fn waist(method: WaistMethod, gold_weight: f64, factor: f64) -> f64 {
    if gold_weight == 0.0 || factor == 0.0 {
        return 0.0;
    }
    (gold_weight * factor) / method.divisor()
}

/// `waist` from raw field text
pub fn waist_from_input(method: WaistMethod, gold_weight: &str, factor: &str) -> f64 {
    waist(method, parse_number(gold_weight), parse_number(factor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grams_method() {
        assert!((waist(WaistMethod::Grams, 11.664, 100.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratti_method() {
        assert_eq!(waist(WaistMethod::Ratti, 48.0, 2.0), 1.0);
    }

    #[test]
    fn test_zero_or_garbage_gives_zero() {
        assert_eq!(waist(WaistMethod::Grams, 0.0, 100.0), 0.0);
        assert_eq!(waist(WaistMethod::Ratti, 10.0, 0.0), 0.0);
        assert_eq!(waist_from_input(WaistMethod::Grams, "abc", "100"), 0.0);
        assert_eq!(waist_from_input(WaistMethod::Ratti, "10", ""), 0.0);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("grams".parse::<WaistMethod>().unwrap(), WaistMethod::Grams);
        assert_eq!("RATTI".parse::<WaistMethod>().unwrap(), WaistMethod::Ratti);
        assert!("tola".parse::<WaistMethod>().is_err());
        assert_eq!(WaistMethod::Ratti.to_string(), "ratti");
    }
}
