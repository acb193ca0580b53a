// 💎 Karat Purity - fixed karat domain and purity table
//
// `purity()` never fails: an unknown karat reads as pure gold (1.0).
// Use `Karat::from_value` when input must be validated instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AurumError;

/// Purity returned for any karat outside the table
pub const DEFAULT_PURITY: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Karat {
    K24,
    K22,
    K21,
    K20,
    K18,
    K16,
    K14,
    K12,
    K10,
    K9,
}

impl Karat {
    /// Every supported karat, purest first
    pub const ALL: [Karat; 10] = [
        Karat::K24,
        Karat::K22,
        Karat::K21,
        Karat::K20,
        Karat::K18,
        Karat::K16,
        Karat::K14,
        Karat::K12,
        Karat::K10,
        Karat::K9,
    ];

    pub fn value(&self) -> u32 {
        match self {
            Karat::K24 => 24,
            Karat::K22 => 22,
            Karat::K21 => 21,
            Karat::K20 => 20,
            Karat::K18 => 18,
            Karat::K16 => 16,
            Karat::K14 => 14,
            Karat::K12 => 12,
            Karat::K10 => 10,
            Karat::K9 => 9,
        }
    }

    pub fn from_value(value: u32) -> Option<Karat> {
        Karat::ALL.iter().copied().find(|k| k.value() == value)
    }

    /// Fraction of pure gold by mass
    pub fn purity(&self) -> f64 {
        match self {
            Karat::K24 => 1.0,
            Karat::K22 => 0.9167,
            Karat::K21 => 0.875,
            Karat::K20 => 0.8333,
            Karat::K18 => 0.75,
            Karat::K16 => 0.6667,
            Karat::K14 => 0.5833,
            Karat::K12 => 0.50,
            Karat::K10 => 0.417,
            Karat::K9 => 0.375,
        }
    }

    pub fn purity_percent(&self) -> f64 {
        self.purity() * 100.0
    }

    pub fn label(&self) -> String {
        format!("{}K", self.value())
    }

    pub fn description(&self) -> &'static str {
        match self {
            Karat::K24 => "Pure gold standard, bullion and bars",
            Karat::K22 => "Common jewelry gold",
            Karat::K21 => "High purity jewelry",
            Karat::K20 => "Medium purity",
            Karat::K18 => "Standard jewelry gold",
            Karat::K16 => "Durable everyday jewelry",
            Karat::K14 => "Lower purity jewelry",
            Karat::K12 => "Half gold alloy",
            Karat::K10 => "Budget jewelry, very durable",
            Karat::K9 => "Lowest common hallmark",
        }
    }

    /// Next karat in the table, wrapping around (used by selectors)
    pub fn next(&self) -> Karat {
        let idx = Karat::ALL.iter().position(|k| k == self).unwrap_or(0);
        Karat::ALL[(idx + 1) % Karat::ALL.len()]
    }

    pub fn previous(&self) -> Karat {
        let idx = Karat::ALL.iter().position(|k| k == self).unwrap_or(0);
        Karat::ALL[(idx + Karat::ALL.len() - 1) % Karat::ALL.len()]
    }
}

impl Default for Karat {
    fn default() -> Self {
        Karat::K24
    }
}

impl fmt::Display for Karat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}K", self.value())
    }
}

impl From<Karat> for u32 {
    fn from(karat: Karat) -> u32 {
        karat.value()
    }
}

impl TryFrom<u32> for Karat {
    type Error = AurumError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Karat::from_value(value).ok_or_else(|| AurumError::UnknownKarat(value.to_string()))
    }
}

impl FromStr for Karat {
    type Err = AurumError;

    /// Accepts "22", "22k" and "22K"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.trim_end_matches(['k', 'K']);
        digits
            .parse::<u32>()
            .ok()
            .and_then(Karat::from_value)
            .ok_or_else(|| AurumError::UnknownKarat(trimmed.to_string()))
    }
}

// ============================================================================
// LOOKUP
// ============================================================================

/// Purity fraction for a raw karat number, 1.0 when not in the table
pub fn purity(karat: u32) -> f64 {
    Karat::from_value(karat)
        .map(|k| k.purity())
        .unwrap_or(DEFAULT_PURITY)
}

pub fn is_known_karat(karat: u32) -> bool {
    Karat::from_value(karat).is_some()
}
