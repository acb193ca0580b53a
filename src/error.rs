// ⚠️ Domain Errors
// Validation failures for the few paths that must reject input.
// Arithmetic itself never errors: bad numbers coerce to zero.

use thiserror::Error;

pub type AurumResult<T> = Result<T, AurumError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AurumError {
    /// Manual rate edit with a non-positive or non-numeric value
    #[error("invalid gold rate '{0}': rate must be a positive number")]
    InvalidRate(String),

    /// Sale slip requested from an empty or zero amount
    #[error("invalid amount: please enter a positive amount")]
    InvalidAmount,

    /// Ledger entry or sale slip with no usable weight
    #[error("invalid weight: please enter a positive weight")]
    InvalidWeight,

    #[error("description must not be empty")]
    EmptyDescription,

    /// Strict karat parsing only; `purity()` falls back silently
    #[error("unknown karat '{0}' (expected one of 24, 22, 21, 20, 18, 16, 14, 12, 10, 9)")]
    UnknownKarat(String),

    #[error("unknown waist method '{0}' (expected 'grams' or 'ratti')")]
    UnknownMethod(String),

    #[error("unknown entry type '{0}' (expected 'add' or 'subtract')")]
    UnknownEntryKind(String),
}
