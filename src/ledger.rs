// 📒 Gold Calculations Ledger - running list of weighed items
//
// Each entry is a weight at a karat, priced at the rate in force when it
// was added, either added to or subtracted from the running balance.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::AurumError;
use crate::karat::Karat;
use crate::parser::parse_number;
use crate::units::{grams_from_tmr_input, tmr_from_grams, Tmr};
use crate::valuation::value_of;

// ============================================================================
// ENTRY KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Add,
    Subtract,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Add => "add",
            EntryKind::Subtract => "subtract",
        }
    }

    /// +1 for additions, -1 for subtractions
    pub fn sign(&self) -> f64 {
        match self {
            EntryKind::Add => 1.0,
            EntryKind::Subtract => -1.0,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = AurumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" | "+" => Ok(EntryKind::Add),
            "subtract" | "sub" | "-" => Ok(EntryKind::Subtract),
            other => Err(AurumError::UnknownEntryKind(other.to_string())),
        }
    }
}

// ============================================================================
// DRAFT (raw form input)
// ============================================================================

/// Entry form as typed. Weight comes from `grams` when it is filled in,
/// otherwise from the tola/masha/ratti fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryDraft {
    pub description: String,
    #[serde(default)]
    pub grams: String,
    #[serde(default)]
    pub tola: String,
    #[serde(default)]
    pub masha: String,
    #[serde(default)]
    pub ratti: String,
    #[serde(default)]
    pub karat: Karat,
    #[serde(default)]
    pub kind: EntryKind,
    /// Custom price; empty means use the calculated value
    #[serde(default)]
    pub price: String,
}

impl EntryDraft {
    pub fn weight_in_grams(&self) -> f64 {
        if !self.grams.trim().is_empty() {
            parse_number(&self.grams)
        } else {
            grams_from_tmr_input(&self.tola, &self.masha, &self.ratti)
        }
    }
}

// ============================================================================
// ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldEntry {
    pub id: String,
    pub description: String,
    pub grams: f64,
    pub tola: f64,
    pub masha: f64,
    pub ratti: f64,
    pub karat: Karat,
    pub kind: EntryKind,
    pub calculated_value: f64,
    pub final_price: f64,
    pub date: DateTime<Utc>,
}

impl GoldEntry {
    /// Validate a draft and price it at `rate`
    pub fn from_draft(draft: &EntryDraft, rate: f64) -> Result<GoldEntry, AurumError> {
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(AurumError::EmptyDescription);
        }

        let grams = draft.weight_in_grams();
        if !grams.is_finite() || grams <= 0.0 {
            return Err(AurumError::InvalidWeight);
        }

        let tmr = tmr_from_grams(grams);
        let calculated_value = value_of(grams, draft.karat.value(), rate);
        let final_price = if draft.price.trim().is_empty() {
            calculated_value
        } else {
            parse_number(&draft.price)
        };

        Ok(GoldEntry {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.to_string(),
            grams,
            tola: tmr.tola,
            masha: tmr.masha,
            ratti: tmr.ratti,
            karat: draft.karat,
            kind: draft.kind,
            calculated_value,
            final_price,
            date: Utc::now(),
        })
    }

    pub fn tmr(&self) -> Tmr {
        Tmr::new(self.tola, self.masha, self.ratti)
    }

    /// Hash for duplicate detection on import (not identity, that is `id`)
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}|{}",
            self.date.to_rfc3339(),
            self.description,
            self.grams,
            self.karat.value(),
            self.kind
        ));
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// TOTALS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub entry_count: usize,
    pub added_weight: f64,
    pub subtracted_weight: f64,
    pub added_value: f64,
    pub subtracted_value: f64,
    pub balance_weight: f64,
    pub balance_value: f64,
}

impl LedgerTotals {
    pub fn from_entries(entries: &[GoldEntry]) -> Self {
        let mut totals = LedgerTotals {
            entry_count: entries.len(),
            ..Default::default()
        };

        for entry in entries {
            match entry.kind {
                EntryKind::Add => {
                    totals.added_weight += entry.grams;
                    totals.added_value += entry.final_price;
                }
                EntryKind::Subtract => {
                    totals.subtracted_weight += entry.grams;
                    totals.subtracted_value += entry.final_price;
                }
            }
            totals.balance_weight += entry.kind.sign() * entry.grams;
            totals.balance_value += entry.kind.sign() * entry.final_price;
        }

        totals
    }

    pub fn balance_tmr(&self) -> Tmr {
        tmr_from_grams(self.balance_weight)
    }
}

// ============================================================================
// CSV EXCHANGE
// ============================================================================

pub fn export_csv(path: &Path, entries: &[GoldEntry]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

    for entry in entries {
        writer.serialize(entry).context("Failed to write ledger entry")?;
    }
    writer.flush().context("Failed to flush CSV file")?;

    Ok(entries.len())
}

pub fn import_csv(path: &Path) -> Result<Vec<GoldEntry>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut entries = Vec::new();
    for result in reader.deserialize() {
        let mut entry: GoldEntry = result.context("Failed to deserialize ledger entry")?;
        if entry.id.is_empty() {
            entry.id = uuid::Uuid::new_v4().to_string();
        }
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f64 = 341000.0;

    fn draft(description: &str, grams: &str, karat: Karat, kind: EntryKind) -> EntryDraft {
        EntryDraft {
            description: description.to_string(),
            grams: grams.to_string(),
            karat,
            kind,
            ..Default::default()
        }
    }

    #[test]
    fn test_idempotency_hash_separates_fields() {
        let a1 = GoldEntry::from_draft(&draft("A1", "2", Karat::K24, EntryKind::Add), RATE).unwrap();
        let mut a = GoldEntry::from_draft(&draft("A", "12", Karat::K24, EntryKind::Add), RATE).unwrap();
        a.date = a1.date;

        assert_ne!(a1.compute_idempotency_hash(), a.compute_idempotency_hash());

        let mut copy = a1.clone();
        copy.id = "other".to_string();
        assert_eq!(a1.compute_idempotency_hash(), copy.compute_idempotency_hash());
    }

    #[test]
    fn test_entry_from_grams() {
        let entry = GoldEntry::from_draft(&draft("Ring", "11.664", Karat::K24, EntryKind::Add), RATE)
            .unwrap();

        assert_eq!(entry.description, "Ring");
        assert_eq!(entry.grams, 11.664);
        assert_eq!(entry.tmr(), Tmr::new(1.0, 0.0, 0.0));
        assert!((entry.calculated_value - RATE).abs() < 1e-6);
        assert_eq!(entry.final_price, entry.calculated_value);
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn test_entry_from_tmr_fields() {
        let form = EntryDraft {
            description: "Bangle".to_string(),
            tola: "2".to_string(),
            masha: "6".to_string(),
            ratti: "".to_string(),
            karat: Karat::K22,
            ..Default::default()
        };
        let entry = GoldEntry::from_draft(&form, RATE).unwrap();

        assert!((entry.grams - (2.0 * 11.664 + 6.0 * 0.972)).abs() < 1e-9);
        assert_eq!(entry.tola, 2.0);
        assert_eq!(entry.masha, 6.0);
    }

    #[test]
    fn test_custom_price_overrides() {
        let mut form = draft("Chain", "5", Karat::K18, EntryKind::Add);
        form.price = "99000".to_string();
        let entry = GoldEntry::from_draft(&form, RATE).unwrap();

        assert_eq!(entry.final_price, 99000.0);
        assert!(entry.calculated_value != 99000.0);
    }

    #[test]
    fn test_draft_validation() {
        assert_eq!(
            GoldEntry::from_draft(&draft("  ", "5", Karat::K24, EntryKind::Add), RATE),
            Err(AurumError::EmptyDescription)
        );
        assert_eq!(
            GoldEntry::from_draft(&draft("Ring", "", Karat::K24, EntryKind::Add), RATE),
            Err(AurumError::InvalidWeight)
        );
        assert_eq!(
            GoldEntry::from_draft(&draft("Ring", "-2", Karat::K24, EntryKind::Add), RATE),
            Err(AurumError::InvalidWeight)
        );
    }

    #[test]
    fn test_totals() {
        let entries = vec![
            GoldEntry::from_draft(&draft("A", "10", Karat::K24, EntryKind::Add), RATE).unwrap(),
            GoldEntry::from_draft(&draft("B", "4", Karat::K24, EntryKind::Add), RATE).unwrap(),
            GoldEntry::from_draft(&draft("C", "3", Karat::K24, EntryKind::Subtract), RATE).unwrap(),
        ];

        let totals = LedgerTotals::from_entries(&entries);
        assert_eq!(totals.entry_count, 3);
        assert_eq!(totals.added_weight, 14.0);
        assert_eq!(totals.subtracted_weight, 3.0);
        assert_eq!(totals.balance_weight, 11.0);

        let expected_value = entries[0].final_price + entries[1].final_price - entries[2].final_price;
        assert!((totals.balance_value - expected_value).abs() < 1e-6);

        assert_eq!(LedgerTotals::from_entries(&[]), LedgerTotals::default());
    }

    #[test]
    fn test_idempotency_hash_is_stable() {
        let entry = GoldEntry::from_draft(&draft("Ring", "3", Karat::K22, EntryKind::Add), RATE).unwrap();
        let hash1 = entry.compute_idempotency_hash();
        let hash2 = entry.clone().compute_idempotency_hash();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64, "SHA-256 hash should be 64 hex characters");
    }

    #[test]
    fn test_entry_kind_parsing() {
        assert_eq!("add".parse::<EntryKind>().unwrap(), EntryKind::Add);
        assert_eq!("Subtract".parse::<EntryKind>().unwrap(), EntryKind::Subtract);
        assert!("multiply".parse::<EntryKind>().is_err());
    }

    #[test]
    fn test_csv_export_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");

        let entries = vec![
            GoldEntry::from_draft(&draft("Ring", "3.5", Karat::K22, EntryKind::Add), RATE).unwrap(),
            GoldEntry::from_draft(&draft("Scrap", "1.25", Karat::K18, EntryKind::Subtract), RATE)
                .unwrap(),
        ];

        let written = export_csv(&path, &entries).unwrap();
        assert_eq!(written, 2);

        let imported = import_csv(&path).unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].id, entries[0].id);
        assert_eq!(imported[0].karat, Karat::K22);
        assert_eq!(imported[1].kind, EntryKind::Subtract);
        assert_eq!(imported[1].grams, 1.25);
        assert_eq!(imported[0].date, entries[0].date);

        println!("✅ Ledger CSV round trip PASSED");
    }
}
