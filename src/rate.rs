// 📈 Current Gold Rate - the one piece of persisted application state
//
// Currency per tola of 24K gold. Loaded once at startup, overwritten
// wholesale on each user edit (last write wins). `RateState` is passed to
// whatever needs the rate; there is no global.

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AurumError;
use crate::parser::parse_number_strict;

/// Rate used until the user sets one
pub const DEFAULT_RATE: f64 = 341000.0;

/// Settings keys for the stored rate
pub const RATE_KEY: &str = "goldRate";
pub const LAST_UPDATED_KEY: &str = "lastUpdated";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredRate {
    pub rate: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// STORAGE SEAM
// ============================================================================

/// Where the rate lives between runs
pub trait RateStore {
    fn load(&self) -> Result<Option<StoredRate>>;
    fn save(&self, rate: &StoredRate) -> Result<()>;
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

pub struct RateState<S: RateStore> {
    store: S,
    current: StoredRate,
}

impl<S: RateStore> RateState<S> {
    /// Read the stored rate once. A failed read is logged and the default
    /// is used, so the calculators stay usable.
    pub fn load(store: S, default_rate: f64) -> Self {
        let fallback = StoredRate {
            rate: default_rate,
            updated_at: None,
        };

        let current = match store.load() {
            Ok(Some(stored)) if stored.rate.is_finite() && stored.rate > 0.0 => stored,
            Ok(Some(stored)) => {
                warn!(rate = stored.rate, "Ignoring unusable stored rate");
                fallback
            }
            Ok(None) => fallback,
            Err(e) => {
                warn!(error = %e, "Failed to load rate, using default");
                fallback
            }
        };

        RateState { store, current }
    }

    pub fn current_rate(&self) -> f64 {
        self.current.rate
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.current.updated_at
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the rate. Non-positive and non-finite values are rejected.
    pub fn update_rate(&mut self, new_rate: f64) -> Result<StoredRate> {
        if !new_rate.is_finite() || new_rate <= 0.0 {
            return Err(AurumError::InvalidRate(new_rate.to_string()).into());
        }

        let next = StoredRate {
            rate: new_rate,
            updated_at: Some(Utc::now()),
        };
        self.store.save(&next)?;
        self.current = next;

        info!(rate = new_rate, "Gold rate updated");
        Ok(next)
    }

    /// `update_rate` from user text; the whole text must be a number
    pub fn update_rate_from_input(&mut self, text: &str) -> Result<StoredRate> {
        let rate = parse_number_strict(text)
            .ok_or_else(|| AurumError::InvalidRate(text.trim().to_string()))?;
        self.update_rate(rate)
    }
}

// ============================================================================
// DISPLAY
// ============================================================================

/// "Never" or e.g. "Jan 5, 2025 3:07 PM" in local time
pub fn format_last_updated(updated_at: Option<DateTime<Utc>>) -> String {
    match updated_at {
        Some(ts) => ts
            .with_timezone(&Local)
            .format("%b %-d, %Y %-I:%M %p")
            .to_string(),
        None => "Never".to_string(),
    }
}

/// "Just now", "5m ago", "3h ago", "2d ago"
pub fn format_relative(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(updated) = updated_at else {
        return "Never updated".to_string();
    };

    let minutes = (now - updated).num_minutes().max(0);
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct MemoryRateStore {
        slot: Mutex<Option<StoredRate>>,
    }

    impl MemoryRateStore {
        fn new() -> Self {
            Self::default()
        }

        fn with_rate(rate: StoredRate) -> Self {
            MemoryRateStore {
                slot: Mutex::new(Some(rate)),
            }
        }
    }

    impl RateStore for MemoryRateStore {
        fn load(&self) -> Result<Option<StoredRate>> {
            let slot = self
                .slot
                .lock()
                .map_err(|_| anyhow::anyhow!("rate store lock poisoned"))?;
            Ok(*slot)
        }

        fn save(&self, rate: &StoredRate) -> Result<()> {
            let mut slot = self
                .slot
                .lock()
                .map_err(|_| anyhow::anyhow!("rate store lock poisoned"))?;
            *slot = Some(*rate);
            Ok(())
        }
    }

    struct BrokenStore;

    impl RateStore for BrokenStore {
        fn load(&self) -> Result<Option<StoredRate>> {
            anyhow::bail!("disk on fire")
        }

        fn save(&self, _rate: &StoredRate) -> Result<()> {
            anyhow::bail!("disk on fire")
        }
    }

    #[test]
    fn test_first_use_gets_default() {
        let state = RateState::load(MemoryRateStore::new(), DEFAULT_RATE);
        assert_eq!(state.current_rate(), 341000.0);
        assert_eq!(state.last_updated(), None);
    }

    #[test]
    fn test_stored_rate_is_loaded() {
        let stored = StoredRate {
            rate: 350000.0,
            updated_at: Some(Utc::now()),
        };
        let state = RateState::load(MemoryRateStore::with_rate(stored), DEFAULT_RATE);
        assert_eq!(state.current_rate(), 350000.0);
        assert!(state.last_updated().is_some());
    }

    #[test]
    fn test_update_overwrites_and_persists() {
        let mut state = RateState::load(MemoryRateStore::new(), DEFAULT_RATE);
        state.update_rate(360000.0).unwrap();
        state.update_rate(365000.0).unwrap();

        assert_eq!(state.current_rate(), 365000.0);
        let persisted = state.store().load().unwrap().unwrap();
        assert_eq!(persisted.rate, 365000.0);
        assert!(persisted.updated_at.is_some());
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let mut state = RateState::load(MemoryRateStore::new(), DEFAULT_RATE);

        assert!(state.update_rate(0.0).is_err());
        assert!(state.update_rate(-10.0).is_err());
        assert!(state.update_rate(f64::INFINITY).is_err());
        assert!(state.update_rate_from_input("abc").is_err());
        assert!(state.update_rate_from_input("").is_err());

        assert_eq!(state.current_rate(), DEFAULT_RATE);
        assert_eq!(state.store().load().unwrap(), None);

        state.update_rate_from_input(" 355000 ").unwrap();
        assert_eq!(state.current_rate(), 355000.0);
    }

    #[test]
    fn test_load_failure_falls_back_to_default() {
        let state = RateState::load(BrokenStore, 200000.0);
        assert_eq!(state.current_rate(), 200000.0);
    }

    #[test]
    fn test_failed_save_keeps_previous_rate() {
        let mut state = RateState::load(BrokenStore, 200000.0);
        assert!(state.update_rate(300000.0).is_err());
        assert_eq!(state.current_rate(), 200000.0);
    }

    #[test]
    fn test_format_last_updated() {
        assert_eq!(format_last_updated(None), "Never");
        let formatted = format_last_updated(Some(Utc::now()));
        assert!(formatted.contains(&Local::now().format("%Y").to_string()));
    }

    #[test]
    fn test_format_relative() {
        let now = Utc::now();
        assert_eq!(format_relative(None, now), "Never updated");
        assert_eq!(format_relative(Some(now), now), "Just now");
        assert_eq!(format_relative(Some(now - Duration::minutes(5)), now), "5m ago");
        assert_eq!(format_relative(Some(now - Duration::minutes(150)), now), "2h ago");
        assert_eq!(format_relative(Some(now - Duration::days(3)), now), "3d ago");
    }
}
