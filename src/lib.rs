// Aurum Calc - Core Library
// Gold weight, purity and value arithmetic plus the persisted gold rate.
// Exposes all modules for use in CLI, TUI, API server, and tests

pub mod units;      // Tola / Masha / Ratti <-> grams
pub mod karat;      // Karat domain + purity table
pub mod valuation;  // Weight <-> currency
pub mod purity;     // Purity decomposition / impurity to add
pub mod waist;      // Wastage
pub mod parser;     // Lenient numeric input
pub mod rate;       // Current rate state
pub mod db;         // SQLite persistence
pub mod ledger;     // Gold calculations ledger
pub mod slip;       // Sale slip
pub mod display;
pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use units::{
    MassUnit, Tmr, ConversionRow,
    grams_from_tmr, grams_from_tmr_input, tmr_from_grams,
    conversion_table, search_conversion_table,
    TOLA_IN_GRAMS, MASHA_IN_GRAMS, RATTI_IN_GRAMS,
    MASHAS_PER_TOLA, RATTIS_PER_MASHA, RATTIS_PER_TOLA,
};
pub use karat::{Karat, purity, is_known_karat};
pub use valuation::{
    KaratRate,
    value_of, rate_per_gram, grams_for_money, grams_for_amount,
    karat_rate, karat_rate_table,
};
pub use purity::{
    PurityBreakdown, ImpurityMix,
    decompose_purity, compute_impurity_to_add,
};
pub use waist::{WaistMethod, waist, waist_from_input};
pub use parser::{parse_number, parse_number_strict};
pub use rate::{
    RateState, RateStore, StoredRate, DEFAULT_RATE,
    format_last_updated, format_relative,
};
pub use db::{
    Database, Event, RateChange,
    open_database, setup_database,
    insert_entry, insert_entries, get_all_entries, delete_entry, clear_entries,
    count_entries, insert_event, get_events_for_entity, get_rate_history,
};
pub use ledger::{EntryDraft, EntryKind, GoldEntry, LedgerTotals, export_csv, import_csv};
pub use slip::{SaleSlip, SlipBasis, Customer, bill_number};
pub use display::{format_currency, format_weight, format_tmr};
pub use config::Config;
pub use error::{AurumError, AurumResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
