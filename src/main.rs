// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// Use library instead of local modules
use aurum_calc::{
    clear_entries, compute_impurity_to_add, decompose_purity, delete_entry, export_csv,
    format_currency, format_last_updated, format_relative, format_tmr, format_weight,
    get_all_entries, get_rate_history, grams_for_money, import_csv, insert_entries, insert_entry,
    karat_rate_table, parse_number, search_conversion_table, tmr_from_grams, value_of,
    waist_from_input, Config, Customer, Database, EntryDraft, EntryKind, GoldEntry, Karat,
    LedgerTotals, RateState, SaleSlip, SlipBasis, WaistMethod,
};

#[derive(Parser)]
#[command(name = "aurum", version, about = "Gold weight, purity and value calculator")]
struct Cli {
    /// Database file (overrides config and AURUM_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Tola / Masha / Ratti fields, as typed (unparsable counts as 0)
#[derive(Args, Clone, Default)]
struct TmrArgs {
    #[arg(long, short = 't', default_value = "")]
    tola: String,
    #[arg(long, short = 'm', default_value = "")]
    masha: String,
    #[arg(long, short = 'r', default_value = "")]
    ratti: String,
}

/// A weight given either in grams or as Tola / Masha / Ratti
#[derive(Args, Clone, Default)]
struct WeightArgs {
    /// Weight in grams (takes precedence over T/M/R)
    #[arg(long, short = 'g', default_value = "")]
    grams: String,
    #[command(flatten)]
    tmr: TmrArgs,
}

impl WeightArgs {
    fn in_grams(&self) -> f64 {
        if !self.grams.trim().is_empty() {
            parse_number(&self.grams)
        } else {
            aurum_calc::grams_from_tmr_input(&self.tmr.tola, &self.tmr.masha, &self.tmr.ratti)
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Tola / Masha / Ratti -> grams
    TmrToGrams(TmrArgs),
    /// Grams -> Tola / Masha / Ratti
    GramsToTmr { grams: String },
    /// Value of a gold weight at the current rate
    Value {
        #[command(flatten)]
        weight: WeightArgs,
        #[arg(long, short = 'k', default_value = "24")]
        karat: Karat,
    },
    /// How much 24K gold an amount of money buys
    MoneyToGold { amount: String },
    /// Pure gold and impurity inside an alloy of known karat
    Purity {
        #[command(flatten)]
        weight: WeightArgs,
        #[arg(long, short = 'k', default_value = "22")]
        karat: Karat,
    },
    /// Impurity to add to pure gold to reach a karat
    Impurity {
        #[command(flatten)]
        weight: WeightArgs,
        #[arg(long, short = 'k', default_value = "22")]
        karat: Karat,
    },
    /// Waist (wastage) weight
    Waist {
        /// Gold weight in grams
        #[arg(long, short = 'g', default_value = "")]
        weight: String,
        /// Waist value per tola (grams method) or ratti value (ratti method)
        #[arg(long, short = 'v', default_value = "")]
        value: String,
        #[arg(long, default_value = "grams")]
        method: WaistMethod,
    },
    /// Per-karat prices at the current rate
    Karats,
    /// Ratti to masha/tola/grams table for 1..96 ratti
    Table {
        /// Keep rows whose ratti, masha, tola or grams contain this text
        #[arg(long, short = 's', default_value = "")]
        search: String,
    },
    /// Show or change the gold rate
    #[command(subcommand)]
    Rate(RateCommand),
    /// Gold calculations ledger
    #[command(subcommand)]
    Ledger(LedgerCommand),
    /// Calculate a sale slip
    Slip {
        /// Amount the customer spends (amount-based slip)
        #[arg(long, short = 'a', conflicts_with_all = ["grams", "tola", "masha", "ratti"])]
        amount: Option<String>,
        #[command(flatten)]
        weight: WeightArgs,
        #[arg(long, short = 'k', default_value = "24")]
        karat: Karat,
        #[arg(long, default_value = "")]
        customer: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, short = 'd', default_value = "")]
        description: String,
    },
}

#[derive(Subcommand)]
enum RateCommand {
    /// Print the current rate
    Show,
    /// Set a new rate per tola of 24K gold
    Set { rate: String },
    /// List past rate changes
    History,
}

#[derive(Subcommand)]
enum LedgerCommand {
    /// Add an entry priced at the current rate
    Add {
        #[arg(long, short = 'd', default_value = "Gold Weight")]
        description: String,
        #[command(flatten)]
        weight: WeightArgs,
        #[arg(long, short = 'k', default_value = "24")]
        karat: Karat,
        #[arg(long, default_value = "add")]
        kind: EntryKind,
        /// Custom price instead of the calculated value
        #[arg(long, default_value = "")]
        price: String,
    },
    /// List all entries
    List,
    /// Added, subtracted and balance totals
    Totals,
    /// Remove one entry by id
    Remove { id: String },
    /// Remove every entry
    Clear,
    /// Write entries to a CSV file
    Export { path: PathBuf },
    /// Read entries from a CSV file (duplicates skipped)
    Import { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    match cli.command {
        None => run_ui_mode(&config),
        Some(command) => {
            aurum_calc::logging::init(&config.log_level)?;
            run_command(command, &config)
        }
    }
}

fn open_rate_state(config: &Config, actor: &str) -> Result<RateState<Database>> {
    let db = Database::open(&config.database_path)?.with_actor(actor);
    Ok(RateState::load(db, config.default_rate))
}

fn run_command(command: Command, config: &Config) -> Result<()> {
    let symbol = config.currency_symbol.as_str();

    match command {
        Command::TmrToGrams(tmr) => {
            let grams = aurum_calc::grams_from_tmr_input(&tmr.tola, &tmr.masha, &tmr.ratti);
            println!("⚖️  {} g", format_weight(grams, 4));
        }
        Command::GramsToTmr { grams } => {
            let tmr = tmr_from_grams(parse_number(&grams));
            println!("⚖️  {}", format_tmr(&tmr));
        }
        Command::Value { weight, karat } => {
            let state = open_rate_state(config, "cli")?;
            let grams = weight.in_grams();
            let value = value_of(grams, karat.value(), state.current_rate());
            println!("💰 {} g of {} gold", format_weight(grams, 4), karat);
            println!("   Rate:  {} / tola (24K)", format_currency(state.current_rate(), symbol));
            println!("   Value: {}", format_currency(value, symbol));
        }
        Command::MoneyToGold { amount } => {
            let state = open_rate_state(config, "cli")?;
            let grams = grams_for_money(parse_number(&amount), state.current_rate());
            println!("💰 {} buys", format_currency(parse_number(&amount), symbol));
            println!("   {} g", format_weight(grams, 4));
            println!("   {}", format_tmr(&tmr_from_grams(grams)));
        }
        Command::Purity { weight, karat } => {
            let breakdown = decompose_purity(weight.in_grams(), karat.value());
            println!("🧪 {} alloy ({:.2}% pure)", karat, breakdown.purity_percent);
            println!("   Total weight: {} g", format_weight(breakdown.total_weight, 4));
            println!("   Pure gold:    {} g", format_weight(breakdown.pure_gold, 4));
            println!("   Impurity:     {} g", format_weight(breakdown.impurity, 4));
        }
        Command::Impurity { weight, karat } => {
            let mix = compute_impurity_to_add(weight.in_grams(), karat.value());
            println!("🧪 Making {} ({:.2}% pure)", karat, mix.purity_percent);
            println!("   Pure gold:       {} g", format_weight(mix.pure_gold, 4));
            println!("   Impurity to add: {} g", format_weight(mix.impurity_to_add, 4));
            println!("   Final weight:    {} g", format_weight(mix.final_weight, 4));
        }
        Command::Waist {
            weight,
            value,
            method,
        } => {
            let result = waist_from_input(method, &weight, &value);
            println!("✂️  {}", method.formula());
            println!("   Waist: {} g", format_weight(result, 4));
        }
        Command::Karats => {
            let state = open_rate_state(config, "cli")?;
            println!("💎 Karat rates at {} / tola", format_currency(state.current_rate(), symbol));
            for row in karat_rate_table(state.current_rate()) {
                println!(
                    "   {:>4}  {:>7.2}%  {:>16} / tola  {:>12} / g",
                    row.karat.label(),
                    row.purity_percent,
                    format_currency(row.per_tola, symbol),
                    format_currency(row.per_gram, symbol),
                );
            }
        }
        Command::Table { search } => {
            let rows = search_conversion_table(&search);
            if rows.is_empty() {
                println!("No rows match '{}'", search);
            }
            println!("   {:>5}  {:>10}  {:>10}  {:>10}  {:>8}", "Ratti", "Masha+R", "Tola+R", "mg", "Grams");
            for row in rows {
                println!(
                    "   {:>5}  {:>10}  {:>10}  {:>10.1}  {:>8}",
                    row.ratti,
                    format!("{}+{}", row.masha, row.masha_remainder),
                    format!("{}+{}", row.tola, row.tola_remainder),
                    row.milligrams,
                    format_weight(row.grams, 4),
                );
            }
        }
        Command::Rate(rate_command) => run_rate(rate_command, config)?,
        Command::Ledger(ledger_command) => run_ledger(ledger_command, config)?,
        Command::Slip {
            amount,
            weight,
            karat,
            customer,
            phone,
            description,
        } => {
            let state = open_rate_state(config, "cli")?;
            let basis = match amount {
                Some(amount) => SlipBasis::Amount { amount },
                None => SlipBasis::Weight {
                    grams: weight.grams,
                    tola: weight.tmr.tola,
                    masha: weight.tmr.masha,
                    ratti: weight.tmr.ratti,
                },
            };
            let customer = Customer {
                name: customer,
                phone,
            };
            let slip = SaleSlip::calculate(
                customer,
                &description,
                &basis,
                karat,
                state.current_rate(),
                Local::now(),
            )?;

            println!("🧾 Sale Slip {}", slip.bill_number);
            println!("   Date:     {}", slip.issued_at.format("%d/%m/%Y %I:%M %p"));
            if !slip.customer.name.is_empty() {
                println!("   Customer: {} {}", slip.customer.name, slip.customer.phone);
            }
            if !slip.description.is_empty() {
                println!("   Item:     {}", slip.description);
            }
            println!("   Karat:    {} @ {} / tola", slip.karat, format_currency(slip.karat_rate, symbol));
            println!("   Weight:   {} g ({})", format_weight(slip.grams, 3), format_tmr(&slip.tmr));
            println!("   Amount:   {}", format_currency(slip.amount, symbol));
        }
    }

    Ok(())
}

fn run_rate(command: RateCommand, config: &Config) -> Result<()> {
    let mut state = open_rate_state(config, "cli")?;
    let symbol = config.currency_symbol.as_str();

    match command {
        RateCommand::Show => {
            println!("📈 Current gold rate: {} / tola (24K)", format_currency(state.current_rate(), symbol));
            println!(
                "   Last updated: {} ({})",
                format_last_updated(state.last_updated()),
                format_relative(state.last_updated(), Utc::now())
            );
        }
        RateCommand::Set { rate } => {
            state.update_rate_from_input(&rate)?;
            println!("✓ Gold rate updated to {}", format_currency(state.current_rate(), symbol));
        }
        RateCommand::History => {
            let history = get_rate_history(state.store().conn())?;
            if history.is_empty() {
                println!("No rate changes recorded");
            }
            for change in history {
                println!(
                    "   {}  {}",
                    format_last_updated(Some(change.changed_at)),
                    format_currency(change.rate, symbol)
                );
            }
        }
    }

    Ok(())
}

fn run_ledger(command: LedgerCommand, config: &Config) -> Result<()> {
    let state = open_rate_state(config, "cli")?;
    let db = state.store();
    let symbol = config.currency_symbol.as_str();

    match command {
        LedgerCommand::Add {
            description,
            weight,
            karat,
            kind,
            price,
        } => {
            let draft = EntryDraft {
                description,
                grams: weight.grams,
                tola: weight.tmr.tola,
                masha: weight.tmr.masha,
                ratti: weight.tmr.ratti,
                karat,
                kind,
                price,
            };
            let entry = GoldEntry::from_draft(&draft, state.current_rate())?;
            insert_entry(db.conn(), &entry, db.actor())?;
            println!(
                "✓ Added {} ({} g, {}) -> {}",
                entry.description,
                format_weight(entry.grams, 4),
                entry.karat,
                format_currency(entry.final_price, symbol)
            );
            println!("   id: {}", entry.id);
        }
        LedgerCommand::List => {
            let entries = get_all_entries(db.conn())?;
            if entries.is_empty() {
                println!("Ledger is empty");
            }
            for entry in &entries {
                let sign = if entry.kind == EntryKind::Add { "+" } else { "-" };
                println!(
                    "{} {:<20} {:>10} g  {:>4}  {:>14}  {}",
                    sign,
                    entry.description,
                    format_weight(entry.grams, 4),
                    entry.karat.label(),
                    format_currency(entry.final_price, symbol),
                    entry.id
                );
            }
        }
        LedgerCommand::Totals => {
            let totals = LedgerTotals::from_entries(&get_all_entries(db.conn())?);
            println!("📒 {} entries", totals.entry_count);
            println!(
                "   Added:      {} g  {}",
                format_weight(totals.added_weight, 4),
                format_currency(totals.added_value, symbol)
            );
            println!(
                "   Subtracted: {} g  {}",
                format_weight(totals.subtracted_weight, 4),
                format_currency(totals.subtracted_value, symbol)
            );
            println!(
                "   Balance:    {} g  {}  ({})",
                format_weight(totals.balance_weight, 4),
                format_currency(totals.balance_value, symbol),
                format_tmr(&totals.balance_tmr())
            );
        }
        LedgerCommand::Remove { id } => {
            if delete_entry(db.conn(), &id, db.actor())? {
                println!("✓ Removed {}", id);
            } else {
                anyhow::bail!("No ledger entry with id {}", id);
            }
        }
        LedgerCommand::Clear => {
            let removed = clear_entries(db.conn(), db.actor())?;
            println!("✓ Removed {} entries", removed);
        }
        LedgerCommand::Export { path } => {
            let entries = get_all_entries(db.conn())?;
            let written = export_csv(&path, &entries)?;
            println!("✓ Exported {} entries to {}", written, path.display());
        }
        LedgerCommand::Import { path } => {
            let entries = import_csv(&path)?;
            let inserted = insert_entries(db.conn(), &entries, "csv_importer")
                .with_context(|| format!("Failed to import {}", path.display()))?;
            println!("✓ Imported {} entries", inserted);
            println!("✓ Skipped duplicates: {}", entries.len() - inserted);
        }
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    // stderr would draw over the alternate screen
    aurum_calc::logging::init("off")?;

    let state = open_rate_state(config, "tui")?;
    let entries = get_all_entries(state.store().conn())?;

    let mut app = ui::App::new(state, entries, config.currency_symbol.clone());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or run a subcommand, see: aurum --help");
    std::process::exit(1);
}
