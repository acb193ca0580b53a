use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::AurumError;
use crate::karat::Karat;
use crate::ledger::{EntryKind, GoldEntry};
use crate::rate::{RateStore, StoredRate, LAST_UPDATED_KEY, RATE_KEY};

/// Event for audit trail (every rate change and ledger edit is recorded)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

/// One past rate edit, read back from the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateChange {
    pub rate: f64,
    pub changed_at: DateTime<Utc>,
}

pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Settings (generic key-value slots: goldRate, lastUpdated)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Gold calculation ledger
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS gold_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_uuid TEXT UNIQUE NOT NULL,
            idempotency_hash TEXT UNIQUE NOT NULL,
            description TEXT NOT NULL,
            grams REAL NOT NULL,
            tola REAL NOT NULL,
            masha REAL NOT NULL,
            ratti REAL NOT NULL,
            karat INTEGER NOT NULL,
            kind TEXT NOT NULL,
            calculated_value REAL NOT NULL,
            final_price REAL NOT NULL,
            date TEXT NOT NULL,
            metadata TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entries_date ON gold_entries(date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// SETTINGS
// ============================================================================

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;

    Ok(value)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, Utc::now().to_rfc3339()],
    )?;

    Ok(())
}

// ============================================================================
// LEDGER ENTRIES
// ============================================================================

/// Insert one entry. Returns false when an identical entry already exists.
pub fn insert_entry(conn: &Connection, entry: &GoldEntry, actor: &str) -> Result<bool> {
    let hash = entry.compute_idempotency_hash();
    let metadata_json = serde_json::json!({ "source": actor }).to_string();

    let result = conn.execute(
        "INSERT INTO gold_entries (
            entry_uuid, idempotency_hash, description, grams, tola, masha, ratti,
            karat, kind, calculated_value, final_price, date, metadata
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            entry.id,
            hash,
            entry.description,
            entry.grams,
            entry.tola,
            entry.masha,
            entry.ratti,
            entry.karat.value(),
            entry.kind.as_str(),
            entry.calculated_value,
            entry.final_price,
            entry.date.to_rfc3339(),
            metadata_json,
        ],
    );

    match result {
        Ok(_) => {
            let event = Event::new(
                "entry_added",
                "gold_entry",
                &entry.id,
                serde_json::json!({
                    "description": entry.description,
                    "grams": entry.grams,
                    "karat": entry.karat.value(),
                    "kind": entry.kind.as_str(),
                    "final_price": entry.final_price,
                }),
                actor,
            );
            insert_event(conn, &event)?;
            Ok(true)
        }
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            debug!(entry = %entry.id, "Skipping duplicate ledger entry");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Insert many entries, skipping duplicates. Returns how many were new.
pub fn insert_entries(conn: &Connection, entries: &[GoldEntry], actor: &str) -> Result<usize> {
    let mut inserted = 0;
    let mut duplicates = 0;

    for entry in entries {
        if insert_entry(conn, entry, actor)? {
            inserted += 1;
        } else {
            duplicates += 1;
        }
    }

    info!(inserted, duplicates, "Ledger entries stored");
    Ok(inserted)
}

pub fn get_all_entries(conn: &Connection) -> Result<Vec<GoldEntry>> {
    let mut stmt = conn.prepare(
        "SELECT entry_uuid, description, grams, tola, masha, ratti,
                karat, kind, calculated_value, final_price, date
         FROM gold_entries
         ORDER BY id ASC",
    )?;

    let entries = stmt
        .query_map([], |row| {
            let karat_value: u32 = row.get(6)?;
            let kind_str: String = row.get(7)?;
            let date_str: String = row.get(10)?;

            Ok(GoldEntry {
                id: row.get(0)?,
                description: row.get(1)?,
                grams: row.get(2)?,
                tola: row.get(3)?,
                masha: row.get(4)?,
                ratti: row.get(5)?,
                karat: Karat::from_value(karat_value).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        6,
                        Type::Integer,
                        Box::new(AurumError::UnknownKarat(karat_value.to_string())),
                    )
                })?,
                kind: kind_str.parse::<EntryKind>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e))
                })?,
                calculated_value: row.get(8)?,
                final_price: row.get(9)?,
                date: DateTime::parse_from_rfc3339(&date_str)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e))
                    })?
                    .with_timezone(&Utc),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries)
}

/// Delete by entry UUID. Returns false when no such entry exists.
pub fn delete_entry(conn: &Connection, entry_id: &str, actor: &str) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM gold_entries WHERE entry_uuid = ?1",
        params![entry_id],
    )?;

    if removed > 0 {
        let event = Event::new(
            "entry_deleted",
            "gold_entry",
            entry_id,
            serde_json::json!({}),
            actor,
        );
        insert_event(conn, &event)?;
    }

    Ok(removed > 0)
}

pub fn clear_entries(conn: &Connection, actor: &str) -> Result<usize> {
    let removed = conn.execute("DELETE FROM gold_entries", [])?;

    let event = Event::new(
        "ledger_cleared",
        "gold_entry",
        "*",
        serde_json::json!({ "removed": removed }),
        actor,
    );
    insert_event(conn, &event)?;

    Ok(removed)
}

pub fn count_entries(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM gold_entries", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Past rate edits, newest first
pub fn get_rate_history(conn: &Connection) -> Result<Vec<RateChange>> {
    let events = get_events_for_entity(conn, "setting", RATE_KEY)?;

    Ok(events
        .into_iter()
        .filter(|e| e.event_type == "rate_updated")
        .filter_map(|e| {
            e.data.get("rate").and_then(|v| v.as_f64()).map(|rate| RateChange {
                rate,
                changed_at: e.timestamp,
            })
        })
        .collect())
}

// ============================================================================
// DATABASE HANDLE
// ============================================================================

/// Owned connection; the persisted side of `RateState`
pub struct Database {
    conn: Connection,
    actor: String,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Database {
            conn: open_database(path)?,
            actor: "user".to_string(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Database {
            conn,
            actor: "user".to_string(),
        })
    }

    /// Name recorded on audit events ("cli", "tui", "api", ...)
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = actor.to_string();
        self
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl RateStore for Database {
    fn load(&self) -> Result<Option<StoredRate>> {
        let Some(rate_str) = get_setting(&self.conn, RATE_KEY)? else {
            return Ok(None);
        };

        let rate = rate_str
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Stored rate '{}' is not a number", rate_str))?;

        let updated_at = get_setting(&self.conn, LAST_UPDATED_KEY)?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Some(StoredRate { rate, updated_at }))
    }

    fn save(&self, stored: &StoredRate) -> Result<()> {
        let updated_at = stored.updated_at.unwrap_or_else(Utc::now);

        // Rate, timestamp and event land together or not at all
        let tx = self.conn.unchecked_transaction()?;
        set_setting(&tx, RATE_KEY, &stored.rate.to_string())?;
        set_setting(&tx, LAST_UPDATED_KEY, &updated_at.to_rfc3339())?;

        let event = Event::new(
            "rate_updated",
            "setting",
            RATE_KEY,
            serde_json::json!({ "rate": stored.rate }),
            &self.actor,
        );
        insert_event(&tx, &event)?;

        tx.commit()?;
        Ok(())
    }
}
