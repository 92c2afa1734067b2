//! Schema creation and inspection
//!
//! The store creates its tables only in an empty database. An existing
//! database is inspected and reported on, never altered.

use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

use super::StoreResult;

pub const REQUIRED_TABLES: [&str; 2] = ["systems", "structures"];

const SYSTEMS_COLUMNS: [&str; 8] = [
    "id",
    "jcode",
    "ransom_isk",
    "notes",
    "evicted",
    "ransomed",
    "created_at",
    "updated_at",
];

const STRUCTURES_COLUMNS: [&str; 5] = ["id", "system_id", "kind", "fit_text", "estimated_value_isk"];

const CREATE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS systems (
        id INTEGER PRIMARY KEY,
        jcode TEXT UNIQUE NOT NULL,
        ransom_isk INTEGER NOT NULL,
        notes TEXT DEFAULT '',
        evicted INTEGER NOT NULL DEFAULT 0,
        ransomed INTEGER NOT NULL DEFAULT 0,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS structures (
        id INTEGER PRIMARY KEY,
        system_id INTEGER NOT NULL REFERENCES systems(id) ON DELETE CASCADE,
        kind TEXT NOT NULL,
        fit_text TEXT NOT NULL,
        estimated_value_isk INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_systems_jcode ON systems(jcode);
    CREATE INDEX IF NOT EXISTS idx_structures_system_id ON structures(system_id);
";

/// What [`create_if_empty`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyInitialized,
    NotAllowed,
}

/// Result of comparing the live schema with the expected one
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SchemaReport {
    pub ok: bool,
    pub present_tables: Vec<String>,
    pub missing_tables: Vec<String>,
    pub missing_columns: BTreeMap<String, Vec<String>>,
}

impl SchemaReport {
    /// Log the report: one info line when healthy, warnings otherwise
    pub fn log(&self) {
        if self.ok {
            tracing::info!(tables = %self.present_tables.join(", "), "Database schema OK");
            return;
        }
        if !self.missing_tables.is_empty() {
            tracing::warn!(tables = %self.missing_tables.join(", "), "Database missing tables");
        }
        for (table, cols) in &self.missing_columns {
            tracing::warn!(table = %table, columns = %cols.join(", "), "Table missing columns");
        }
        tracing::warn!("Schema left unchanged; fix the database by hand");
    }
}

fn expected_columns(table: &str) -> &'static [&'static str] {
    match table {
        "systems" => &SYSTEMS_COLUMNS,
        "structures" => &STRUCTURES_COLUMNS,
        _ => &[],
    }
}

fn table_list(conn: &Connection) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn columns_for(conn: &Connection, table: &str) -> StoreResult<Vec<String>> {
    // table names come from REQUIRED_TABLES, never from user input
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Compare the database against the expected tables and columns
pub fn inspect(conn: &Connection) -> StoreResult<SchemaReport> {
    let present_tables = table_list(conn)?;

    let missing_tables: Vec<String> = REQUIRED_TABLES
        .iter()
        .filter(|t| !present_tables.iter().any(|p| p == *t))
        .map(|t| t.to_string())
        .collect();

    let mut missing_columns = BTreeMap::new();
    for table in REQUIRED_TABLES {
        if missing_tables.iter().any(|m| m == table) {
            continue;
        }
        let cols = columns_for(conn, table)?;
        let missing: Vec<String> = expected_columns(table)
            .iter()
            .filter(|c| !cols.iter().any(|have| have == *c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            missing_columns.insert(table.to_string(), missing);
        }
    }

    Ok(SchemaReport {
        ok: missing_tables.is_empty() && missing_columns.is_empty(),
        present_tables,
        missing_tables,
        missing_columns,
    })
}

/// Create the schema, but only in a database with none of our tables
pub fn create_if_empty(conn: &Connection, allow_create: bool) -> StoreResult<CreateOutcome> {
    if !allow_create {
        return Ok(CreateOutcome::NotAllowed);
    }

    let present = table_list(conn)?;
    if REQUIRED_TABLES.iter().any(|t| present.iter().any(|p| p == t)) {
        return Ok(CreateOutcome::AlreadyInitialized);
    }

    conn.execute_batch(CREATE_SCHEMA)?;
    Ok(CreateOutcome::Created)
}
