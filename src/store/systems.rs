//! Systems Store - SQLite-backed ransom notices
//!
//! One row per wormhole system (keyed by J-code) with the asking price and
//! admin flags, and any number of structures with their fits and estimated
//! value. Writes that touch both tables run in a single transaction.

use regex::Regex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

use super::isk::Isk;
use super::schema::{self, SchemaReport};
use super::{StoreError, StoreResult};

/// Pilot name shown on every public notice
pub const NOTICE_PILOT: &str = "Leshak Pilot 1";

fn jcode_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^J\d{6}$").expect("valid J-code regex"))
}

/// Upper-case and validate a J-code (`J` + six digits)
pub fn normalize_jcode(raw: &str) -> StoreResult<String> {
    let upper = raw.trim().to_uppercase();
    if jcode_re().is_match(&upper) {
        Ok(upper)
    } else {
        Err(StoreError::InvalidJCode(raw.to_string()))
    }
}

/// A structure as stored and returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub kind: String,
    pub fit_text: String,
    #[serde(rename = "estimatedISK", default)]
    pub estimated_isk: Isk,
}

/// Fields an admin sets when creating or updating a system
#[derive(Debug, Clone, Default)]
pub struct SystemInput {
    pub ransom_isk: i64,
    pub notes: String,
    pub structures: Vec<Structure>,
}

/// Full view of one system
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemDetail {
    pub jcode: String,
    #[serde(rename = "ransomISK")]
    pub ransom_isk: i64,
    #[serde(rename = "totalStructuresISK")]
    pub total_structures_isk: i64,
    pub structures: Vec<Structure>,
    pub pilot: String,
    pub notes: String,
    pub evicted: bool,
    pub ransomed: bool,
}

/// One line of the admin list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSummary {
    pub jcode: String,
    #[serde(rename = "ransomISK")]
    pub ransom_isk: i64,
    pub structures_count: i64,
    #[serde(rename = "totalStructuresISK")]
    pub total_structures_isk: i64,
    #[serde(rename = "created_at")]
    pub created_at: Option<String>,
    #[serde(rename = "updated_at")]
    pub updated_at: Option<String>,
    pub evicted: bool,
    pub ransomed: bool,
}

const LIST_SQL: &str = "
    SELECT s.jcode, s.ransom_isk, s.created_at, s.updated_at, s.evicted, s.ransomed,
           COUNT(t.id), COALESCE(SUM(t.estimated_value_isk), 0)
    FROM systems s
    LEFT JOIN structures t ON t.system_id = s.id
    WHERE ?1 IS NULL OR s.jcode LIKE ?1
    GROUP BY s.id
    ORDER BY s.updated_at DESC, s.created_at DESC, s.id DESC";

/// SQLite store for systems and their structures
pub struct SystemStore {
    conn: Mutex<Connection>,
}

impl SystemStore {
    /// Open (or create) the database file.
    ///
    /// Tables are created only when the file has none of them and
    /// `allow_create` is set; the schema report is logged either way.
    pub fn open(path: &Path, allow_create: bool) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        Self::init(conn, allow_create)
    }

    /// In-memory database with a fresh schema
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::init(conn, true)
    }

    fn init(conn: Connection, allow_create: bool) -> StoreResult<Self> {
        let outcome = schema::create_if_empty(&conn, allow_create)?;
        tracing::debug!(?outcome, "Schema initialization");
        schema::inspect(&conn)?.log();

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    /// Compare the live schema with the expected one
    pub fn inspect(&self) -> StoreResult<SchemaReport> {
        let conn = self.conn()?;
        schema::inspect(&conn)
    }

    /// Cheap round trip used by readiness checks
    pub fn ping(&self) -> StoreResult<()> {
        self.conn()?.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    /// Look up one system with its structures
    pub fn get_system(&self, jcode: &str) -> StoreResult<Option<SystemDetail>> {
        let conn = self.conn()?;

        let row = conn
            .query_row(
                "SELECT id, jcode, ransom_isk, COALESCE(notes, ''), evicted, ransomed
                 FROM systems WHERE jcode = ?1",
                params![jcode],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, jcode, ransom_isk, notes, evicted, ransomed)) = row else {
            return Ok(None);
        };

        let structures = load_structures(&conn, id)?;
        let total_structures_isk = structures.iter().map(|s| s.estimated_isk.0).sum();

        Ok(Some(SystemDetail {
            jcode,
            ransom_isk,
            total_structures_isk,
            structures,
            pilot: NOTICE_PILOT.to_string(),
            notes,
            evicted: evicted != 0,
            ransomed: ransomed != 0,
        }))
    }

    /// Insert a system or overwrite an existing one, replacing its structures
    pub fn upsert_system(&self, jcode: &str, input: &SystemInput) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO systems (jcode, ransom_isk, notes)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(jcode) DO UPDATE SET
                 ransom_isk = excluded.ransom_isk,
                 notes = excluded.notes,
                 updated_at = CURRENT_TIMESTAMP",
            params![jcode, input.ransom_isk, input.notes],
        )?;

        let id: i64 = tx.query_row(
            "SELECT id FROM systems WHERE jcode = ?1",
            params![jcode],
            |row| row.get(0),
        )?;
        replace_structures(&tx, id, &input.structures)?;

        tx.commit()?;
        tracing::info!(jcode = %jcode, structures = input.structures.len(), "Upserted system");
        Ok(())
    }

    /// Update an existing system. Returns `false` when it does not exist.
    pub fn update_system(&self, jcode: &str, input: &SystemInput) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let id: Option<i64> = tx
            .query_row(
                "SELECT id FROM systems WHERE jcode = ?1",
                params![jcode],
                |row| row.get(0),
            )
            .optional()?;
        let Some(id) = id else {
            return Ok(false);
        };

        tx.execute(
            "UPDATE systems
             SET ransom_isk = ?1, notes = ?2, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?3",
            params![input.ransom_isk, input.notes, id],
        )?;
        replace_structures(&tx, id, &input.structures)?;

        tx.commit()?;
        tracing::info!(jcode = %jcode, structures = input.structures.len(), "Updated system");
        Ok(true)
    }

    /// Delete a system and, by cascade, its structures
    pub fn delete_system(&self, jcode: &str) -> StoreResult<bool> {
        let changed = self
            .conn()?
            .execute("DELETE FROM systems WHERE jcode = ?1", params![jcode])?;
        if changed > 0 {
            tracing::info!(jcode = %jcode, "Deleted system");
        }
        Ok(changed > 0)
    }

    /// All systems, most recently updated first, optionally filtered by a
    /// J-code substring
    pub fn list_systems(&self, search: Option<&str>) -> StoreResult<Vec<SystemSummary>> {
        let pattern = search
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(LIST_SQL)?;
        let rows = stmt.query_map(params![pattern], |row| {
            Ok(SystemSummary {
                jcode: row.get(0)?,
                ransom_isk: row.get(1)?,
                created_at: row.get(2)?,
                updated_at: row.get(3)?,
                evicted: row.get::<_, i64>(4)? != 0,
                ransomed: row.get::<_, i64>(5)? != 0,
                structures_count: row.get(6)?,
                total_structures_isk: row.get(7)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Set the evicted flag. Returns `false` when the system does not exist.
    pub fn set_evicted(&self, jcode: &str, evicted: bool) -> StoreResult<bool> {
        self.set_flag("evicted", jcode, evicted)
    }

    /// Set the ransomed flag. Returns `false` when the system does not exist.
    pub fn set_ransomed(&self, jcode: &str, ransomed: bool) -> StoreResult<bool> {
        self.set_flag("ransomed", jcode, ransomed)
    }

    fn set_flag(&self, column: &'static str, jcode: &str, value: bool) -> StoreResult<bool> {
        let sql = format!(
            "UPDATE systems SET {} = ?1, updated_at = CURRENT_TIMESTAMP WHERE jcode = ?2",
            column
        );
        let changed = self
            .conn()?
            .execute(&sql, params![value as i64, jcode])?;
        Ok(changed > 0)
    }
}

fn load_structures(conn: &Connection, system_id: i64) -> StoreResult<Vec<Structure>> {
    let mut stmt = conn.prepare_cached(
        "SELECT kind, fit_text, estimated_value_isk FROM structures
         WHERE system_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![system_id], |row| {
        Ok(Structure {
            kind: row.get(0)?,
            fit_text: row.get(1)?,
            estimated_isk: Isk(row.get(2)?),
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn replace_structures(conn: &Connection, system_id: i64, structures: &[Structure]) -> StoreResult<()> {
    conn.execute("DELETE FROM structures WHERE system_id = ?1", params![system_id])?;

    let mut stmt = conn.prepare_cached(
        "INSERT INTO structures (system_id, kind, fit_text, estimated_value_isk)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for s in structures {
        stmt.execute(params![system_id, s.kind, s.fit_text, s.estimated_isk.0])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn astrahus(value: i64) -> Structure {
        Structure {
            kind: "Astrahus".to_string(),
            fit_text: "[Astrahus, Home]\nStandup Cloning Center I".to_string(),
            estimated_isk: Isk(value),
        }
    }

    fn input(ransom: i64, structures: Vec<Structure>) -> SystemInput {
        SystemInput {
            ransom_isk: ransom,
            notes: "holders online EU TZ".to_string(),
            structures,
        }
    }

    #[test]
    fn test_normalize_jcode() {
        assert_eq!(normalize_jcode(" j123456 ").unwrap(), "J123456");
        assert!(normalize_jcode("J12345").is_err());
        assert!(normalize_jcode("K123456").is_err());
        assert!(normalize_jcode("J1234567").is_err());
    }

    #[test]
    fn test_upsert_and_get() {
        let store = SystemStore::open_in_memory().unwrap();
        store
            .upsert_system("J123456", &input(5_000_000_000, vec![astrahus(1_500_000_000), astrahus(500_000_000)]))
            .unwrap();

        let sys = store.get_system("J123456").unwrap().unwrap();
        assert_eq!(sys.ransom_isk, 5_000_000_000);
        assert_eq!(sys.total_structures_isk, 2_000_000_000);
        assert_eq!(sys.structures.len(), 2);
        assert_eq!(sys.pilot, NOTICE_PILOT);
        assert_eq!(sys.notes, "holders online EU TZ");
        assert!(!sys.evicted && !sys.ransomed);
    }

    #[test]
    fn test_upsert_replaces_structures() {
        let store = SystemStore::open_in_memory().unwrap();
        store.upsert_system("J123456", &input(1, vec![astrahus(10), astrahus(20)])).unwrap();
        store.upsert_system("J123456", &input(2, vec![astrahus(30)])).unwrap();

        let sys = store.get_system("J123456").unwrap().unwrap();
        assert_eq!(sys.ransom_isk, 2);
        assert_eq!(sys.structures, vec![astrahus(30)]);
        assert_eq!(store.list_systems(None).unwrap().len(), 1);
    }

    #[test]
    fn test_update_missing_system() {
        let store = SystemStore::open_in_memory().unwrap();
        assert!(!store.update_system("J000001", &input(1, vec![])).unwrap());

        store.upsert_system("J000001", &input(1, vec![astrahus(5)])).unwrap();
        assert!(store.update_system("J000001", &input(9, vec![])).unwrap());

        let sys = store.get_system("J000001").unwrap().unwrap();
        assert_eq!(sys.ransom_isk, 9);
        assert!(sys.structures.is_empty());
    }

    #[test]
    fn test_delete_cascades() {
        let store = SystemStore::open_in_memory().unwrap();
        store.upsert_system("J123456", &input(1, vec![astrahus(5)])).unwrap();

        assert!(store.delete_system("J123456").unwrap());
        assert!(!store.delete_system("J123456").unwrap());
        assert!(store.get_system("J123456").unwrap().is_none());

        let orphans: i64 = store
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM structures", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_list_with_search() {
        let store = SystemStore::open_in_memory().unwrap();
        store.upsert_system("J111111", &input(1, vec![astrahus(5), astrahus(7)])).unwrap();
        store.upsert_system("J222222", &input(2, vec![])).unwrap();

        let all = store.list_systems(None).unwrap();
        assert_eq!(all.len(), 2);

        let hits = store.list_systems(Some("j111")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].jcode, "J111111");
        assert_eq!(hits[0].structures_count, 2);
        assert_eq!(hits[0].total_structures_isk, 12);

        assert_eq!(store.list_systems(Some("  ")).unwrap().len(), 2);
        assert!(store.list_systems(Some("J9")).unwrap().is_empty());
    }

    #[test]
    fn test_flags() {
        let store = SystemStore::open_in_memory().unwrap();
        store.upsert_system("J123456", &input(1, vec![])).unwrap();

        assert!(store.set_evicted("J123456", true).unwrap());
        assert!(store.set_ransomed("J123456", true).unwrap());
        assert!(!store.set_evicted("J654321", true).unwrap());

        let sys = store.get_system("J123456").unwrap().unwrap();
        assert!(sys.evicted && sys.ransomed);

        let listed = &store.list_systems(None).unwrap()[0];
        assert!(listed.evicted && listed.ransomed);
    }

    #[test]
    fn test_open_file_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("reject.db");

        {
            let store = SystemStore::open(&path, true).unwrap();
            store.upsert_system("J123456", &input(42, vec![])).unwrap();
        }

        let store = SystemStore::open(&path, false).unwrap();
        assert!(store.inspect().unwrap().ok);
        assert_eq!(store.get_system("J123456").unwrap().unwrap().ransom_isk, 42);
    }

    #[test]
    fn test_inspect_through_store() {
        let store = SystemStore::open_in_memory().unwrap();
        let report = store.inspect().unwrap();
        assert!(report.ok);
        assert!(report.missing_columns.is_empty());
    }

    #[test]
    fn test_structure_json_shape() {
        let json = serde_json::to_value(astrahus(3)).unwrap();
        assert_eq!(json["kind"], "Astrahus");
        assert_eq!(json["estimatedISK"], 3);
        assert!(json.get("fitText").is_some());

        let parsed: Structure = serde_json::from_str(
            r#"{"kind": "Raitaru", "fitText": "[Raitaru]", "estimatedISK": "750m"}"#,
        )
        .unwrap();
        assert_eq!(parsed.estimated_isk, Isk(750_000_000));
    }
}
