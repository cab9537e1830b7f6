use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::errors::TrackResult;
use crate::model::{OwnerRef, Signature, StaticFields};
use crate::registry::TypeHandle;

/// Ordering applied to every per-owner scan: effective date first, then
/// creation time, newest first.
const CHRONOLOGICAL: &str = "ORDER BY effective_date DESC, created_at DESC";

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> TrackResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> TrackResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> TrackResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    /// Runs host-supplied SQL on the shared connection. Embedded hosts use
    /// this to manage their own record tables.
    pub fn execute_batch(&self, sql: &str) -> TrackResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Installs the delete cascade for an owner table: removing an owner
    /// row removes all of its signatures.
    pub fn enable_cascade(&self, handle: &TypeHandle) -> TrackResult<()> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "CREATE TRIGGER IF NOT EXISTS trg_{table}_signature_cascade
             AFTER DELETE ON {table}
             BEGIN
               DELETE FROM signatures
               WHERE owner_type = '{name}' AND owner_id = old.id;
             END",
            table = handle.table,
            name = handle.name,
        );
        conn.execute_batch(&sql)?;
        Ok(())
    }

    pub(crate) fn insert_signature(
        &self,
        owner: &OwnerRef,
        user_id: i64,
        physician_id: Option<i64>,
        effective_date: Option<NaiveDate>,
        fields: &StaticFields,
        created_at: DateTime<Utc>,
    ) -> TrackResult<Signature> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO signatures(owner_type, owner_id, user_id, physician_id,
                                    effective_date, static_role, static_name,
                                    static_user_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                owner.type_name,
                owner.id,
                user_id,
                physician_id,
                effective_date,
                fields.role,
                fields.name,
                fields.user_name,
                created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(owner = %owner, signature_id = id, "signature persisted");
        Ok(Signature {
            id,
            owner: owner.clone(),
            user_id,
            physician_id,
            effective_date,
            static_role: fields.role.clone(),
            static_name: fields.name.clone(),
            static_user_name: fields.user_name.clone(),
            created_at,
        })
    }

    /// All signatures for an owner, in chronological order.
    pub fn signatures_for(&self, owner: &OwnerRef) -> TrackResult<Vec<Signature>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, owner_type, owner_id, user_id, physician_id, effective_date,
                    static_role, static_name, static_user_name, created_at
             FROM signatures
             WHERE owner_type = ?1 AND owner_id = ?2
             {CHRONOLOGICAL}"
        ))?;
        let rows = stmt.query_map(params![owner.type_name, owner.id], row_to_signature)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn has_signature(&self, owner: &OwnerRef) -> TrackResult<bool> {
        let conn = self.conn.lock().unwrap();
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM signatures WHERE owner_type = ?1 AND owner_id = ?2)",
            params![owner.type_name, owner.id],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    pub fn has_physician_signature(&self, owner: &OwnerRef) -> TrackResult<bool> {
        let conn = self.conn.lock().unwrap();
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM signatures
                WHERE owner_type = ?1 AND owner_id = ?2 AND physician_id IS NOT NULL)",
            params![owner.type_name, owner.id],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    /// Plain-signature match only: a physician-countersigned entry by the
    /// same user does not count.
    pub fn has_plain_signature_by(&self, owner: &OwnerRef, user_id: i64) -> TrackResult<bool> {
        let conn = self.conn.lock().unwrap();
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM signatures
                WHERE owner_type = ?1 AND owner_id = ?2
                  AND user_id = ?3 AND physician_id IS NULL)",
            params![owner.type_name, owner.id, user_id],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    /// First signature by `user_id` whose stored physician matches
    /// `physician_id` exactly (`IS` comparison, so `None` matches null).
    pub fn find_by_user(
        &self,
        owner: &OwnerRef,
        user_id: i64,
        physician_id: Option<i64>,
    ) -> TrackResult<Option<Signature>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, owner_type, owner_id, user_id, physician_id, effective_date,
                    static_role, static_name, static_user_name, created_at
             FROM signatures
             WHERE owner_type = ?1 AND owner_id = ?2
               AND user_id = ?3 AND physician_id IS ?4
             {CHRONOLOGICAL}
             LIMIT 1"
        ))?;
        let mut rows = stmt.query(params![owner.type_name, owner.id, user_id, physician_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_signature(row)?)),
            None => Ok(None),
        }
    }

    pub fn find_by_physician(
        &self,
        owner: &OwnerRef,
        physician_id: i64,
    ) -> TrackResult<Option<Signature>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, owner_type, owner_id, user_id, physician_id, effective_date,
                    static_role, static_name, static_user_name, created_at
             FROM signatures
             WHERE owner_type = ?1 AND owner_id = ?2 AND physician_id = ?3
             {CHRONOLOGICAL}
             LIMIT 1"
        ))?;
        let mut rows = stmt.query(params![owner.type_name, owner.id, physician_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_signature(row)?)),
            None => Ok(None),
        }
    }

    /// Owner ids of `handle.table` with no physician-bearing signature.
    /// Plain signatures do not count as signed for this query.
    pub fn unsigned_owner_ids(&self, handle: &TypeHandle) -> TrackResult<Vec<i64>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT t.id FROM {table} t
             LEFT JOIN signatures s
               ON s.owner_id = t.id
              AND s.owner_type = ?1
              AND s.physician_id IS NOT NULL
             WHERE s.id IS NULL
             ORDER BY t.id",
            table = handle.table,
        ))?;
        let rows = stmt.query_map(params![handle.name], |row| row.get::<_, i64>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn row_to_signature(row: &Row<'_>) -> rusqlite::Result<Signature> {
    Ok(Signature {
        id: row.get(0)?,
        owner: OwnerRef {
            type_name: row.get(1)?,
            id: row.get(2)?,
        },
        user_id: row.get(3)?,
        physician_id: row.get(4)?,
        effective_date: row.get(5)?,
        static_role: row.get(6)?,
        static_name: row.get(7)?,
        static_user_name: row.get(8)?,
        created_at: row.get(9)?,
    })
}
