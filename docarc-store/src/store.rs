//! SQLite-backed license record store.
//!
//! One row per licensed device. The uniqueness of `device_code` is enforced
//! by a UNIQUE constraint at the storage layer, which closes the race
//! between two concurrent `create` calls for the same device.

use crate::error::{StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

/// A persisted license binding a device code to an auth code and expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Record id (UUIDv4).
    pub id: String,
    /// Device code this license is bound to (unique).
    pub device_code: String,
    /// Activation code issued for the device (unique).
    pub auth_code: String,
    /// Expiry timestamp, unix seconds.
    pub expire_time: i64,
    /// Creation timestamp, unix seconds.
    pub created_at: i64,
    /// Optional human-readable label.
    pub name: Option<String>,
}

impl License {
    /// Returns true if the license is active at `now` (unix seconds).
    ///
    /// The boundary is exclusive-past / inclusive-future: a license with
    /// `expire_time == now` is already expired.
    #[must_use]
    pub fn is_active(&self, now: i64) -> bool {
        self.expire_time > now
    }
}

/// Fields for a new license row; timestamps are supplied by the caller so
/// the service layer can use an injected clock.
#[derive(Debug, Clone)]
pub struct NewLicense<'a> {
    pub device_code: &'a str,
    pub auth_code: &'a str,
    pub expire_time: i64,
    pub created_at: i64,
    pub name: Option<&'a str>,
}

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// CRUD over license rows.
///
/// The connection is behind a mutex; every operation is a short single-row
/// statement, so contention is negligible.
pub struct LicenseStore {
    conn: Mutex<Connection>,
}

impl LicenseStore {
    /// Opens (and migrates) the store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens an in-memory store, used in tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS licenses (
                id          TEXT PRIMARY KEY,
                device_code TEXT NOT NULL UNIQUE,
                auth_code   TEXT NOT NULL UNIQUE,
                expire_time INTEGER NOT NULL,
                created_at  INTEGER NOT NULL,
                name        TEXT
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Inserts a new license row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateDevice`] when the device code is
    /// already bound (policy: reject, never silently overwrite).
    pub fn create(&self, new: &NewLicense<'_>) -> StoreResult<License> {
        let license = License {
            id: Uuid::new_v4().to_string(),
            device_code: new.device_code.to_string(),
            auth_code: new.auth_code.to_string(),
            expire_time: new.expire_time,
            created_at: new.created_at,
            name: new.name.map(String::from),
        };
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO licenses (id, device_code, auth_code, expire_time, created_at, name)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                license.id,
                license.device_code,
                license.auth_code,
                license.expire_time,
                license.created_at,
                license.name,
            ],
        )
        .map_err(|e| match &e {
            rusqlite::Error::SqliteFailure(err, Some(msg))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
                    && msg.contains("device_code") =>
            {
                StoreError::DuplicateDevice(license.device_code.clone())
            }
            _ => StoreError::Database(e),
        })?;
        Ok(license)
    }

    /// Fetches a license by id.
    pub fn get(&self, id: &str) -> StoreResult<Option<License>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let license = conn
            .query_row(
                "SELECT id, device_code, auth_code, expire_time, created_at, name
                 FROM licenses WHERE id = ?1",
                params![id],
                row_to_license,
            )
            .optional()?;
        Ok(license)
    }

    /// Fetches the license bound to a device code, if any.
    pub fn find_by_device(&self, device_code: &str) -> StoreResult<Option<License>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let license = conn
            .query_row(
                "SELECT id, device_code, auth_code, expire_time, created_at, name
                 FROM licenses WHERE device_code = ?1",
                params![device_code],
                row_to_license,
            )
            .optional()?;
        Ok(license)
    }

    /// Extends a license by `additional_days` from its current expiry.
    ///
    /// Extending from the current expiry rather than from now preserves any
    /// remaining validity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id does not exist.
    pub fn renew(&self, id: &str, additional_days: u32) -> StoreResult<License> {
        {
            let conn = self.conn.lock().expect("store mutex poisoned");
            let updated = conn.execute(
                "UPDATE licenses SET expire_time = expire_time + ?1 WHERE id = ?2",
                params![i64::from(additional_days) * SECS_PER_DAY, id],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }
        self.get(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Deletes a license, returning the removed row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id does not exist.
    pub fn delete(&self, id: &str) -> StoreResult<License> {
        let license = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute("DELETE FROM licenses WHERE id = ?1", params![id])?;
        Ok(license)
    }

    /// Lists all licenses, newest first.
    pub fn list(&self) -> StoreResult<Vec<License>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, device_code, auth_code, expire_time, created_at, name
             FROM licenses ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], row_to_license)?;
        let mut licenses = Vec::new();
        for row in rows {
            licenses.push(row?);
        }
        Ok(licenses)
    }
}

fn row_to_license(row: &Row<'_>) -> rusqlite::Result<License> {
    Ok(License {
        id: row.get(0)?,
        device_code: row.get(1)?,
        auth_code: row.get(2)?,
        expire_time: row.get(3)?,
        created_at: row.get(4)?,
        name: row.get(5)?,
    })
}
