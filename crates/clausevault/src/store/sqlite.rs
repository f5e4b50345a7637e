//! SQLite settings backend.
//!
//! Tables mirror the entity kinds; foreign keys carry the references:
//!
//! ```text
//! tenants   (tenant_id PK)
//! libraries (library_id PK, tenant_id → tenants)
//! users     (user_id PK, tenant_id → tenants, default_library_id → libraries, refresh_token)
//! ```
//!
//! `add` and `delete` queue work in a unit of work; `save` applies the queue
//! in one transaction with foreign-key checks deferred to commit, so the
//! order of staged operations does not matter. Lookups read committed rows
//! only. A failed commit rolls back and drops the whole queue, so the next
//! `save` starts from committed state.
//! [`RelationalSettingsStore::discard_pending`] drops staged work without
//! saving.

use super::SettingsStore;
use crate::error::Result;
use crate::model::{Entity, EntityKey, EntityKind, Library, Tenant, User};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::fs;
use std::path::Path;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Clone)]
enum PendingOp {
    Add(Entity),
    Delete(EntityKey),
}

pub struct RelationalSettingsStore {
    conn: Connection,
    pending: Vec<PendingOp>,
}

impl RelationalSettingsStore {
    /// Opens or creates a file-based database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::with_connection(Connection::open(path)?)
    }

    /// Creates a store on a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            pending: Vec::new(),
        })
    }

    /// Number of staged operations not yet saved.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    fn commit(&mut self, ops: &[PendingOp]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.pragma_update(None, "defer_foreign_keys", "ON")?;
        for op in ops {
            apply(&tx, op)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_libraries(&self, tenant_id: &str) -> Result<Vec<Library>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT library_id, tenant_id FROM libraries WHERE tenant_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![tenant_id], |row| {
            Ok(Library {
                library_id: row.get(0)?,
                tenant_id: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

/// Initialize the database schema.
fn initialize_schema(conn: &Connection) -> Result<()> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tenants (
            tenant_id TEXT PRIMARY KEY NOT NULL
        );
        CREATE TABLE IF NOT EXISTS libraries (
            library_id TEXT PRIMARY KEY NOT NULL,
            tenant_id  TEXT NOT NULL REFERENCES tenants(tenant_id)
        );
        CREATE INDEX IF NOT EXISTS idx_libraries_tenant ON libraries(tenant_id);
        CREATE TABLE IF NOT EXISTS users (
            user_id            TEXT PRIMARY KEY NOT NULL,
            tenant_id          TEXT NOT NULL REFERENCES tenants(tenant_id),
            default_library_id TEXT REFERENCES libraries(library_id),
            refresh_token      TEXT NOT NULL DEFAULT ''
        );",
    )?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tracing::debug!("initialized settings schema v{}", SCHEMA_VERSION);
    Ok(())
}

fn apply(tx: &Transaction<'_>, op: &PendingOp) -> Result<()> {
    match op {
        PendingOp::Add(Entity::Tenant(tenant)) => {
            tx.execute(
                "INSERT INTO tenants (tenant_id) VALUES (?1)",
                params![tenant.tenant_id],
            )?;
        }
        PendingOp::Add(Entity::Library(library)) => {
            tx.execute(
                "INSERT INTO libraries (library_id, tenant_id) VALUES (?1, ?2)",
                params![library.library_id, library.tenant_id],
            )?;
        }
        PendingOp::Add(Entity::User(user)) => {
            tx.execute(
                "INSERT INTO users (user_id, tenant_id, default_library_id, refresh_token)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.user_id,
                    user.tenant_id,
                    user.default_library_id,
                    user.refresh_token
                ],
            )?;
        }
        PendingOp::Delete(key) => {
            let sql = match key.kind {
                EntityKind::Tenant => "DELETE FROM tenants WHERE tenant_id = ?1",
                EntityKind::Library => "DELETE FROM libraries WHERE library_id = ?1",
                EntityKind::User => "DELETE FROM users WHERE user_id = ?1",
            };
            tx.execute(sql, params![key.id])?;
        }
    }
    Ok(())
}

impl SettingsStore for RelationalSettingsStore {
    fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let row = self
            .conn
            .query_row(
                "SELECT u.user_id, u.tenant_id, u.default_library_id, u.refresh_token,
                        t.tenant_id, l.library_id, l.tenant_id
                 FROM users u
                 LEFT JOIN tenants t ON t.tenant_id = u.tenant_id
                 LEFT JOIN libraries l ON l.library_id = u.default_library_id
                 WHERE u.user_id = ?1",
                params![id],
                |row| {
                    let user = User {
                        user_id: row.get(0)?,
                        tenant_id: row.get(1)?,
                        default_library_id: row.get(2)?,
                        refresh_token: row.get(3)?,
                        ..Default::default()
                    };
                    let tenant_id: Option<String> = row.get(4)?;
                    let library = match row.get::<_, Option<String>>(5)? {
                        Some(library_id) => Some(Library {
                            library_id,
                            tenant_id: row.get(6)?,
                        }),
                        None => None,
                    };
                    Ok((user, tenant_id, library))
                },
            )
            .optional()?;

        let Some((mut user, tenant_id, library)) = row else {
            return Ok(None);
        };
        if let Some(tenant_id) = tenant_id {
            let libraries = self.load_libraries(&tenant_id)?;
            user.tenant = Some(Tenant {
                tenant_id,
                libraries,
            });
        }
        user.default_library = library;
        Ok(Some(user))
    }

    fn get_tenant_by_id(&self, id: &str) -> Result<Option<Tenant>> {
        let tenant_id: Option<String> = self
            .conn
            .query_row(
                "SELECT tenant_id FROM tenants WHERE tenant_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match tenant_id {
            Some(tenant_id) => {
                let libraries = self.load_libraries(&tenant_id)?;
                Ok(Some(Tenant {
                    tenant_id,
                    libraries,
                }))
            }
            None => Ok(None),
        }
    }

    fn get_library_by_id(&self, id: &str) -> Result<Option<Library>> {
        let library = self
            .conn
            .query_row(
                "SELECT library_id, tenant_id FROM libraries WHERE library_id = ?1",
                params![id],
                |row| {
                    Ok(Library {
                        library_id: row.get(0)?,
                        tenant_id: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(library)
    }

    fn add(&mut self, entity: Entity) -> Result<()> {
        let entity = match entity {
            Entity::User(user) => Entity::User(user.detached()),
            other => other,
        };
        self.pending.push(PendingOp::Add(entity));
        Ok(())
    }

    fn delete(&mut self, entity: &Entity) -> Result<()> {
        self.pending.push(PendingOp::Delete(entity.key()));
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        // The queue is consumed either way: a failed commit rolls back.
        let ops = std::mem::take(&mut self.pending);
        match self.commit(&ops) {
            Ok(()) => {
                tracing::debug!("committed {} settings change(s)", ops.len());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("discarding {} staged settings change(s): {}", ops.len(), e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaultError;
    use crate::store::fixtures::seed_basic;

    #[test]
    fn test_schema_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("db").join("settings.db");
        {
            let mut store = RelationalSettingsStore::open(&path).unwrap();
            seed_basic(&mut store).unwrap();
        }
        let store = RelationalSettingsStore::open(&path).unwrap();
        assert!(store.get_tenant_by_id("T1").unwrap().is_some());
    }

    #[test]
    fn test_eager_loading_through_joins() {
        let mut store = RelationalSettingsStore::in_memory().unwrap();
        seed_basic(&mut store).unwrap();

        let user = store.get_user_by_id("U1").unwrap().unwrap();
        let tenant = user.tenant.unwrap();
        assert_eq!(tenant.tenant_id, "T1");
        assert_eq!(tenant.libraries.len(), 1);
        assert_eq!(user.default_library.unwrap().library_id, "L1");
    }

    #[test]
    fn test_pending_changes_invisible_until_save() {
        let mut store = RelationalSettingsStore::in_memory().unwrap();
        store.add(Tenant::new("T1").into()).unwrap();
        assert_eq!(store.pending_len(), 1);
        assert!(store.get_tenant_by_id("T1").unwrap().is_none());

        store.save().unwrap();
        assert_eq!(store.pending_len(), 0);
        assert!(store.get_tenant_by_id("T1").unwrap().is_some());
    }

    #[test]
    fn test_staging_order_does_not_matter() {
        let mut store = RelationalSettingsStore::in_memory().unwrap();
        store
            .add(User::new("U1", "T1").with_default_library("L1").into())
            .unwrap();
        store.add(Library::new("L1", "T1").into()).unwrap();
        store.add(Tenant::new("T1").into()).unwrap();
        store.save().unwrap();

        assert!(store.get_user_by_id("U1").unwrap().is_some());
    }

    #[test]
    fn test_schema_rejects_dangling_tenant() {
        let mut store = RelationalSettingsStore::in_memory().unwrap();
        store.add(Library::new("L1", "T-missing").into()).unwrap();

        assert!(matches!(store.save(), Err(VaultError::Sqlite(_))));
        assert_eq!(store.pending_len(), 0);
        assert!(store.get_library_by_id("L1").unwrap().is_none());
    }

    #[test]
    fn test_valid_save_after_failed_save() {
        let mut store = RelationalSettingsStore::in_memory().unwrap();
        store.add(Tenant::new("T1").into()).unwrap();
        store.add(Library::new("L1", "T-missing").into()).unwrap();
        assert!(store.save().is_err());
        assert!(store.get_tenant_by_id("T1").unwrap().is_none());

        store.add(Tenant::new("T2").into()).unwrap();
        store.save().unwrap();
        assert!(store.get_tenant_by_id("T2").unwrap().is_some());
        assert!(store.get_library_by_id("L1").unwrap().is_none());
    }

    #[test]
    fn test_discard_pending_drops_staged_work() {
        let mut store = RelationalSettingsStore::in_memory().unwrap();
        store.add(Tenant::new("T1").into()).unwrap();
        store.discard_pending();
        store.save().unwrap();
        assert!(store.get_tenant_by_id("T1").unwrap().is_none());
    }

    #[test]
    fn test_deleting_referenced_tenant_is_rejected() {
        let mut store = RelationalSettingsStore::in_memory().unwrap();
        seed_basic(&mut store).unwrap();

        store.delete(&Tenant::new("T1").into()).unwrap();
        assert!(store.save().is_err());
        assert_eq!(store.pending_len(), 0);
        assert!(store.get_tenant_by_id("T1").unwrap().is_some());
        assert!(store.get_user_by_id("U1").unwrap().is_some());
    }

    #[test]
    fn test_delete_user_leaves_everything_else() {
        let mut store = RelationalSettingsStore::in_memory().unwrap();
        seed_basic(&mut store).unwrap();
        store.add(User::new("U2", "T1").into()).unwrap();
        store.save().unwrap();

        store.delete(&User::new("U1", "T1").into()).unwrap();
        store.save().unwrap();

        assert!(store.get_user_by_id("U1").unwrap().is_none());
        assert!(store.get_user_by_id("U2").unwrap().is_some());
        assert!(store.get_tenant_by_id("T1").unwrap().is_some());
        assert!(store.get_library_by_id("L1").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_add_fails_on_save() {
        let mut store = RelationalSettingsStore::in_memory().unwrap();
        store.add(Tenant::new("T1").into()).unwrap();
        store.add(Tenant::new("T1").into()).unwrap();
        assert!(store.save().is_err());
    }
}
