//! # Settings Storage Layer
//!
//! This module defines the storage abstraction for login settings. The
//! [`SettingsStore`] trait is the one contract both backends implement; the
//! backend is picked once, when the application is composed (see
//! [`crate::init::open_store`]), and consumers only ever see the trait.
//!
//! ## Contract
//!
//! - Lookups return `Ok(None)` on a miss. Matching is exact identifier equality.
//! - `get_user_by_id` attaches the User's Tenant and, if set, its default Library.
//! - `get_tenant_by_id` attaches every Library whose `TenantId` matches.
//! - `add` / `delete` are routed by the [`Entity`] variant. Only `save`
//!   makes them durable. Visibility before `save` differs by backend: the
//!   file backend applies them to its in-memory document at once, so
//!   lookups see them immediately; the SQLite backend queues them and
//!   lookups see committed rows only.
//! - No cascade: deleting a Tenant never removes its Libraries and Users.
//!   The file backend leaves them dangling; SQLite refuses the delete.
//!
//! ## Implementations
//!
//! - [`file::FileSettingsStore`]: the whole settings universe as one JSON
//!   document held in memory, loaded at construction and rewritten on `save`
//!   through the retrying writer. References are resolved through an
//!   identifier index since there is no query engine to join with.
//! - [`sqlite::RelationalSettingsStore`]: SQLite tables with foreign keys;
//!   joins do the resolution and the schema enforces integrity.
//!
//! ## Sharing
//!
//! Mutating methods take `&mut self`, so one instance has one writer. To share
//! an instance between threads, wrap it in [`SharedSettingsStore`] and run
//! each load-mutate-save sequence inside [`SharedSettingsStore::with`].

use crate::error::Result;
use crate::model::{Entity, Library, Tenant, User};
use parking_lot::Mutex;
use std::sync::Arc;

pub mod file;
pub mod sqlite;

/// CRUD over Tenants, Libraries and Users.
pub trait SettingsStore {
    /// Get a user by ID, with its tenant and default library attached
    fn get_user_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Get a tenant by ID, with its libraries attached
    fn get_tenant_by_id(&self, id: &str) -> Result<Option<Tenant>>;

    /// Get a library by ID
    fn get_library_by_id(&self, id: &str) -> Result<Option<Library>>;

    /// Stage an entity for insertion
    fn add(&mut self, entity: Entity) -> Result<()>;

    /// Stage removal of the entity with the same kind and ID
    fn delete(&mut self, entity: &Entity) -> Result<()>;

    /// Commit staged changes to durable storage
    fn save(&mut self) -> Result<()>;
}

impl<S: SettingsStore + ?Sized> SettingsStore for Box<S> {
    fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        (**self).get_user_by_id(id)
    }

    fn get_tenant_by_id(&self, id: &str) -> Result<Option<Tenant>> {
        (**self).get_tenant_by_id(id)
    }

    fn get_library_by_id(&self, id: &str) -> Result<Option<Library>> {
        (**self).get_library_by_id(id)
    }

    fn add(&mut self, entity: Entity) -> Result<()> {
        (**self).add(entity)
    }

    fn delete(&mut self, entity: &Entity) -> Result<()> {
        (**self).delete(entity)
    }

    fn save(&mut self) -> Result<()> {
        (**self).save()
    }
}

/// A store shared between threads.
///
/// The lock is held for the whole closure, so a read-modify-write sequence
/// run inside one `with` call cannot interleave with another.
pub struct SharedSettingsStore<S: SettingsStore> {
    inner: Arc<Mutex<S>>,
}

impl<S: SettingsStore> Clone for SharedSettingsStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SettingsStore> SharedSettingsStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut S) -> T) -> T {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    /// Loads the canonical T1 / L1 / U1 graph into any store and saves it.
    pub fn seed_basic<S: SettingsStore + ?Sized>(store: &mut S) -> Result<()> {
        store.add(Tenant::new("T1").into())?;
        store.add(Library::new("L1", "T1").into())?;
        store.add(
            User::new("U1", "T1")
                .with_default_library("L1")
                .with_refresh_token("refresh-1")
                .into(),
        )?;
        store.save()
    }
}
