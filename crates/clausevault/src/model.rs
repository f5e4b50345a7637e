//! # Domain Model: Tenants, Libraries and Users
//!
//! Three entity kinds make up the login-settings universe:
//!
//! ```text
//! Tenant ──owns──▶ Library
//!   ▲                 ▲
//!   └──── User ───────┘ (optional default library)
//! ```
//!
//! References between entities are plain identifiers (`TenantId`,
//! `DefaultLibraryId`). Stores resolve them on lookup and attach the
//! referenced values to the returned copy:
//!
//! - [`Tenant::libraries`] is filled with every Library whose `TenantId` matches.
//! - [`User::tenant`] and [`User::default_library`] are filled by
//!   `get_user_by_id`. They are never persisted.
//!
//! A reference that points nowhere is not an error; the attachment is simply
//! left empty.
//!
//! ## Entity Dispatch
//!
//! [`Entity`] is the closed set of things a store can add or delete. Stores
//! match on it exhaustively, so there is no "unknown kind" path.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tenant {
    pub tenant_id: String,
    /// Derived from the Library collection; ignored on `add`.
    #[serde(default)]
    pub libraries: Vec<Library>,
}

impl Tenant {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            libraries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Library {
    pub library_id: String,
    pub tenant_id: String,
}

impl Library {
    pub fn new(library_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            library_id: library_id.into(),
            tenant_id: tenant_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub user_id: String,
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_library_id: Option<String>,
    #[serde(default)]
    pub refresh_token: String,

    #[serde(skip)]
    pub tenant: Option<Tenant>,
    #[serde(skip)]
    pub default_library: Option<Library>,
}

impl User {
    pub fn new(user_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            ..Default::default()
        }
    }

    pub fn with_default_library(mut self, library_id: impl Into<String>) -> Self {
        self.default_library_id = Some(library_id.into());
        self
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = token.into();
        self
    }

    /// Drops resolved attachments, leaving only the persisted fields.
    pub fn detached(mut self) -> Self {
        self.tenant = None;
        self.default_library = None;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Tenant,
    Library,
    User,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Tenant => write!(f, "tenant"),
            EntityKind::Library => write!(f, "library"),
            EntityKind::User => write!(f, "user"),
        }
    }
}

/// Kind plus identifier: enough to find an entity in any store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Tenant(Tenant),
    Library(Library),
    User(User),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Tenant(_) => EntityKind::Tenant,
            Entity::Library(_) => EntityKind::Library,
            Entity::User(_) => EntityKind::User,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Tenant(t) => &t.tenant_id,
            Entity::Library(l) => &l.library_id,
            Entity::User(u) => &u.user_id,
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey {
            kind: self.kind(),
            id: self.id().to_string(),
        }
    }
}

impl From<Tenant> for Entity {
    fn from(tenant: Tenant) -> Self {
        Entity::Tenant(tenant)
    }
}

impl From<Library> for Entity {
    fn from(library: Library) -> Self {
        Entity::Library(library)
    }
}

impl From<User> for Entity {
    fn from(user: User) -> Self {
        Entity::User(user)
    }
}

/// The whole settings universe as persisted by the file backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SettingsDocument {
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub tenants: Vec<Tenant>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl SettingsDocument {
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty() && self.tenants.is_empty() && self.users.is_empty()
    }
}
