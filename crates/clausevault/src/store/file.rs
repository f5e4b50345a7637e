use super::SettingsStore;
use crate::error::Result;
use crate::model::{Entity, Library, SettingsDocument, Tenant, User};
use crate::writer::{FileSink, FsSink, RetryingFileWriter, WriteMode};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Identifier → position lookups over the document's collections.
///
/// Built with first-wins semantics, so duplicates resolve the same way a
/// front-to-back scan would.
#[derive(Debug, Default)]
struct DocumentIndex {
    tenants: HashMap<String, usize>,
    libraries: HashMap<String, usize>,
    users: HashMap<String, usize>,
    libraries_by_tenant: HashMap<String, Vec<usize>>,
}

impl DocumentIndex {
    fn build(doc: &SettingsDocument) -> Self {
        let mut index = Self::default();
        for (pos, tenant) in doc.tenants.iter().enumerate() {
            index.tenants.entry(tenant.tenant_id.clone()).or_insert(pos);
        }
        for (pos, library) in doc.libraries.iter().enumerate() {
            index.libraries.entry(library.library_id.clone()).or_insert(pos);
            index
                .libraries_by_tenant
                .entry(library.tenant_id.clone())
                .or_default()
                .push(pos);
        }
        for (pos, user) in doc.users.iter().enumerate() {
            index.users.entry(user.user_id.clone()).or_insert(pos);
        }
        index
    }
}

/// Settings store backed by a single JSON document.
pub struct FileSettingsStore<S: FileSink = FsSink> {
    path: PathBuf,
    document: SettingsDocument,
    index: DocumentIndex,
    writer: RetryingFileWriter<S>,
}

impl<S: FileSink> FileSettingsStore<S> {
    /// Loads the document at `path`.
    ///
    /// A missing, unreadable or malformed file yields an empty document; the
    /// file only appears on disk after the first `save`.
    pub fn open(path: impl Into<PathBuf>, writer: RetryingFileWriter<S>) -> Self {
        let path = path.into();
        let document = load_document(&path);
        let mut store = Self {
            path,
            document,
            index: DocumentIndex::default(),
            writer,
        };
        store.reindex();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &SettingsDocument {
        &self.document
    }

    fn reindex(&mut self) {
        self.index = DocumentIndex::build(&self.document);
        let libraries: Vec<Vec<Library>> = self
            .document
            .tenants
            .iter()
            .map(|t| self.libraries_of(&t.tenant_id))
            .collect();
        for (tenant, libs) in self.document.tenants.iter_mut().zip(libraries) {
            tenant.libraries = libs;
        }
    }

    fn libraries_of(&self, tenant_id: &str) -> Vec<Library> {
        self.index
            .libraries_by_tenant
            .get(tenant_id)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&pos| self.document.libraries[pos].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn tenant(&self, id: &str) -> Option<Tenant> {
        let pos = *self.index.tenants.get(id)?;
        Some(self.document.tenants[pos].clone())
    }

    fn library(&self, id: &str) -> Option<Library> {
        let pos = *self.index.libraries.get(id)?;
        Some(self.document.libraries[pos].clone())
    }
}

fn load_document(path: &Path) -> SettingsDocument {
    if !path.exists() {
        tracing::debug!("no settings file at {}, starting empty", path.display());
        return SettingsDocument::default();
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("cannot read {}: {}; starting empty", path.display(), e);
            return SettingsDocument::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("cannot parse {}: {}; starting empty", path.display(), e);
            SettingsDocument::default()
        }
    }
}

impl<S: FileSink> SettingsStore for FileSettingsStore<S> {
    fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let Some(&pos) = self.index.users.get(id) else {
            return Ok(None);
        };
        let mut user = self.document.users[pos].clone();
        user.tenant = self.tenant(&user.tenant_id);
        user.default_library = user
            .default_library_id
            .as_deref()
            .and_then(|lib_id| self.library(lib_id));
        Ok(Some(user))
    }

    fn get_tenant_by_id(&self, id: &str) -> Result<Option<Tenant>> {
        Ok(self.tenant(id))
    }

    fn get_library_by_id(&self, id: &str) -> Result<Option<Library>> {
        Ok(self.library(id))
    }

    fn add(&mut self, entity: Entity) -> Result<()> {
        match entity {
            Entity::Tenant(tenant) => self.document.tenants.push(tenant),
            Entity::Library(library) => self.document.libraries.push(library),
            Entity::User(user) => self.document.users.push(user.detached()),
        }
        self.reindex();
        Ok(())
    }

    fn delete(&mut self, entity: &Entity) -> Result<()> {
        let id = entity.id();
        let removed = match entity {
            Entity::Tenant(_) => self.index.tenants.get(id).copied().map(|pos| {
                self.document.tenants.remove(pos);
            }),
            Entity::Library(_) => self.index.libraries.get(id).copied().map(|pos| {
                self.document.libraries.remove(pos);
            }),
            Entity::User(_) => self.index.users.get(id).copied().map(|pos| {
                self.document.users.remove(pos);
            }),
        };
        if removed.is_some() {
            self.reindex();
        } else {
            tracing::debug!("delete: no {} in settings document", entity.key());
        }
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        self.reindex();
        let content = serde_json::to_string_pretty(&self.document)?;
        let attempts = self.writer.write(&self.path, &content, WriteMode::Overwrite)?;
        tracing::debug!(
            "saved settings to {} ({} attempt(s))",
            self.path.display(),
            attempts
        );
        Ok(())
    }
}
