// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The signed-in user's sets and library.

use std::sync::Arc;

use tracing::info;

use super::SetEditor;
use crate::auth::require_user;
use crate::error::{EngineError, Result};
use crate::model::{LibraryEntry, ProgressionFields, SessionSnapshot, SetInfo};
use crate::services::{IdentityProvider, PersistenceService};

/// Set and library operations scoped to the current user
#[derive(Clone)]
pub struct SetCatalog {
    persistence: Arc<dyn PersistenceService>,
    identity: Arc<dyn IdentityProvider>,
}

impl SetCatalog {
    pub fn new(persistence: Arc<dyn PersistenceService>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            persistence,
            identity,
        }
    }

    /// Sets owned by the current user, newest first
    pub async fn list_sets(&self) -> Result<Vec<SetInfo>> {
        let user = require_user(self.identity.as_ref())?;
        self.persistence
            .list_sets(&user.id)
            .await
            .map_err(|e| EngineError::from_read("sets", e))
    }

    /// Create an empty set owned by the current user
    pub async fn create_set(&self, name: &str) -> Result<SetInfo> {
        let user = require_user(self.identity.as_ref())?;
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("set name is empty".into()));
        }

        let info = self
            .persistence
            .create_set(&user.id, name)
            .await
            .map_err(EngineError::RemoteWrite)?;
        info!(set_id = %info.id, name = %info.name, "created set");
        Ok(info)
    }

    /// Delete a set along with its progressions
    pub async fn delete_set(&self, set_id: &str) -> Result<()> {
        self.persistence
            .delete_set(set_id)
            .await
            .map_err(EngineError::RemoteWrite)?;
        info!(set_id, "deleted set");
        Ok(())
    }

    /// Open a set for editing
    pub async fn open(&self, set_id: &str) -> Result<SetEditor> {
        SetEditor::open(set_id, self.persistence.clone(), self.identity.clone()).await
    }

    /// Load a set straight into a performance snapshot
    pub async fn snapshot(&self, set_id: &str) -> Result<SessionSnapshot> {
        Ok(self.open(set_id).await?.snapshot())
    }

    /// Library entries of the current user, newest first
    pub async fn list_library(&self) -> Result<Vec<LibraryEntry>> {
        let user = require_user(self.identity.as_ref())?;
        self.persistence
            .list_library(&user.id)
            .await
            .map_err(|e| EngineError::from_read("library", e))
    }

    pub async fn add_to_library(&self, fields: ProgressionFields) -> Result<LibraryEntry> {
        let user = require_user(self.identity.as_ref())?;
        fields.validate()?;
        self.persistence
            .create_library_entry(&user.id, &fields)
            .await
            .map_err(EngineError::RemoteWrite)
    }

    pub async fn remove_from_library(&self, entry_id: &str) -> Result<()> {
        self.persistence
            .delete_library_entry(entry_id)
            .await
            .map_err(EngineError::RemoteWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::services::{MemoryStore, Op, UserIdentity};

    fn catalog() -> (Arc<MemoryStore>, AuthContext, SetCatalog) {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthContext::signed_in(UserIdentity::new("u1"));
        let catalog = SetCatalog::new(store.clone(), Arc::new(auth.clone()));
        (store, auth, catalog)
    }

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let (store, _, catalog) = catalog();
        store.insert_set("someone-else", "Theirs", Vec::<ProgressionFields>::new());
        catalog.create_set("First").await.unwrap();
        let second = catalog.create_set("  Second ").await.unwrap();
        assert_eq!(second.name, "Second");
        assert_eq!(second.owner_id, "u1");

        let names: Vec<String> = catalog
            .list_sets()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_create_requires_identity_and_name() {
        let (store, auth, catalog) = catalog();
        assert!(matches!(catalog.create_set(" ").await, Err(EngineError::Validation(_))));

        auth.sign_out();
        assert_eq!(catalog.create_set("Gig").await, Err(EngineError::Unauthenticated));
        assert_eq!(catalog.list_sets().await, Err(EngineError::Unauthenticated));
        assert_eq!(store.calls(Op::CreateSet), 0);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let (store, _, catalog) = catalog();
        let info = store.insert_set("u1", "Gig", vec![ProgressionFields::new("Am")]);
        catalog.delete_set(&info.id).await.unwrap();

        assert!(store.stored_progressions(&info.id).is_empty());
        assert!(matches!(catalog.open(&info.id).await, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_snapshot_follows_position_order() {
        let (store, _, catalog) = catalog();
        let info = store.insert_set(
            "u1",
            "Gig",
            vec![ProgressionFields::new("Am"), ProgressionFields::new("Dm")],
        );
        let snapshot = catalog.snapshot(&info.id).await.unwrap();
        assert_eq!(snapshot.set_name(), "Gig");
        assert_eq!(snapshot.get(1).unwrap().chords, "Dm");
    }

    #[tokio::test]
    async fn test_library_lifecycle() {
        let (_, _, catalog) = catalog();
        let entry = catalog
            .add_to_library(ProgressionFields::new("C G Am F"))
            .await
            .unwrap();
        assert_eq!(catalog.list_library().await.unwrap(), vec![entry.clone()]);

        catalog.remove_from_library(&entry.id).await.unwrap();
        assert!(catalog.list_library().await.unwrap().is_empty());
        assert!(catalog.remove_from_library(&entry.id).await.is_err());
    }
}
