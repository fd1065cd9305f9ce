// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Ordered progression list for one set, kept in step with the remote store.
//!
//! Create, update and delete wait for the remote call before touching local
//! state. Reorder is optimistic: the new order is published to subscribers
//! first and the set is reloaded if the batched position update fails.
//!
//! Every mutating method takes `&mut self`, so two mutations on the same
//! editor can never overlap.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::require_user;
use crate::error::{EngineError, Result};
use crate::model::{
    LibraryEntry, Progression, ProgressionFields, ProgressionPatch, SessionSnapshot, Set,
};
use crate::services::{IdentityProvider, PersistenceService, PositionUpdate};

/// Result of a reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// The remote store accepted the new order
    Applied,
    /// The remote store rejected it and the set was reloaded
    RolledBack,
}

/// Editor over one set's progressions
pub struct SetEditor {
    set: Set,
    persistence: Arc<dyn PersistenceService>,
    identity: Arc<dyn IdentityProvider>,
    view: watch::Sender<Vec<Progression>>,
}

impl SetEditor {
    /// Load a set and its progressions
    pub async fn open(
        set_id: &str,
        persistence: Arc<dyn PersistenceService>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        let set = fetch(persistence.as_ref(), set_id).await?;
        info!(set_id, count = set.len(), "opened set");
        let (view, _) = watch::channel(set.progressions().to_vec());
        Ok(Self {
            set,
            persistence,
            identity,
            view,
        })
    }

    /// Current local state of the set
    pub fn set(&self) -> &Set {
        &self.set
    }

    pub fn progressions(&self) -> &[Progression] {
        self.set.progressions()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Observe the order as it is rendered, optimistic changes included
    pub fn subscribe(&self) -> watch::Receiver<Vec<Progression>> {
        self.view.subscribe()
    }

    /// Take an immutable copy of the current order for a performance
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::of(&self.set)
    }

    /// Replace local state with the remote source of truth
    pub async fn reload(&mut self) -> Result<()> {
        let set = fetch(self.persistence.as_ref(), self.set.id()).await?;
        debug!(set_id = set.id(), count = set.len(), "reloaded set");
        self.set = set;
        self.publish();
        Ok(())
    }

    /// Append a progression once the remote store has assigned its identity
    pub async fn create(&mut self, fields: ProgressionFields) -> Result<Progression> {
        require_user(self.identity.as_ref())?;
        fields.validate()?;

        let position = self.set.len() as u32;
        let created = self
            .persistence
            .create_progression(self.set.id(), &fields, position)
            .await
            .map_err(EngineError::RemoteWrite)?;

        debug!(id = %created.id, position, "created progression");
        self.set.progressions_mut().push(created.clone());
        self.publish();
        Ok(created)
    }

    /// Apply a patch remotely, then replace the local entry
    pub async fn update(&mut self, id: &str, patch: ProgressionPatch) -> Result<Progression> {
        patch.validate()?;
        let index = self.index_of(id)?;

        let updated = self
            .persistence
            .update_progression(id, &patch)
            .await
            .map_err(EngineError::RemoteWrite)?;

        debug!(id, "updated progression");
        self.set.progressions_mut()[index] = updated.clone();
        self.publish();
        Ok(updated)
    }

    /// Delete remotely, then remove locally and close the position gap.
    ///
    /// The shifted positions are written in one batch; if that batch fails
    /// the set is reloaded. The delete itself has succeeded either way.
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        let index = self.index_of(id)?;

        self.persistence
            .delete_progression(id)
            .await
            .map_err(EngineError::RemoteWrite)?;

        self.set.progressions_mut().remove(index);
        let changed = self.renumber();
        debug!(id, shifted = changed.len(), "deleted progression");
        self.publish();

        if changed.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.write_positions(&changed).await {
            warn!(error = %e, "position update after delete failed, reloading");
            self.reload().await?;
        }
        Ok(())
    }

    /// Swap two neighbouring progressions.
    ///
    /// The swap is published before the remote call. On remote failure the
    /// whole set is reloaded and `RolledBack` is returned; if that reload
    /// fails too, its error is returned.
    pub async fn reorder(&mut self, from: usize, to: usize) -> Result<ReorderOutcome> {
        let len = self.set.len();
        if from >= len || to >= len || from.abs_diff(to) != 1 {
            return Err(EngineError::InvalidMove { from, to, len });
        }

        self.set.progressions_mut().swap(from, to);
        let changed = self.renumber();
        debug!(from, to, "applied reorder locally");
        self.publish();

        match self.write_positions(&changed).await {
            Ok(()) => Ok(ReorderOutcome::Applied),
            Err(e) => {
                warn!(from, to, error = %e, "reorder rejected, reloading set");
                self.reload().await?;
                Ok(ReorderOutcome::RolledBack)
            }
        }
    }

    /// Move the progression at `index` one place earlier
    pub async fn move_up(&mut self, index: usize) -> Result<ReorderOutcome> {
        match index.checked_sub(1) {
            Some(to) => self.reorder(index, to).await,
            None => Err(EngineError::InvalidMove {
                from: index,
                to: index,
                len: self.set.len(),
            }),
        }
    }

    /// Move the progression at `index` one place later
    pub async fn move_down(&mut self, index: usize) -> Result<ReorderOutcome> {
        match index.checked_add(1) {
            Some(to) => self.reorder(index, to).await,
            None => Err(EngineError::InvalidMove {
                from: index,
                to: index,
                len: self.set.len(),
            }),
        }
    }

    /// Append a copy of a library entry
    pub async fn copy_from_template(&mut self, template_id: &str) -> Result<Progression> {
        let entry = self
            .persistence
            .get_library_entry(template_id)
            .await
            .map_err(|e| EngineError::from_read(format!("library entry {}", template_id), e))?;
        self.create(entry.fields()).await
    }

    /// Rename the set; a blank or unchanged name does nothing.
    ///
    /// Returns whether a rename was sent.
    pub async fn rename(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() || name == self.set.name() {
            return Ok(false);
        }

        let info = self
            .persistence
            .rename_set(self.set.id(), name)
            .await
            .map_err(EngineError::RemoteWrite)?;
        info!(set_id = %info.id, name = %info.name, "renamed set");
        *self.set.info_mut() = info;
        Ok(true)
    }

    /// Copy a progression's fields into the user's library
    pub async fn save_to_library(&self, id: &str) -> Result<LibraryEntry> {
        let user = require_user(self.identity.as_ref())?;
        let index = self.index_of(id)?;
        let fields = ProgressionFields::from(&self.set.progressions()[index]);

        self.persistence
            .create_library_entry(&user.id, &fields)
            .await
            .map_err(EngineError::RemoteWrite)
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.set
            .progressions()
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("progression {}", id)))
    }

    /// Set every position to its index; returns the entries that moved
    fn renumber(&mut self) -> Vec<(String, u32)> {
        let mut changed = Vec::new();
        for (i, p) in self.set.progressions_mut().iter_mut().enumerate() {
            let position = i as u32;
            if p.position != position {
                p.position = position;
                changed.push((p.id.clone(), position));
            }
        }
        changed
    }

    async fn write_positions(&self, changed: &[(String, u32)]) -> Result<()> {
        let updates: Vec<PositionUpdate<'_>> = changed
            .iter()
            .map(|(id, position)| PositionUpdate {
                id: id.as_str(),
                position: *position,
            })
            .collect();
        self.persistence
            .update_positions(&updates)
            .await
            .map_err(EngineError::RemoteWrite)
    }

    fn publish(&self) {
        self.view.send_replace(self.set.progressions().to_vec());
    }
}

async fn fetch(persistence: &dyn PersistenceService, set_id: &str) -> Result<Set> {
    let what = || format!("set {}", set_id);
    let info = persistence
        .get_set(set_id)
        .await
        .map_err(|e| EngineError::from_read(what(), e))?;
    let progressions = persistence
        .list_progressions(set_id)
        .await
        .map_err(|e| EngineError::from_read(what(), e))?;
    Ok(Set::new(info, progressions))
}
