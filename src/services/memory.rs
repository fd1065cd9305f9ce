// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! In-memory persistence and object storage.
//!
//! Both services can be told to fail or to hold an operation until a gate
//! is opened, which is how tests observe optimistic state and stale
//! resolutions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use super::{ObjectStorage, PersistenceService, PositionUpdate, PutOptions, ServiceError};
use crate::model::{LibraryEntry, Progression, ProgressionFields, ProgressionPatch, SetInfo};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Remote operation, used to target injected faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListSets,
    GetSet,
    CreateSet,
    RenameSet,
    DeleteSet,
    ListProgressions,
    CreateProgression,
    UpdateProgression,
    DeleteProgression,
    UpdatePositions,
    ListLibrary,
    GetLibraryEntry,
    CreateLibraryEntry,
    DeleteLibraryEntry,
    Put,
    SignedUrl,
    DeleteObject,
}

/// A latch that holds callers until opened
#[derive(Debug, Clone)]
pub struct Gate {
    open: Arc<watch::Sender<bool>>,
    arrivals: Arc<watch::Sender<usize>>,
}

impl Gate {
    /// Create a closed gate
    pub fn new() -> Self {
        Self {
            open: Arc::new(watch::channel(false).0),
            arrivals: Arc::new(watch::channel(0).0),
        }
    }

    /// Release every current and future waiter
    pub fn open(&self) {
        self.open.send_replace(true);
    }

    /// Wait until at least `count` callers have reached the gate
    pub async fn arrived(&self, count: usize) {
        let mut rx = self.arrivals.subscribe();
        // The sender lives in self, so the channel cannot close here.
        let _ = rx.wait_for(|n| *n >= count).await;
    }

    async fn pass(&self) {
        self.arrivals.send_modify(|n| *n += 1);
        let mut rx = self.open.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

/// Call counting, fault injection and gating shared by both services
#[derive(Debug, Default)]
struct Faults {
    calls: Mutex<HashMap<Op, usize>>,
    failures: Mutex<HashMap<Op, (usize, ServiceError)>>,
    gates: Mutex<HashMap<Op, Gate>>,
}

impl Faults {
    async fn enter(&self, op: Op) -> Result<(), ServiceError> {
        *lock(&self.calls).entry(op).or_insert(0) += 1;

        let gate = lock(&self.gates).get(&op).cloned();
        if let Some(gate) = gate {
            gate.pass().await;
        }

        let mut failures = lock(&self.failures);
        if let Some((remaining, err)) = failures.get_mut(&op) {
            let err = err.clone();
            *remaining -= 1;
            if *remaining == 0 {
                failures.remove(&op);
            }
            debug!(?op, %err, "injected failure");
            return Err(err);
        }
        Ok(())
    }

    fn fail(&self, op: Op, times: usize, err: ServiceError) {
        if times > 0 {
            lock(&self.failures).insert(op, (times, err));
        }
    }

    fn hold(&self, op: Op) -> Gate {
        lock(&self.gates).entry(op).or_default().clone()
    }

    fn release(&self, op: Op) {
        if let Some(gate) = lock(&self.gates).remove(&op) {
            gate.open();
        }
    }

    fn calls(&self, op: Op) -> usize {
        lock(&self.calls).get(&op).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct Records {
    /// Sets with their creation sequence number
    sets: Vec<(u64, SetInfo)>,
    progressions: HashMap<String, Progression>,
    library: HashMap<String, LibraryEntry>,
    library_order: Vec<String>,
    next_seq: u64,
}

impl Records {
    fn set(&self, set_id: &str) -> Option<&SetInfo> {
        self.sets.iter().map(|(_, s)| s).find(|s| s.id == set_id)
    }

    fn ordered_progressions(&self, set_id: &str) -> Vec<Progression> {
        let mut list: Vec<Progression> = self
            .progressions
            .values()
            .filter(|p| p.set_id == set_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        list
    }
}

/// In-memory persistence service
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
    faults: Faults,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a set directly, positions follow the given order
    pub fn insert_set(
        &self,
        owner_id: &str,
        name: &str,
        progressions: impl IntoIterator<Item = ProgressionFields>,
    ) -> SetInfo {
        let mut records = lock(&self.records);
        let info = SetInfo {
            id: new_id(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
        };
        let seq = records.next_seq;
        records.next_seq += 1;
        records.sets.push((seq, info.clone()));

        for (i, fields) in progressions.into_iter().enumerate() {
            let p = Progression::from_fields(new_id(), info.id.clone(), fields, i as u32);
            records.progressions.insert(p.id.clone(), p);
        }
        info
    }

    /// Seed a library entry directly
    pub fn insert_library_entry(&self, owner_id: &str, fields: ProgressionFields) -> LibraryEntry {
        let mut records = lock(&self.records);
        let entry = LibraryEntry::from_fields(new_id(), owner_id, fields);
        records.library_order.push(entry.id.clone());
        records.library.insert(entry.id.clone(), entry.clone());
        entry
    }

    /// Overwrite a stored position, as another device would
    pub fn set_position(&self, id: &str, position: u32) {
        if let Some(p) = lock(&self.records).progressions.get_mut(id) {
            p.position = position;
        }
    }

    /// Stored progressions of a set, ordered by position
    pub fn stored_progressions(&self, set_id: &str) -> Vec<Progression> {
        lock(&self.records).ordered_progressions(set_id)
    }

    /// Fail the next `times` calls of an operation
    pub fn fail(&self, op: Op, times: usize, err: ServiceError) {
        self.faults.fail(op, times, err);
    }

    /// Hold calls of an operation until the returned gate is opened
    pub fn hold(&self, op: Op) -> Gate {
        self.faults.hold(op)
    }

    /// Open and remove the gate for an operation
    pub fn release(&self, op: Op) {
        self.faults.release(op);
    }

    /// Number of calls made for an operation
    pub fn calls(&self, op: Op) -> usize {
        self.faults.calls(op)
    }
}

#[async_trait]
impl PersistenceService for MemoryStore {
    async fn list_sets(&self, owner_id: &str) -> Result<Vec<SetInfo>, ServiceError> {
        self.faults.enter(Op::ListSets).await?;
        let records = lock(&self.records);
        let mut sets: Vec<&(u64, SetInfo)> =
            records.sets.iter().filter(|(_, s)| s.owner_id == owner_id).collect();
        sets.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(sets.into_iter().map(|(_, s)| s.clone()).collect())
    }

    async fn get_set(&self, set_id: &str) -> Result<SetInfo, ServiceError> {
        self.faults.enter(Op::GetSet).await?;
        lock(&self.records)
            .set(set_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("sets/{}", set_id)))
    }

    async fn create_set(&self, owner_id: &str, name: &str) -> Result<SetInfo, ServiceError> {
        self.faults.enter(Op::CreateSet).await?;
        Ok(self.insert_set(owner_id, name, Vec::<ProgressionFields>::new()))
    }

    async fn rename_set(&self, set_id: &str, name: &str) -> Result<SetInfo, ServiceError> {
        self.faults.enter(Op::RenameSet).await?;
        let mut records = lock(&self.records);
        let (_, info) = records
            .sets
            .iter_mut()
            .find(|(_, s)| s.id == set_id)
            .ok_or_else(|| ServiceError::NotFound(format!("sets/{}", set_id)))?;
        info.name = name.to_string();
        Ok(info.clone())
    }

    async fn delete_set(&self, set_id: &str) -> Result<(), ServiceError> {
        self.faults.enter(Op::DeleteSet).await?;
        let mut records = lock(&self.records);
        let before = records.sets.len();
        records.sets.retain(|(_, s)| s.id != set_id);
        if records.sets.len() == before {
            return Err(ServiceError::NotFound(format!("sets/{}", set_id)));
        }
        records.progressions.retain(|_, p| p.set_id != set_id);
        Ok(())
    }

    async fn list_progressions(&self, set_id: &str) -> Result<Vec<Progression>, ServiceError> {
        self.faults.enter(Op::ListProgressions).await?;
        Ok(lock(&self.records).ordered_progressions(set_id))
    }

    async fn create_progression(
        &self,
        set_id: &str,
        fields: &ProgressionFields,
        position: u32,
    ) -> Result<Progression, ServiceError> {
        self.faults.enter(Op::CreateProgression).await?;
        let mut records = lock(&self.records);
        if records.set(set_id).is_none() {
            return Err(ServiceError::Constraint(format!("no set {}", set_id)));
        }
        if fields.chords.trim().is_empty() {
            return Err(ServiceError::Constraint("chords is required".into()));
        }
        let p = Progression::from_fields(new_id(), set_id, fields.clone(), position);
        records.progressions.insert(p.id.clone(), p.clone());
        Ok(p)
    }

    async fn update_progression(
        &self,
        id: &str,
        patch: &ProgressionPatch,
    ) -> Result<Progression, ServiceError> {
        self.faults.enter(Op::UpdateProgression).await?;
        let mut records = lock(&self.records);
        let p = records
            .progressions
            .get_mut(id)
            .ok_or_else(|| ServiceError::NotFound(format!("progressions/{}", id)))?;
        patch.apply(p);
        Ok(p.clone())
    }

    async fn delete_progression(&self, id: &str) -> Result<(), ServiceError> {
        self.faults.enter(Op::DeleteProgression).await?;
        lock(&self.records)
            .progressions
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("progressions/{}", id)))
    }

    async fn update_positions(&self, updates: &[PositionUpdate<'_>]) -> Result<(), ServiceError> {
        self.faults.enter(Op::UpdatePositions).await?;
        let mut records = lock(&self.records);
        if let Some(missing) = updates.iter().find(|u| !records.progressions.contains_key(u.id)) {
            return Err(ServiceError::NotFound(format!("progressions/{}", missing.id)));
        }
        for update in updates {
            if let Some(p) = records.progressions.get_mut(update.id) {
                p.position = update.position;
            }
        }
        Ok(())
    }

    async fn list_library(&self, owner_id: &str) -> Result<Vec<LibraryEntry>, ServiceError> {
        self.faults.enter(Op::ListLibrary).await?;
        let records = lock(&self.records);
        Ok(records
            .library_order
            .iter()
            .rev()
            .filter_map(|id| records.library.get(id))
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_library_entry(&self, id: &str) -> Result<LibraryEntry, ServiceError> {
        self.faults.enter(Op::GetLibraryEntry).await?;
        lock(&self.records)
            .library
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("library/{}", id)))
    }

    async fn create_library_entry(
        &self,
        owner_id: &str,
        fields: &ProgressionFields,
    ) -> Result<LibraryEntry, ServiceError> {
        self.faults.enter(Op::CreateLibraryEntry).await?;
        Ok(self.insert_library_entry(owner_id, fields.clone()))
    }

    async fn delete_library_entry(&self, id: &str) -> Result<(), ServiceError> {
        self.faults.enter(Op::DeleteLibraryEntry).await?;
        let mut records = lock(&self.records);
        records.library_order.retain(|e| e != id);
        records
            .library
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("library/{}", id)))
    }
}

/// In-memory object storage issuing `memory://` URLs
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, (Vec<u8>, PutOptions)>>,
    key_gates: Mutex<HashMap<String, Gate>>,
    faults: Faults,
}

impl MemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object directly
    pub fn insert(&self, key: &str, blob: Vec<u8>) {
        lock(&self.objects).insert(key.to_string(), (blob, PutOptions::default()));
    }

    /// Get a stored object's bytes
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.objects).get(key).map(|(blob, _)| blob.clone())
    }

    /// Get the options an object was stored with
    pub fn object_options(&self, key: &str) -> Option<PutOptions> {
        lock(&self.objects).get(key).map(|(_, options)| options.clone())
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.objects).is_empty()
    }

    /// Hold URL issuance for one key until the gate is opened
    pub fn hold_key(&self, key: &str) -> Gate {
        lock(&self.key_gates).entry(key.to_string()).or_default().clone()
    }

    /// Open and remove the gate for a key
    pub fn release_key(&self, key: &str) {
        if let Some(gate) = lock(&self.key_gates).remove(key) {
            gate.open();
        }
    }

    /// Fail the next `times` calls of an operation
    pub fn fail(&self, op: Op, times: usize, err: ServiceError) {
        self.faults.fail(op, times, err);
    }

    /// Hold calls of an operation until the returned gate is opened
    pub fn hold(&self, op: Op) -> Gate {
        self.faults.hold(op)
    }

    /// Open and remove the gate for an operation
    pub fn release(&self, op: Op) {
        self.faults.release(op);
    }

    /// Number of calls made for an operation
    pub fn calls(&self, op: Op) -> usize {
        self.faults.calls(op)
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(&self, key: &str, blob: Vec<u8>, options: &PutOptions) -> Result<(), ServiceError> {
        self.faults.enter(Op::Put).await?;
        let mut objects = lock(&self.objects);
        if !options.upsert && objects.contains_key(key) {
            return Err(ServiceError::Constraint(format!("object {} exists", key)));
        }
        objects.insert(key.to_string(), (blob, options.clone()));
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, ServiceError> {
        let gate = lock(&self.key_gates).get(key).cloned();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        self.faults.enter(Op::SignedUrl).await?;
        if !lock(&self.objects).contains_key(key) {
            return Err(ServiceError::NotFound(format!("objects/{}", key)));
        }
        Ok(format!("memory://{}?ttl={}&token={}", key, ttl.as_secs(), Uuid::new_v4().simple()))
    }

    async fn delete(&self, key: &str) -> Result<(), ServiceError> {
        self.faults.enter(Op::DeleteObject).await?;
        lock(&self.objects)
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("objects/{}", key)))
    }
}
