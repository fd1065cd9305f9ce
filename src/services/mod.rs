// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Contracts for the remote collaborators the engine talks to.
//!
//! This module provides:
//! - The persistence service (sets, progressions, library entries)
//! - The object storage service (audio blobs and signed URLs)
//! - The identity provider used for owner stamping
//! - In-memory implementations of the above for tests and the terminal front end

pub mod memory;

pub use memory::{Gate, MemoryStorage, MemoryStore, Op};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{LibraryEntry, Progression, ProgressionFields, ProgressionPatch, SetInfo};

/// Failure reported by a remote collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Record or object does not exist
    #[error("not found: {0}")]
    NotFound(String),
    /// Caller is not allowed to perform the operation
    #[error("unauthorized")]
    Unauthorized,
    /// Constraint violation on the remote side
    #[error("constraint violated: {0}")]
    Constraint(String),
    /// Network or transport failure
    #[error("transport error: {0}")]
    Transport(String),
}

/// New position for one progression in a batched reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionUpdate<'a> {
    pub id: &'a str,
    pub position: u32,
}

/// Record-level CRUD over sets, progressions and library entries
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Sets owned by a user, newest first
    async fn list_sets(&self, owner_id: &str) -> Result<Vec<SetInfo>, ServiceError>;

    async fn get_set(&self, set_id: &str) -> Result<SetInfo, ServiceError>;

    async fn create_set(&self, owner_id: &str, name: &str) -> Result<SetInfo, ServiceError>;

    async fn rename_set(&self, set_id: &str, name: &str) -> Result<SetInfo, ServiceError>;

    /// Delete a set and its progressions
    async fn delete_set(&self, set_id: &str) -> Result<(), ServiceError>;

    /// Progressions of a set ordered by position ascending
    async fn list_progressions(&self, set_id: &str) -> Result<Vec<Progression>, ServiceError>;

    /// Insert a progression; the service assigns its identity
    async fn create_progression(
        &self,
        set_id: &str,
        fields: &ProgressionFields,
        position: u32,
    ) -> Result<Progression, ServiceError>;

    async fn update_progression(
        &self,
        id: &str,
        patch: &ProgressionPatch,
    ) -> Result<Progression, ServiceError>;

    async fn delete_progression(&self, id: &str) -> Result<(), ServiceError>;

    /// Write several positions in one request
    async fn update_positions(&self, updates: &[PositionUpdate<'_>]) -> Result<(), ServiceError>;

    async fn list_library(&self, owner_id: &str) -> Result<Vec<LibraryEntry>, ServiceError>;

    async fn get_library_entry(&self, id: &str) -> Result<LibraryEntry, ServiceError>;

    async fn create_library_entry(
        &self,
        owner_id: &str,
        fields: &ProgressionFields,
    ) -> Result<LibraryEntry, ServiceError>;

    async fn delete_library_entry(&self, id: &str) -> Result<(), ServiceError>;
}

/// Options for storing a blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOptions {
    /// MIME type of the blob
    pub content_type: String,
    /// Cache lifetime hint for the stored object
    pub cache_control: Duration,
    /// Overwrite an existing object under the same key
    pub upsert: bool,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            cache_control: Duration::from_secs(3600),
            upsert: true,
        }
    }
}

/// Blob storage with time-limited signed URLs
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, key: &str, blob: Vec<u8>, options: &PutOptions) -> Result<(), ServiceError>;

    /// Issue a URL valid for `ttl`
    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, ServiceError>;

    async fn delete(&self, key: &str) -> Result<(), ServiceError>;
}

/// The authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserIdentity {
    pub id: String,
    pub email: Option<String>,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }
}

/// Source of the current user's identity
pub trait IdentityProvider: Send + Sync {
    /// Current user, if signed in
    fn current_user(&self) -> Option<UserIdentity>;
}
