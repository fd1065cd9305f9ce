// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Exchange audio references for playable handles, and store new clips.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::slot::AudioSlot;
use crate::auth::require_user;
use crate::config::StorageConfig;
use crate::error::{EngineError, Result};
use crate::model::AudioReference;
use crate::services::{IdentityProvider, ObjectStorage, PutOptions};

/// Time-limited playable URL for one audio reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableHandle {
    reference: AudioReference,
    url: String,
    issued_at: Instant,
    ttl: Duration,
}

impl PlayableHandle {
    /// Reference this handle was issued for
    pub fn reference(&self) -> &AudioReference {
        &self.reference
    }

    /// Signed URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Validity window
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Time left before the URL stops working
    pub fn expires_in(&self) -> Duration {
        self.ttl.saturating_sub(self.issued_at.elapsed())
    }

    /// Check if the URL has expired
    pub fn is_expired(&self) -> bool {
        self.issued_at.elapsed() >= self.ttl
    }
}

/// Raw audio bytes with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl AudioBlob {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// Concatenate captured chunks into one blob
    pub fn from_chunks(chunks: Vec<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self::new(chunks.concat(), content_type)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Resource resolver over an object storage collaborator.
///
/// Cheap to clone; clones share the same collaborators.
#[derive(Clone)]
pub struct ResourceResolver {
    storage: Arc<dyn ObjectStorage>,
    identity: Arc<dyn IdentityProvider>,
    ttl: Duration,
    cache_control: Duration,
}

impl ResourceResolver {
    /// Create a resolver with default storage settings
    pub fn new(storage: Arc<dyn ObjectStorage>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self::with_config(storage, identity, &StorageConfig::default())
    }

    /// Create a resolver with explicit storage settings
    pub fn with_config(
        storage: Arc<dyn ObjectStorage>,
        identity: Arc<dyn IdentityProvider>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            storage,
            identity,
            ttl: config.signed_url_ttl(),
            cache_control: config.cache_control(),
        }
    }

    /// Validity window requested for signed URLs
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Exchange a reference for a playable handle
    pub async fn resolve(&self, reference: &AudioReference) -> Result<PlayableHandle> {
        debug!(%reference, "resolving audio");
        let url = self
            .storage
            .signed_url(reference.as_str(), self.ttl)
            .await
            .map_err(|e| {
                warn!(%reference, error = %e, "audio resolution failed");
                EngineError::Resolution {
                    reference: reference.to_string(),
                    reason: e.to_string(),
                }
            })?;

        Ok(PlayableHandle {
            reference: reference.clone(),
            url,
            issued_at: Instant::now(),
            ttl: self.ttl,
        })
    }

    /// Resolve in the background and commit into `slot` unless superseded.
    ///
    /// The slot's generation is captured now; a later `begin` or `clear` on
    /// the slot makes this result stale and it is dropped. The task yields
    /// whether the result was applied.
    pub fn spawn_resolve(&self, reference: AudioReference, slot: &AudioSlot) -> JoinHandle<bool> {
        let token = slot.begin(&reference);
        let resolver = self.clone();
        let slot = slot.clone();
        tokio::spawn(async move {
            let result = resolver.resolve(&reference).await;
            let applied = slot.commit(&token, result);
            if !applied {
                debug!(%reference, "discarded stale audio resolution");
            }
            applied
        })
    }

    /// Store a clip under the current user and return its reference.
    ///
    /// Not idempotent: calling twice with different names stores two objects.
    pub async fn persist(&self, blob: AudioBlob, suggested_name: &str) -> Result<AudioReference> {
        let user = require_user(self.identity.as_ref())?;
        let key = format!("{}/{}", user.id, suggested_name);
        let options = PutOptions {
            content_type: blob.content_type.clone(),
            cache_control: self.cache_control,
            upsert: true,
        };

        debug!(%key, bytes = blob.len(), "uploading audio");
        self.storage
            .put(&key, blob.bytes, &options)
            .await
            .map_err(|e| {
                warn!(%key, error = %e, "audio upload failed");
                EngineError::Upload {
                    name: suggested_name.to_string(),
                    reason: e.to_string(),
                }
            })?;

        Ok(AudioReference::new(key))
    }

    /// Delete a stored clip
    pub async fn discard(&self, reference: &AudioReference) -> Result<()> {
        self.storage
            .delete(reference.as_str())
            .await
            .map_err(|e| EngineError::Resolution {
                reference: reference.to_string(),
                reason: e.to_string(),
            })
    }
}
