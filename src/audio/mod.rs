// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio resolution for attached clips.
//!
//! This module provides:
//! - The resource resolver (reference to signed, time-limited handle)
//! - Upload of captured clips into object storage
//! - The per-step audio slot with stale-result rejection

pub mod resolver;
pub mod slot;

pub use resolver::{AudioBlob, PlayableHandle, ResourceResolver};
pub use slot::{AudioSlot, AudioStatus, ResolutionToken};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::AuthContext;
    use crate::model::AudioReference;
    use crate::services::MemoryStorage;

    #[tokio::test]
    async fn test_slower_resolution_cannot_overwrite_newer() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("u1/one.webm", vec![1]);
        storage.insert("u1/two.webm", vec![2]);
        let resolver = ResourceResolver::new(storage.clone(), Arc::new(AuthContext::signed_out()));
        let slot = AudioSlot::new();

        let gate = storage.hold_key("u1/one.webm");
        let first = resolver.spawn_resolve(AudioReference::new("u1/one.webm"), &slot);
        gate.arrived(1).await;

        let second = resolver.spawn_resolve(AudioReference::new("u1/two.webm"), &slot);
        assert!(second.await.unwrap());

        storage.release_key("u1/one.webm");
        assert!(!first.await.unwrap());

        let status = slot.status();
        assert_eq!(status.handle().unwrap().reference().as_str(), "u1/two.webm");
    }

    #[test]
    fn test_blob_from_chunks() {
        let blob = AudioBlob::from_chunks(vec![vec![1], vec![], vec![2, 3]], "audio/webm");
        assert_eq!(blob.bytes, vec![1, 2, 3]);
        assert_eq!(blob.len(), 3);
    }
}
