// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Clip recording.
//!
//! Captures audio chunks from an input device and uploads them as one clip
//! when recording stops.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::audio::{AudioBlob, ResourceResolver};
use crate::config::RecordingConfig;
use crate::error::{EngineError, Result};
use crate::model::AudioReference;

/// Recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    /// Not recording
    #[default]
    Idle,
    /// Capturing chunks
    Recording,
    /// Captured clip is being stored
    Uploading,
}

impl RecordingState {
    fn describe(&self) -> &'static str {
        match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Uploading => "uploading",
        }
    }
}

/// Input device failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("no capture device available")]
    NoDevice,
    #[error("access denied: {0}")]
    Denied(String),
}

/// An audio input that can be opened and closed
pub trait CaptureDevice: Send {
    /// Acquire the input
    fn open(&mut self) -> std::result::Result<(), CaptureError>;

    /// Release the input
    fn close(&mut self);
}

/// Records clips and stores them through the resource resolver
pub struct AudioRecorder {
    state: watch::Sender<RecordingState>,
    device: Box<dyn CaptureDevice>,
    chunks: Vec<Vec<u8>>,
    resolver: ResourceResolver,
    config: RecordingConfig,
    last_error: Option<EngineError>,
}

impl AudioRecorder {
    /// Create an idle recorder
    pub fn new(device: Box<dyn CaptureDevice>, resolver: ResourceResolver, config: RecordingConfig) -> Self {
        Self {
            state: watch::channel(RecordingState::Idle).0,
            device,
            chunks: Vec::new(),
            resolver,
            config,
            last_error: None,
        }
    }

    /// Get the current state
    pub fn state(&self) -> RecordingState {
        *self.state.borrow()
    }

    /// Observe state changes, including while an upload is in flight
    pub fn watch_state(&self) -> watch::Receiver<RecordingState> {
        self.state.subscribe()
    }

    /// Error from the last start or upload, cleared on the next start
    pub fn last_error(&self) -> Option<&EngineError> {
        self.last_error.as_ref()
    }

    /// Number of chunks captured so far
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Open the device and begin capturing
    pub fn start(&mut self) -> Result<()> {
        let state = self.state();
        if state != RecordingState::Idle {
            return Err(EngineError::RecorderBusy(state.describe()));
        }
        self.last_error = None;

        if let Err(e) = self.device.open() {
            warn!(error = %e, "capture device unavailable");
            let err = EngineError::PermissionDenied(e.to_string());
            self.last_error = Some(err.clone());
            return Err(err);
        }

        self.chunks.clear();
        self.state.send_replace(RecordingState::Recording);
        info!("recording started");
        Ok(())
    }

    /// Append a captured chunk; empty chunks and chunks outside a recording are ignored
    pub fn push_chunk(&mut self, chunk: Vec<u8>) {
        if self.state() == RecordingState::Recording && !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    /// Stop capturing and upload the clip.
    ///
    /// Always returns to idle; on failure the error is also kept in
    /// `last_error`.
    pub async fn stop(&mut self) -> Result<AudioReference> {
        let state = self.state();
        if state != RecordingState::Recording {
            return Err(EngineError::RecorderBusy(state.describe()));
        }
        self.device.close();

        let blob = AudioBlob::from_chunks(std::mem::take(&mut self.chunks), self.config.content_type.clone());
        let name = self.config.file_name(unix_millis());
        self.state.send_replace(RecordingState::Uploading);
        info!(%name, bytes = blob.len(), "recording stopped, uploading");

        let result = self.resolver.persist(blob, &name).await;
        self.state.send_replace(RecordingState::Idle);

        match &result {
            Ok(reference) => info!(%reference, "recording stored"),
            Err(e) => self.last_error = Some(e.clone()),
        }
        result
    }

    /// Abandon the current recording without uploading
    pub fn cancel(&mut self) {
        if self.state() == RecordingState::Recording {
            self.device.close();
            self.chunks.clear();
            self.state.send_replace(RecordingState::Idle);
        }
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use crate::auth::AuthContext;
    use crate::services::{MemoryStorage, Op, ServiceError, UserIdentity};

    /// Device that records whether it is open
    struct FakeDevice {
        available: bool,
        open: Arc<AtomicBool>,
    }

    impl CaptureDevice for FakeDevice {
        fn open(&mut self) -> std::result::Result<(), CaptureError> {
            if !self.available {
                return Err(CaptureError::Denied("microphone blocked".into()));
            }
            self.open.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn close(&mut self) {
            self.open.store(false, Ordering::SeqCst);
        }
    }

    fn recorder(storage: &Arc<MemoryStorage>, available: bool) -> (AudioRecorder, Arc<AtomicBool>) {
        let open = Arc::new(AtomicBool::new(false));
        let device = FakeDevice { available, open: Arc::clone(&open) };
        let auth = AuthContext::signed_in(UserIdentity::new("u1"));
        let resolver = ResourceResolver::new(storage.clone(), Arc::new(auth));
        (AudioRecorder::new(Box::new(device), resolver, RecordingConfig::default()), open)
    }

    #[tokio::test]
    async fn test_record_and_upload() {
        let storage = Arc::new(MemoryStorage::new());
        let (mut rec, open) = recorder(&storage, true);

        rec.start().unwrap();
        assert_eq!(rec.state(), RecordingState::Recording);
        assert!(open.load(Ordering::SeqCst));

        rec.push_chunk(vec![1, 2]);
        rec.push_chunk(Vec::new());
        rec.push_chunk(vec![3]);
        assert_eq!(rec.chunk_count(), 2);

        let reference = rec.stop().await.unwrap();
        assert_eq!(rec.state(), RecordingState::Idle);
        assert!(!open.load(Ordering::SeqCst));
        assert!(reference.as_str().starts_with("u1/recording_"));
        assert!(reference.as_str().ends_with(".webm"));
        assert_eq!(storage.object(reference.as_str()), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let storage = Arc::new(MemoryStorage::new());
        let (mut rec, _) = recorder(&storage, false);

        let err = rec.start().unwrap_err();
        assert!(matches!(err, EngineError::PermissionDenied(_)));
        assert_eq!(rec.state(), RecordingState::Idle);
        assert!(rec.last_error().is_some());
    }

    #[tokio::test]
    async fn test_upload_failure_returns_to_idle() {
        let storage = Arc::new(MemoryStorage::new());
        storage.fail(Op::Put, 1, ServiceError::Transport("offline".into()));
        let (mut rec, _) = recorder(&storage, true);

        rec.start().unwrap();
        rec.push_chunk(vec![9]);
        let err = rec.stop().await.unwrap_err();

        assert!(matches!(err, EngineError::Upload { .. }));
        assert_eq!(rec.state(), RecordingState::Idle);
        assert_eq!(rec.last_error(), Some(&err));

        // A new take clears the flag
        rec.start().unwrap();
        assert!(rec.last_error().is_none());
    }

    #[tokio::test]
    async fn test_uploading_state_is_observable() {
        let storage = Arc::new(MemoryStorage::new());
        let gate = storage.hold(Op::Put);
        let (mut rec, _) = recorder(&storage, true);
        let state = rec.watch_state();

        rec.start().unwrap();
        rec.push_chunk(vec![1]);

        let (result, ()) = tokio::join!(rec.stop(), async {
            gate.arrived(1).await;
            assert_eq!(*state.borrow(), RecordingState::Uploading);
            storage.release(Op::Put);
        });
        assert!(result.is_ok());
        assert_eq!(*state.borrow(), RecordingState::Idle);
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let storage = Arc::new(MemoryStorage::new());
        let (mut rec, _) = recorder(&storage, true);

        assert_eq!(rec.stop().await, Err(EngineError::RecorderBusy("idle")));

        rec.start().unwrap();
        assert_eq!(rec.start(), Err(EngineError::RecorderBusy("recording")));

        rec.cancel();
        assert_eq!(rec.state(), RecordingState::Idle);
        assert_eq!(rec.chunk_count(), 0);
        assert!(storage.is_empty());
    }
}
