// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio state for the currently displayed step.
//!
//! Every `begin` bumps a generation counter and hands out a token carrying
//! it. A result is committed only if its token still matches the slot's
//! generation, checked under the same lock that applies the result, so a
//! slow resolution for an earlier step can never overwrite a later one.

use std::sync::Arc;

use tokio::sync::watch;

use super::resolver::PlayableHandle;
use crate::error::Result;
use crate::model::AudioReference;

/// What the playback control for the current step should show
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AudioStatus {
    /// Step has no audio; no playback control
    #[default]
    None,
    /// Resolution in flight
    Loading(AudioReference),
    /// Ready to play
    Ready(PlayableHandle),
    /// Resolution failed for this step
    Failed { reference: AudioReference, message: String },
}

impl AudioStatus {
    /// Check if a playback control should be shown
    pub fn has_control(&self) -> bool {
        !matches!(self, AudioStatus::None)
    }

    /// Get the handle when ready
    pub fn handle(&self) -> Option<&PlayableHandle> {
        match self {
            AudioStatus::Ready(handle) => Some(handle),
            _ => None,
        }
    }
}

/// Generation captured when a resolution starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionToken {
    generation: u64,
}

impl ResolutionToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Default)]
struct SlotState {
    generation: u64,
    status: AudioStatus,
}

/// Shared, observable audio slot.
///
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct AudioSlot {
    state: Arc<watch::Sender<SlotState>>,
}

impl AudioSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::channel(SlotState::default()).0),
        }
    }

    /// Supersede any in-flight resolution and start loading `reference`
    pub fn begin(&self, reference: &AudioReference) -> ResolutionToken {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            s.status = AudioStatus::Loading(reference.clone());
            generation = s.generation;
        });
        ResolutionToken { generation }
    }

    /// Supersede any in-flight resolution and show no control
    pub fn clear(&self) {
        self.state.send_modify(|s| {
            s.generation += 1;
            s.status = AudioStatus::None;
        });
    }

    /// Apply a result if the token is still current; returns whether applied
    pub fn commit(&self, token: &ResolutionToken, result: Result<PlayableHandle>) -> bool {
        self.state.send_if_modified(|s| {
            if s.generation != token.generation {
                return false;
            }
            let reference = match &s.status {
                AudioStatus::Loading(reference) => reference.clone(),
                _ => return false,
            };
            s.status = match result {
                Ok(handle) => AudioStatus::Ready(handle),
                Err(e) => AudioStatus::Failed {
                    reference,
                    message: e.to_string(),
                },
            };
            true
        })
    }

    /// Check whether a token still matches the slot
    pub fn is_current(&self, token: &ResolutionToken) -> bool {
        self.state.borrow().generation == token.generation
    }

    /// Current status
    pub fn status(&self) -> AudioStatus {
        self.state.borrow().status.clone()
    }

    /// Wait until the status is no longer loading
    pub async fn settled(&self) -> AudioStatus {
        let mut rx = self.state.subscribe();
        // The sender lives in self, so the channel cannot close here.
        let status = match rx.wait_for(|s| !matches!(s.status, AudioStatus::Loading(_))).await {
            Ok(state) => state.status.clone(),
            Err(_) => self.status(),
        };
        status
    }
}

impl Default for AudioSlot {
    fn default() -> Self {
        Self::new()
    }
}
