// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Routes key events to the one performance session listening for them.
//!
//! At most one subscription exists at a time. Dropping the subscription
//! unbinds it, so a session that exits or is dropped never leaves a stale
//! listener behind.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;
use tracing::debug;

use super::{KeyboardController, PerformanceAction};
use crate::error::{EngineError, Result};

#[derive(Debug, Default)]
struct Binding {
    next_id: u64,
    current: Option<(u64, mpsc::UnboundedSender<PerformanceAction>)>,
}

fn lock(binding: &Mutex<Binding>) -> MutexGuard<'_, Binding> {
    binding.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Source of performance input with a single subscriber
#[derive(Debug, Clone, Default)]
pub struct InputHub {
    binding: Arc<Mutex<Binding>>,
    keyboard: Arc<KeyboardController>,
}

impl InputHub {
    /// Create a hub with the default key bindings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyboard(keyboard: KeyboardController) -> Self {
        Self {
            binding: Arc::default(),
            keyboard: Arc::new(keyboard),
        }
    }

    pub fn keyboard(&self) -> &KeyboardController {
        &self.keyboard
    }

    /// Bind the listener; fails if one is already bound
    pub fn subscribe(&self) -> Result<InputSubscription> {
        let mut binding = lock(&self.binding);
        if binding.current.is_some() {
            return Err(EngineError::InputBound);
        }
        binding.next_id += 1;
        let id = binding.next_id;
        let (tx, rx) = mpsc::unbounded_channel();
        binding.current = Some((id, tx));
        debug!(id, "input bound");

        Ok(InputSubscription {
            id,
            binding: Arc::clone(&self.binding),
            rx,
        })
    }

    /// Check whether a listener is bound
    pub fn is_bound(&self) -> bool {
        lock(&self.binding).current.is_some()
    }

    /// Deliver an action; returns false when nobody is listening
    pub fn dispatch(&self, action: PerformanceAction) -> bool {
        match &lock(&self.binding).current {
            Some((_, tx)) => tx.send(action).is_ok(),
            None => false,
        }
    }

    /// Map a key event and deliver the resulting action.
    ///
    /// Returns the action when the key is bound and a listener received it.
    pub fn dispatch_key(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<PerformanceAction> {
        let action = self.keyboard.get_action(code, modifiers)?;
        self.dispatch(action).then_some(action)
    }
}

/// The bound end of an [`InputHub`]; unbinds on drop
#[derive(Debug)]
pub struct InputSubscription {
    id: u64,
    binding: Arc<Mutex<Binding>>,
    rx: mpsc::UnboundedReceiver<PerformanceAction>,
}

impl InputSubscription {
    /// Wait for the next action
    pub async fn recv(&mut self) -> Option<PerformanceAction> {
        self.rx.recv().await
    }

    /// Take the next queued action without waiting
    pub fn try_recv(&mut self) -> Option<PerformanceAction> {
        self.rx.try_recv().ok()
    }
}

impl Drop for InputSubscription {
    fn drop(&mut self) {
        let mut binding = lock(&self.binding);
        if matches!(&binding.current, Some((id, _)) if *id == self.id) {
            binding.current = None;
            debug!(id = self.id, "input unbound");
        }
    }
}
