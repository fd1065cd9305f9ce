// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Live traversal of a set snapshot.
//!
//! The session loads a snapshot once, then steps through it one
//! progression at a time. Entering a step starts resolving its audio into
//! the session's slot; stepping again supersedes that resolution so a late
//! result for an old step is never shown.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::audio::{AudioSlot, AudioStatus, ResourceResolver};
use crate::config::PerformanceConfig;
use crate::control::{InputHub, InputSubscription, PerformanceAction};
use crate::editor::SetCatalog;
use crate::error::{EngineError, Result};
use crate::model::{Progression, SessionSnapshot};
use crate::timing::Stopwatch;

/// Where the session is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the snapshot
    Loading,
    /// Showing the progression at `index`
    Ready { index: usize },
    /// The set has no progressions
    Empty,
    /// The set does not exist
    NotFound,
    /// The performer left
    Exited,
}

impl SessionState {
    /// Current step, if one is shown
    pub fn index(&self) -> Option<usize> {
        match self {
            SessionState::Ready { index } => Some(*index),
            _ => None,
        }
    }

    pub fn is_exited(&self) -> bool {
        matches!(self, SessionState::Exited)
    }
}

/// One performance of one set
pub struct PerformanceSession {
    state: SessionState,
    snapshot: Option<SessionSnapshot>,
    notes_visible: bool,
    timer: Stopwatch,
    auto_start_timer: bool,
    resolver: ResourceResolver,
    slot: AudioSlot,
    in_flight: Vec<JoinHandle<bool>>,
    input: Option<InputSubscription>,
}

impl PerformanceSession {
    pub fn new(resolver: ResourceResolver, config: &PerformanceConfig) -> Self {
        Self {
            state: SessionState::Loading,
            snapshot: None,
            notes_visible: false,
            timer: Stopwatch::new(),
            auto_start_timer: config.auto_start_timer,
            resolver,
            slot: AudioSlot::new(),
            in_flight: Vec::new(),
            input: None,
        }
    }

    /// Load the set from the catalog and enter it.
    ///
    /// A missing set moves the session to `NotFound`. Any other failure is
    /// returned and the session stays `Loading`.
    pub async fn load(&mut self, catalog: &SetCatalog, set_id: &str) -> Result<()> {
        if self.state != SessionState::Loading {
            return Ok(());
        }
        match catalog.snapshot(set_id).await {
            Ok(snapshot) => {
                self.start(snapshot);
                Ok(())
            }
            Err(EngineError::NotFound(what)) => {
                info!(%what, "performance set not found");
                self.state = SessionState::NotFound;
                Ok(())
            }
            Err(e) => {
                warn!(set_id, error = %e, "failed to load performance set");
                Err(e)
            }
        }
    }

    /// Enter a snapshot taken elsewhere, such as from an open editor
    pub fn start(&mut self, snapshot: SessionSnapshot) {
        if self.state != SessionState::Loading {
            return;
        }
        info!(set = snapshot.set_name(), count = snapshot.len(), "performance started");
        let empty = snapshot.is_empty();
        self.snapshot = Some(snapshot);
        if self.auto_start_timer {
            self.timer.start();
        }
        if empty {
            self.state = SessionState::Empty;
        } else {
            self.enter(0);
        }
    }

    /// Bind performance input to this session.
    ///
    /// Binding twice from the same session keeps the first binding.
    pub fn bind_input(&mut self, hub: &InputHub) -> Result<()> {
        if self.input.is_some() {
            return Ok(());
        }
        if self.state.is_exited() {
            return Err(EngineError::Validation("session has exited".into()));
        }
        self.input = Some(hub.subscribe()?);
        Ok(())
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    /// Wait for the next bound input action
    pub async fn next_input(&mut self) -> Option<PerformanceAction> {
        match self.input.as_mut() {
            Some(input) => input.recv().await,
            None => None,
        }
    }

    /// Apply every queued input action; returns how many were applied
    pub fn pump_input(&mut self) -> usize {
        let mut applied = 0;
        while let Some(action) = self.input.as_mut().and_then(|i| i.try_recv()) {
            self.handle_action(action);
            applied += 1;
        }
        applied
    }

    /// Apply an action; returns whether anything changed
    pub fn handle_action(&mut self, action: PerformanceAction) -> bool {
        debug!(?action, "performance input");
        match action {
            PerformanceAction::Previous => self.previous(),
            PerformanceAction::Next => self.next(),
            PerformanceAction::ToggleNotes => self.toggle_notes(),
            PerformanceAction::Exit => self.exit(),
        }
    }

    /// Step forward; a no-op on the last progression
    pub fn next(&mut self) -> bool {
        match self.state {
            SessionState::Ready { index } if index + 1 < self.len() => {
                self.enter(index + 1);
                true
            }
            _ => false,
        }
    }

    /// Step back; a no-op on the first progression
    pub fn previous(&mut self) -> bool {
        match self.state {
            SessionState::Ready { index } if index > 0 => {
                self.enter(index - 1);
                true
            }
            _ => false,
        }
    }

    /// Leave the session, dropping any shown audio and the input binding
    pub fn exit(&mut self) -> bool {
        if self.state.is_exited() {
            return false;
        }
        self.state = SessionState::Exited;
        self.notes_visible = false;
        self.slot.clear();
        self.timer.pause();
        self.input = None;
        info!(elapsed = %self.timer.formatted(), "performance exited");
        true
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        self.snapshot.as_ref()
    }

    /// Number of progressions in the snapshot
    pub fn len(&self) -> usize {
        self.snapshot.as_ref().map_or(0, SessionSnapshot::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Progression on screen
    pub fn current(&self) -> Option<&Progression> {
        let index = self.state.index()?;
        self.snapshot.as_ref()?.get(index)
    }

    /// Header label such as `2 / 5`
    pub fn position_label(&self) -> Option<String> {
        self.state
            .index()
            .map(|index| format!("{} / {}", index + 1, self.len()))
    }

    pub fn has_previous(&self) -> bool {
        self.state.index().is_some_and(|i| i > 0)
    }

    pub fn has_next(&self) -> bool {
        self.state.index().is_some_and(|i| i + 1 < self.len())
    }

    /// Whether the notes panel is shown; only ever true when there are notes
    pub fn notes_visible(&self) -> bool {
        self.notes_visible && self.current().is_some_and(Progression::has_notes)
    }

    pub fn show_notes(&mut self) -> bool {
        if self.notes_visible || !self.current().is_some_and(Progression::has_notes) {
            return false;
        }
        self.notes_visible = true;
        true
    }

    pub fn hide_notes(&mut self) -> bool {
        std::mem::replace(&mut self.notes_visible, false)
    }

    pub fn toggle_notes(&mut self) -> bool {
        if self.notes_visible {
            self.hide_notes()
        } else {
            self.show_notes()
        }
    }

    pub fn timer(&self) -> &Stopwatch {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut Stopwatch {
        &mut self.timer
    }

    /// Audio state for the current step
    pub fn audio_status(&self) -> AudioStatus {
        self.slot.status()
    }

    pub fn audio_slot(&self) -> &AudioSlot {
        &self.slot
    }

    /// Wait for every in-flight resolution to finish.
    ///
    /// Returns how many of them were applied to the slot.
    pub async fn drain_resolutions(&mut self) -> usize {
        let mut applied = 0;
        for task in self.in_flight.drain(..) {
            if matches!(task.await, Ok(true)) {
                applied += 1;
            }
        }
        applied
    }

    fn enter(&mut self, index: usize) {
        self.state = SessionState::Ready { index };
        self.notes_visible = false;
        self.in_flight.retain(|task| !task.is_finished());

        let audio = self
            .snapshot
            .as_ref()
            .and_then(|s| s.get(index))
            .and_then(|p| p.audio.clone());
        debug!(index, has_audio = audio.is_some(), "entered step");
        match audio {
            Some(reference) => {
                let task = self.resolver.spawn_resolve(reference, &self.slot);
                self.in_flight.push(task);
            }
            None => self.slot.clear(),
        }
    }
}

impl Drop for PerformanceSession {
    fn drop(&mut self) {
        // Late results must not land in a slot someone else still holds.
        self.slot.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::auth::AuthContext;
    use crate::model::{AudioReference, ProgressionFields, Set, SetInfo};
    use crate::services::{MemoryStorage, MemoryStore, Op, ServiceError, UserIdentity};
    use crate::timing::ClockState;

    fn snapshot(fields: Vec<ProgressionFields>) -> SessionSnapshot {
        let info = SetInfo {
            id: "s1".into(),
            owner_id: "u1".into(),
            name: "Gig".into(),
        };
        let progressions = fields
            .into_iter()
            .enumerate()
            .map(|(i, f)| Progression::from_fields(format!("p{}", i), "s1", f, i as u32))
            .collect();
        SessionSnapshot::of(&Set::new(info, progressions))
    }

    fn plain(chords: &[&str]) -> SessionSnapshot {
        snapshot(chords.iter().map(|c| ProgressionFields::new(*c)).collect())
    }

    fn session_with(storage: Arc<MemoryStorage>) -> PerformanceSession {
        let resolver = ResourceResolver::new(storage, Arc::new(AuthContext::signed_out()));
        PerformanceSession::new(resolver, &PerformanceConfig::default())
    }

    fn session() -> PerformanceSession {
        session_with(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_starts_at_first_step() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Loading);
        s.start(plain(&["Am", "Dm", "G"]));
        assert_eq!(s.state(), SessionState::Ready { index: 0 });
        assert_eq!(s.current().unwrap().chords, "Am");
        assert_eq!(s.position_label().as_deref(), Some("1 / 3"));
        assert!(!s.has_previous());
        assert!(s.has_next());
        assert_eq!(s.timer().state(), ClockState::Running);
    }

    #[tokio::test]
    async fn test_navigation_bounds() {
        let mut s = session();
        s.start(plain(&["Am", "Dm", "G"]));

        assert!(!s.previous());
        assert_eq!(s.state().index(), Some(0));

        assert!(s.next());
        assert!(s.next());
        assert_eq!(s.state().index(), Some(2));
        assert!(!s.next());
        assert_eq!(s.state().index(), Some(2));
        assert!(!s.has_next());

        assert!(s.previous());
        assert_eq!(s.current().unwrap().chords, "Dm");
    }

    #[tokio::test]
    async fn test_navigation_keeps_timer_running() {
        let mut s = session();
        s.start(plain(&["Am", "Dm"]));
        s.next();
        s.previous();
        assert!(s.timer().is_running());
    }

    #[tokio::test]
    async fn test_timer_not_started_when_disabled() {
        let resolver = ResourceResolver::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(AuthContext::signed_out()),
        );
        let config = PerformanceConfig {
            auto_start_timer: false,
        };
        let mut s = PerformanceSession::new(resolver, &config);
        s.start(plain(&["Am"]));
        assert_eq!(s.timer().state(), ClockState::Stopped);
    }

    #[tokio::test]
    async fn test_empty_snapshot() {
        let mut s = session();
        s.start(plain(&[]));
        assert_eq!(s.state(), SessionState::Empty);
        assert!(!s.next());
        assert!(!s.previous());
        assert_eq!(s.position_label(), None);
        assert!(s.exit());
        assert_eq!(s.state(), SessionState::Exited);
    }

    #[tokio::test]
    async fn test_load_missing_set() {
        let store = Arc::new(MemoryStore::new());
        let catalog = SetCatalog::new(store, Arc::new(AuthContext::signed_out()));
        let mut s = session();
        s.load(&catalog, "missing").await.unwrap();
        assert_eq!(s.state(), SessionState::NotFound);
        assert!(!s.next());
    }

    #[tokio::test]
    async fn test_load_failure_stays_loading() {
        let store = Arc::new(MemoryStore::new());
        let info = store.insert_set("u1", "Gig", vec![ProgressionFields::new("Am")]);
        store.fail(Op::GetSet, 1, ServiceError::Transport("down".into()));
        let catalog = SetCatalog::new(store, Arc::new(AuthContext::signed_in(UserIdentity::new("u1"))));

        let mut s = session();
        assert!(s.load(&catalog, &info.id).await.is_err());
        assert_eq!(s.state(), SessionState::Loading);

        s.load(&catalog, &info.id).await.unwrap();
        assert_eq!(s.state(), SessionState::Ready { index: 0 });
    }

    #[tokio::test]
    async fn test_notes_hidden_on_step() {
        let mut s = session();
        s.start(snapshot(vec![
            ProgressionFields::new("Am").with_notes("capo 2"),
            ProgressionFields::new("Dm").with_notes("slow"),
            ProgressionFields::new("G"),
        ]));

        assert!(s.toggle_notes());
        assert!(s.notes_visible());
        s.next();
        assert!(!s.notes_visible());

        s.show_notes();
        s.previous();
        assert!(!s.notes_visible());

        s.next();
        s.next();
        assert!(!s.show_notes());
        assert!(!s.notes_visible());
    }

    #[tokio::test]
    async fn test_input_bound_once_and_released_on_exit() {
        let hub = InputHub::new();
        let mut s = session();
        s.start(plain(&["Am", "Dm", "G"]));
        s.bind_input(&hub).unwrap();
        s.bind_input(&hub).unwrap();
        assert!(hub.is_bound());

        let mut other = session();
        assert_eq!(other.bind_input(&hub), Err(EngineError::InputBound));

        hub.dispatch_key(crossterm::event::KeyCode::Esc, crossterm::event::KeyModifiers::NONE);
        assert_eq!(s.pump_input(), 1);
        assert!(s.state().is_exited());
        assert!(!hub.is_bound());
        assert!(other.bind_input(&hub).is_ok());
    }

    #[tokio::test]
    async fn test_drop_releases_input() {
        let hub = InputHub::new();
        {
            let mut s = session();
            s.bind_input(&hub).unwrap();
        }
        assert!(!hub.is_bound());
    }

    #[tokio::test]
    async fn test_step_without_audio_shows_no_control() {
        let mut s = session();
        s.start(plain(&["Am"]));
        assert_eq!(s.audio_status(), AudioStatus::None);
        assert!(!s.audio_status().has_control());
    }

    #[tokio::test]
    async fn test_audio_resolved_on_entry() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("u1/a.webm", vec![1]);
        let mut s = session_with(storage);
        s.start(snapshot(vec![
            ProgressionFields::new("Am").with_audio(AudioReference::new("u1/a.webm"))
        ]));

        assert_eq!(s.drain_resolutions().await, 1);
        let status = s.audio_status();
        let handle = status.handle().unwrap();
        assert_eq!(handle.reference().as_str(), "u1/a.webm");
        assert_eq!(handle.ttl(), Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_resolution_failure_is_scoped_to_step() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("u1/b.webm", vec![2]);
        let mut s = session_with(storage);
        s.start(snapshot(vec![
            ProgressionFields::new("Am").with_audio(AudioReference::new("u1/missing.webm")),
            ProgressionFields::new("Dm").with_audio(AudioReference::new("u1/b.webm")),
        ]));

        s.drain_resolutions().await;
        assert!(matches!(s.audio_status(), AudioStatus::Failed { .. }));

        assert!(s.next());
        s.drain_resolutions().await;
        assert!(s.audio_status().handle().is_some());
    }

    #[tokio::test]
    async fn test_stale_resolution_is_dropped() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("u1/a.webm", vec![1]);
        storage.insert("u1/b.webm", vec![2]);
        let gate = storage.hold_key("u1/a.webm");
        let mut s = session_with(storage.clone());
        s.start(snapshot(vec![
            ProgressionFields::new("Am").with_audio(AudioReference::new("u1/a.webm")),
            ProgressionFields::new("Dm").with_audio(AudioReference::new("u1/b.webm")),
        ]));
        gate.arrived(1).await;

        s.next();
        let settled = s.audio_slot().settled().await;
        assert_eq!(settled.handle().unwrap().reference().as_str(), "u1/b.webm");

        storage.release_key("u1/a.webm");
        // Only the newer resolution lands.
        assert_eq!(s.drain_resolutions().await, 1);
        assert_eq!(
            s.audio_status().handle().unwrap().reference().as_str(),
            "u1/b.webm"
        );
    }

    #[tokio::test]
    async fn test_exit_drops_pending_audio() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("u1/a.webm", vec![1]);
        let gate = storage.hold_key("u1/a.webm");
        let mut s = session_with(storage.clone());
        s.start(snapshot(vec![
            ProgressionFields::new("Am").with_audio(AudioReference::new("u1/a.webm"))
        ]));
        gate.arrived(1).await;

        s.exit();
        storage.release_key("u1/a.webm");
        assert_eq!(s.drain_resolutions().await, 0);
        assert_eq!(s.audio_status(), AudioStatus::None);
        assert!(!s.exit());
    }
}
