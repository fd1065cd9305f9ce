// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for SETLIST
//!
//! These tests drive the public API against the in-memory services.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers};

use setlist::audio::{AudioStatus, ResourceResolver};
use setlist::auth::AuthContext;
use setlist::config::{EngineConfig, PerformanceConfig, SetFile};
use setlist::control::InputHub;
use setlist::editor::{ReorderOutcome, SetCatalog, SetEditor};
use setlist::model::{AudioReference, ProgressionFields};
use setlist::perform::{PerformanceSession, SessionState};
use setlist::recording::{AudioRecorder, CaptureDevice, CaptureError, RecordingState};
use setlist::services::{MemoryStorage, MemoryStore, Op, ServiceError, UserIdentity};
use setlist::EngineError;

struct Fixture {
    store: Arc<MemoryStore>,
    storage: Arc<MemoryStorage>,
    auth: AuthContext,
    catalog: SetCatalog,
    resolver: ResourceResolver,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let storage = Arc::new(MemoryStorage::new());
    let auth = AuthContext::signed_in(UserIdentity::new("u1"));
    let catalog = SetCatalog::new(store.clone(), Arc::new(auth.clone()));
    let resolver = ResourceResolver::new(storage.clone(), Arc::new(auth.clone()));
    Fixture {
        store,
        storage,
        auth,
        catalog,
        resolver,
    }
}

fn chords(editor: &SetEditor) -> Vec<String> {
    editor.progressions().iter().map(|p| p.chords.clone()).collect()
}

fn press(hub: &InputHub, code: KeyCode) {
    hub.dispatch_key(code, KeyModifiers::NONE);
}

/// Reorder is visible before the remote store acknowledges it
#[tokio::test]
async fn test_reorder_visible_before_acknowledgement() {
    let f = fixture();
    let info = f.store.insert_set(
        "u1",
        "Friday",
        ["Am", "Dm", "G"].map(ProgressionFields::new),
    );
    let mut editor = f.catalog.open(&info.id).await.unwrap();
    let view = editor.subscribe();
    let gate = f.store.hold(Op::UpdatePositions);

    let observe = async {
        gate.arrived(1).await;
        let seen: Vec<(String, u32)> = view
            .borrow()
            .iter()
            .map(|p| (p.chords.clone(), p.position))
            .collect();
        // Not yet acknowledged remotely.
        let stored: Vec<String> = f
            .store
            .stored_progressions(&info.id)
            .into_iter()
            .map(|p| p.chords)
            .collect();
        gate.open();
        (seen, stored)
    };
    let (outcome, (seen, stored)) = tokio::join!(editor.reorder(0, 1), observe);

    assert_eq!(outcome.unwrap(), ReorderOutcome::Applied);
    assert_eq!(
        seen,
        vec![("Dm".to_string(), 0), ("Am".to_string(), 1), ("G".to_string(), 2)]
    );
    assert_eq!(stored, vec!["Am", "Dm", "G"]);
    assert_eq!(chords(&editor), vec!["Dm", "Am", "G"]);
}

/// A rejected reorder leaves exactly what a fresh load would show
#[tokio::test]
async fn test_rejected_reorder_matches_fresh_load() {
    let f = fixture();
    let info = f.store.insert_set(
        "u1",
        "Friday",
        ["Am", "Dm", "G", "C"].map(ProgressionFields::new),
    );
    let mut editor = f.catalog.open(&info.id).await.unwrap();
    f.store.fail(Op::UpdatePositions, 1, ServiceError::Transport("offline".into()));

    let outcome = editor.reorder(2, 3).await.unwrap();
    assert_eq!(outcome, ReorderOutcome::RolledBack);

    let fresh = f.catalog.open(&info.id).await.unwrap();
    assert_eq!(editor.progressions(), fresh.progressions());
    assert_eq!(*editor.subscribe().borrow(), fresh.progressions().to_vec());
}

/// Editing then performing: the performance sees the order at entry only
#[tokio::test]
async fn test_performance_snapshot_is_frozen() {
    let f = fixture();
    let set = f.catalog.create_set("Saturday").await.unwrap();
    let mut editor = f.catalog.open(&set.id).await.unwrap();
    for c in ["Am", "Dm", "G"] {
        editor.create(ProgressionFields::new(c)).await.unwrap();
    }
    assert!(editor.set().positions_dense());

    let mut session = PerformanceSession::new(f.resolver.clone(), &PerformanceConfig::default());
    session.start(editor.snapshot());

    editor.move_up(2).await.unwrap();
    assert_eq!(chords(&editor), vec!["Am", "G", "Dm"]);

    session.next();
    assert_eq!(session.current().unwrap().chords, "Dm");
}

/// Right arrow twice lands on the last step; a third press does nothing
#[tokio::test]
async fn test_keyboard_traversal() {
    let f = fixture();
    let info = f.store.insert_set(
        "u1",
        "Friday",
        ["Am", "Dm", "G"].map(ProgressionFields::new),
    );
    let hub = InputHub::new();
    let mut session = PerformanceSession::new(f.resolver.clone(), &PerformanceConfig::default());
    session.load(&f.catalog, &info.id).await.unwrap();
    session.bind_input(&hub).unwrap();

    press(&hub, KeyCode::Right);
    press(&hub, KeyCode::Right);
    session.pump_input();
    assert_eq!(session.state(), SessionState::Ready { index: 2 });
    assert_eq!(session.position_label().as_deref(), Some("3 / 3"));

    press(&hub, KeyCode::Right);
    session.pump_input();
    assert_eq!(session.state(), SessionState::Ready { index: 2 });

    press(&hub, KeyCode::Left);
    assert_eq!(session.next_input().await, Some(setlist::control::PerformanceAction::Previous));

    press(&hub, KeyCode::Esc);
    session.pump_input();
    assert_eq!(session.state(), SessionState::Exited);
    assert!(!hub.is_bound());
}

/// A slow resolution for an earlier step never replaces the current one
#[tokio::test]
async fn test_stale_audio_never_surfaces() {
    let f = fixture();
    f.storage.insert("u1/one.webm", vec![1]);
    f.storage.insert("u1/two.webm", vec![2]);
    let info = f.store.insert_set(
        "u1",
        "Friday",
        [
            ProgressionFields::new("Am").with_audio(AudioReference::new("u1/one.webm")),
            ProgressionFields::new("Dm").with_audio(AudioReference::new("u1/two.webm")),
        ],
    );
    let gate = f.storage.hold_key("u1/one.webm");

    let mut session = PerformanceSession::new(f.resolver.clone(), &PerformanceConfig::default());
    session.load(&f.catalog, &info.id).await.unwrap();
    gate.arrived(1).await;
    assert!(matches!(session.audio_status(), AudioStatus::Loading(_)));

    session.next();
    session.audio_slot().settled().await;
    f.storage.release_key("u1/one.webm");
    session.drain_resolutions().await;

    let status = session.audio_status();
    assert_eq!(status.handle().unwrap().reference().as_str(), "u1/two.webm");
}

/// Recording a clip and attaching it to a progression
#[tokio::test]
async fn test_record_and_attach_clip() {
    struct Mic;
    impl CaptureDevice for Mic {
        fn open(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }
        fn close(&mut self) {}
    }

    let f = fixture();
    let info = f.store.insert_set("u1", "Friday", [ProgressionFields::new("Am")]);
    let mut editor = f.catalog.open(&info.id).await.unwrap();
    let config = EngineConfig::default();
    let mut recorder = AudioRecorder::new(Box::new(Mic), f.resolver.clone(), config.recording);

    recorder.start().unwrap();
    recorder.push_chunk(vec![1, 2]);
    recorder.push_chunk(vec![3]);
    let reference = recorder.stop().await.unwrap();
    assert_eq!(recorder.state(), RecordingState::Idle);
    assert!(reference.as_str().starts_with("u1/recording_"));
    assert_eq!(f.storage.object(reference.as_str()), Some(vec![1, 2, 3]));

    let id = editor.progressions()[0].id.clone();
    let patch = setlist::model::ProgressionPatch::default().audio(Some(reference.clone()));
    editor.update(&id, patch).await.unwrap();

    let mut session = PerformanceSession::new(f.resolver.clone(), &PerformanceConfig::default());
    session.start(editor.snapshot());
    session.drain_resolutions().await;
    let handle = session.audio_status().handle().cloned().unwrap();
    assert_eq!(handle.reference(), &reference);
    assert!(!handle.is_expired());
    assert_eq!(handle.ttl(), Duration::from_secs(3600));
}

/// Owner-stamped writes fail fast once signed out
#[tokio::test]
async fn test_signed_out_writes_fail_fast() {
    let f = fixture();
    let info = f.store.insert_set("u1", "Friday", [ProgressionFields::new("Am")]);
    let mut editor = f.catalog.open(&info.id).await.unwrap();
    f.auth.sign_out();

    assert_eq!(
        editor.create(ProgressionFields::new("C")).await,
        Err(EngineError::Unauthenticated)
    );
    assert_eq!(f.catalog.create_set("Gig").await, Err(EngineError::Unauthenticated));
    assert_eq!(f.store.calls(Op::CreateProgression), 0);
    assert_eq!(f.store.calls(Op::CreateSet), 0);
}

/// A set file seeds a set and its library, in file order
#[tokio::test]
async fn test_set_file_seeds_store() {
    let yaml = r#"
set:
  name: Sunday
progressions:
  - chords: "C G Am F"
    name: Verse
    instrument: Piano
  - chords: "F G C"
    notes: "build"
library:
  - chords: "Am F C G"
"#;
    let file = SetFile::from_yaml(yaml).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sunday.yaml");
    file.save(&path).unwrap();
    let file = SetFile::load(&path).unwrap();

    let f = fixture();
    let info = file.seed(&f.store, "u1");
    let mut editor = f.catalog.open(&info.id).await.unwrap();
    assert_eq!(editor.set().name(), "Sunday");
    assert_eq!(chords(&editor), vec!["C G Am F", "F G C"]);

    let library = f.catalog.list_library().await.unwrap();
    assert_eq!(library.len(), 1);
    editor.copy_from_template(&library[0].id).await.unwrap();
    assert_eq!(chords(&editor), vec!["C G Am F", "F G C", "Am F C G"]);
}
