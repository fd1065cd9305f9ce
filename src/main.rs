// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use setlist::audio::ResourceResolver;
use setlist::auth::AuthContext;
use setlist::config::{validate_set_file, EngineConfig, SetFile};
use setlist::control::{InputHub, KeyBinding, KeyboardController, PerformanceAction, Shortcut};
use setlist::editor::SetCatalog;
use setlist::perform::PerformanceSession;
use setlist::ui::{App, PerformanceView};
use setlist::services::{MemoryStorage, MemoryStore, UserIdentity};

const LOCAL_USER: &str = "local";

fn print_usage() {
    println!("SETLIST - Chord progression setlists for the stage");
    println!();
    println!("Usage: setlist [--config <file.toml>] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  --perform <set.yaml>    Step through a set in performance mode");
    println!("  --list <set.yaml>       Print a set in performance order");
    println!("  --help                  Show this help message");
    println!();
    println!("Options:");
    println!("  --config <file.toml>    Engine configuration (storage, performance, logging)");
}

fn init_logging(filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Services seeded from a set file, signed in as the local user
struct Workspace {
    catalog: SetCatalog,
    resolver: ResourceResolver,
    set_id: String,
}

impl Workspace {
    fn seed(file: &SetFile, config: &EngineConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(MemoryStorage::new());
        let auth = Arc::new(AuthContext::signed_in(UserIdentity::new(LOCAL_USER)));

        let info = file.seed(&store, LOCAL_USER);
        // Clips referenced by a local path are served from memory.
        for fields in &file.progressions {
            if let Some(reference) = &fields.audio {
                let path = Path::new(reference.as_str());
                if path.is_file() {
                    let bytes = std::fs::read(path)
                        .with_context(|| format!("Failed to read audio clip: {:?}", path))?;
                    storage.insert(reference.as_str(), bytes);
                }
            }
        }

        Ok(Self {
            catalog: SetCatalog::new(store, auth.clone()),
            resolver: ResourceResolver::with_config(storage, auth, &config.storage),
            set_id: info.id,
        })
    }
}

async fn list_set(path: &str, config: &EngineConfig) -> Result<()> {
    let file = validate_set_file(path)?;
    let workspace = Workspace::seed(&file, config)?;
    let editor = workspace.catalog.open(&workspace.set_id).await?;

    println!("{}", editor.set().name());
    println!();
    for p in editor.progressions() {
        let instrument = p.instrument.map(|i| format!("  [{}]", i)).unwrap_or_default();
        let audio = if p.audio.is_some() { "  ♪" } else { "" };
        println!("{:>3}. {}{}{}", p.position + 1, p.title(), instrument, audio);
        if p.name.is_some() {
            println!("     {}", p.chords);
        }
    }
    Ok(())
}

/// Default performance keys plus Ctrl+C, which raw mode no longer turns into an interrupt
fn terminal_keys() -> KeyboardController {
    let mut keys = KeyboardController::with_defaults();
    keys.add(KeyBinding::new(
        Shortcut::ctrl(KeyCode::Char('c')),
        PerformanceAction::Exit,
        "Leave performance mode",
    ));
    keys
}

/// Forward terminal key presses to the hub until `stop` is raised
fn spawn_key_reader(hub: InputHub, stop: Arc<AtomicBool>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !stop.load(Ordering::Relaxed) {
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        hub.dispatch_key(key.code, key.modifiers);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "terminal read failed");
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, "terminal poll failed");
                    break;
                }
            }
        }
    })
}

async fn perform_set(path: &str, config: &EngineConfig) -> Result<()> {
    let file = validate_set_file(path)?;
    let workspace = Workspace::seed(&file, config)?;

    let hub = InputHub::with_keyboard(terminal_keys());
    let mut session = PerformanceSession::new(workspace.resolver.clone(), &config.performance);
    session.load(&workspace.catalog, &workspace.set_id).await?;
    session.bind_input(&hub)?;
    info!(set = %file.set.name, "entering performance mode");

    let mut app = App::new().context("Failed to set up terminal")?;
    let stop = Arc::new(AtomicBool::new(false));
    let reader = spawn_key_reader(hub.clone(), stop.clone());
    // The tick also picks up audio resolutions and the stopwatch.
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        app.draw(&PerformanceView::from_session(&session, hub.keyboard()))?;
        tokio::select! {
            action = session.next_input() => match action {
                Some(action) => {
                    session.handle_action(action);
                }
                None => break,
            },
            _ = ticker.tick() => {}
        }
        if session.state().is_exited() {
            break;
        }
    }

    stop.store(true, Ordering::Relaxed);
    let _ = reader.await;
    drop(app);
    println!("Performance finished after {}", session.timer().formatted());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().collect();

    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .cloned()
                .ok_or_else(|| anyhow!("--config requires a file path"))?;
            args.drain(i..=i + 1);
            EngineConfig::load(&path)?
        }
        None => EngineConfig::default(),
    };
    init_logging(&config.logging.filter);

    if args.len() < 2 {
        println!("SETLIST - Chord progression setlists for the stage");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--perform" => {
            if args.len() < 3 {
                eprintln!("Error: --perform requires a set file");
                std::process::exit(1);
            }
            perform_set(&args[2], &config).await?;
        }
        "--list" => {
            if args.len() < 3 {
                eprintln!("Error: --list requires a set file");
                std::process::exit(1);
            }
            list_set(&args[2], &config).await?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
