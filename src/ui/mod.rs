// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal view for performance mode.
//!
//! Provides a ratatui-based stage view: header with position and
//! stopwatch, the current progression, its audio state and notes, and a
//! key help line.

mod header;

pub use header::HeaderWidget;

use std::io::{self, Stdout};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::audio::AudioStatus;
use crate::control::{format_shortcut, KeyboardController};
use crate::perform::{PerformanceSession, SessionState};

/// Audio state line under the current progression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioLine {
    None,
    Loading,
    Ready(String),
    Failed(String),
}

impl From<AudioStatus> for AudioLine {
    fn from(status: AudioStatus) -> Self {
        match status {
            AudioStatus::None => AudioLine::None,
            AudioStatus::Loading(_) => AudioLine::Loading,
            AudioStatus::Ready(handle) => AudioLine::Ready(handle.url().to_string()),
            AudioStatus::Failed { message, .. } => AudioLine::Failed(message),
        }
    }
}

/// The progression on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub name: Option<String>,
    pub chords: String,
    pub instrument: Option<String>,
    pub audio: AudioLine,
    /// Note lines, present only while the notes panel is open
    pub notes: Option<Vec<String>>,
    /// There are notes but the panel is closed
    pub notes_hidden: bool,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Main area of the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewBody {
    Loading,
    Empty,
    NotFound,
    Exited,
    Step(StepView),
}

/// Everything the terminal shows for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceView {
    pub set_name: String,
    pub position: Option<String>,
    pub elapsed: String,
    pub timer_running: bool,
    pub body: ViewBody,
    /// Shortcut and description pairs
    pub help: Vec<(String, String)>,
}

impl PerformanceView {
    /// Capture what a session currently shows
    pub fn from_session(session: &PerformanceSession, keyboard: &KeyboardController) -> Self {
        let body = match session.state() {
            SessionState::Loading => ViewBody::Loading,
            SessionState::Empty => ViewBody::Empty,
            SessionState::NotFound => ViewBody::NotFound,
            SessionState::Exited => ViewBody::Exited,
            SessionState::Ready { .. } => match session.current() {
                Some(p) => {
                    let visible = session.notes_visible();
                    ViewBody::Step(StepView {
                        name: p.name.clone(),
                        chords: p.chords.clone(),
                        instrument: p.instrument.map(|i| i.to_string()),
                        audio: session.audio_status().into(),
                        notes: p
                            .notes
                            .as_deref()
                            .filter(|_| visible)
                            .map(|n| n.lines().map(str::to_string).collect()),
                        notes_hidden: p.has_notes() && !visible,
                        has_previous: session.has_previous(),
                        has_next: session.has_next(),
                    })
                }
                None => ViewBody::Loading,
            },
        };

        Self {
            set_name: session
                .snapshot()
                .map(|s| s.set_name().to_string())
                .unwrap_or_default(),
            position: session.position_label(),
            elapsed: session.timer().formatted(),
            timer_running: session.timer().is_running(),
            body,
            help: keyboard
                .bindings()
                .iter()
                .map(|b| (format_shortcut(&b.shortcut), b.description.clone()))
                .collect(),
        }
    }
}

/// Terminal UI application
pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl App {
    /// Take over the terminal
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        Ok(Self { terminal })
    }

    /// Draw one frame
    pub fn draw(&mut self, view: &PerformanceView) -> io::Result<()> {
        self.terminal.draw(|frame| render(frame, view))?;
        Ok(())
    }

    fn cleanup(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Render a full frame
pub fn render(frame: &mut Frame, view: &PerformanceView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Progression
            Constraint::Length(1), // Help
        ])
        .split(frame.area());

    frame.render_widget(
        HeaderWidget::new(view).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );
    render_body(frame, chunks[1], &view.body);
    render_help(frame, chunks[2], &view.help);
}

fn render_body(frame: &mut Frame, area: Rect, body: &ViewBody) {
    let message = match body {
        ViewBody::Loading => "Loading...",
        ViewBody::Empty => "This set has no progressions.",
        ViewBody::NotFound => "Set not found.",
        ViewBody::Exited => "",
        ViewBody::Step(step) => return render_step(frame, area, step),
    };
    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(block),
        area,
    );
}

fn render_step(frame: &mut Frame, area: Rect, step: &StepView) {
    let nav_style = |enabled: bool| {
        if enabled {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };
    let title = Line::from(vec![
        Span::styled(" ← ", nav_style(step.has_previous)),
        Span::raw("|"),
        Span::styled(" → ", nav_style(step.has_next)),
    ]);
    let block = Block::default().borders(Borders::ALL).title(title);

    let mut lines = Vec::new();
    if let Some(name) = &step.name {
        lines.push(Line::from(Span::styled(
            name.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(Span::styled(
        step.chords.as_str(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )));
    if let Some(instrument) = &step.instrument {
        lines.push(Line::from(Span::styled(
            format!("[{}]", instrument),
            Style::default().fg(Color::Magenta),
        )));
    }

    lines.push(Line::from(""));
    match &step.audio {
        AudioLine::None => {}
        AudioLine::Loading => lines.push(Line::from(Span::styled(
            "Audio: loading...",
            Style::default().fg(Color::DarkGray),
        ))),
        AudioLine::Ready(url) => lines.push(Line::from(vec![
            Span::styled("Audio: ", Style::default().fg(Color::Green)),
            Span::raw(url.as_str()),
        ])),
        AudioLine::Failed(message) => lines.push(Line::from(Span::styled(
            format!("Audio unavailable: {}", message),
            Style::default().fg(Color::Red),
        ))),
    }

    if let Some(notes) = &step.notes {
        lines.push(Line::from(""));
        lines.extend(
            notes
                .iter()
                .map(|n| Line::from(Span::styled(n.as_str(), Style::default().fg(Color::Yellow)))),
        );
    } else if step.notes_hidden {
        lines.push(Line::from(Span::styled(
            "(notes hidden)",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_help(frame: &mut Frame, area: Rect, help: &[(String, String)]) {
    let text = help
        .iter()
        .map(|(key, description)| format!("{}: {}", key, description))
        .collect::<Vec<_>>()
        .join(" | ");
    frame.render_widget(
        Paragraph::new(Span::styled(format!(" {}", text), Style::default().fg(Color::DarkGray))),
        area,
    );
}
