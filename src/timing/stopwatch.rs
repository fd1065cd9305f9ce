// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session stopwatch.
//!
//! Elapsed time is always derived from the clock, never from a tick
//! counter, so a render loop that stalls does not make the stopwatch lose
//! time.
//!
//! The clock is `Instant`, which is monotonic: adjusting the system time
//! never moves the stopwatch backwards or forwards. The trade-off is that
//! on Linux `Instant` does not advance while the machine itself is
//! suspended, so a laptop closed mid-set resumes with that gap missing.
//! A wall-clock reading would count the gap but would also jump with every
//! time correction.

use std::time::{Duration, Instant};

/// Stopwatch state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Elapsed-time counter with start/pause/reset
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    state: ClockState,
    /// Time accrued before the current run
    accrued: Duration,
    /// When the current run started
    resumed_at: Option<Instant>,
}

impl Stopwatch {
    /// Create a stopped stopwatch at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopwatch that is already running
    pub fn started() -> Self {
        let mut watch = Self::new();
        watch.start();
        watch
    }

    /// Get the current state
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Check if counting
    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Start or resume, keeping time already accrued
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Start or resume as of `now`
    pub fn start_at(&mut self, now: Instant) {
        if self.is_running() {
            return;
        }
        self.resumed_at = Some(now);
        self.state = ClockState::Running;
    }

    /// Freeze elapsed time
    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    /// Freeze elapsed time as of `now`
    pub fn pause_at(&mut self, now: Instant) {
        if !self.is_running() {
            return;
        }
        self.accrued = self.elapsed_at(now);
        self.resumed_at = None;
        self.state = ClockState::Paused;
    }

    /// Zero elapsed time and stop
    pub fn reset(&mut self) {
        self.accrued = Duration::ZERO;
        self.resumed_at = None;
        self.state = ClockState::Stopped;
    }

    /// Elapsed time now
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    /// Elapsed time as of `now`
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match self.resumed_at {
            Some(resumed) => self.accrued + now.saturating_duration_since(resumed),
            None => self.accrued,
        }
    }

    /// Elapsed whole seconds
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed().as_secs()
    }

    /// Elapsed time rendered as `mm:ss`
    pub fn formatted(&self) -> String {
        format_mm_ss(self.elapsed_secs())
    }

    /// Elapsed time as of `now` rendered as `mm:ss`
    pub fn formatted_at(&self, now: Instant) -> String {
        format_mm_ss(self.elapsed_at(now).as_secs())
    }
}

/// Render seconds as zero-padded `mm:ss`; minutes grow past 99
pub fn format_mm_ss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
