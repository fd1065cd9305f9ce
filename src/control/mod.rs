// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Input for performance mode.
//!
//! This module provides:
//! - Keyboard shortcut handling
//! - A single-subscriber hub that delivers actions to the active session

pub mod input;
pub mod keyboard;

pub use input::{InputHub, InputSubscription};
pub use keyboard::{format_shortcut, KeyBinding, KeyboardController, Shortcut};

/// Action a performer can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PerformanceAction {
    /// Step back one progression
    Previous,
    /// Step forward one progression
    Next,
    /// Show or hide the notes of the current progression
    ToggleNotes,
    /// Leave performance mode
    Exit,
}

impl PerformanceAction {
    /// Check if this action moves through the set
    pub fn is_navigation(&self) -> bool {
        matches!(self, PerformanceAction::Previous | PerformanceAction::Next)
    }
}
