// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keyboard shortcuts for performance mode.
//!
//! Maps crossterm key events onto performance actions. The core controls
//! are the arrow keys for stepping and Esc to leave; the defaults add `n`
//! for the notes panel. Front ends add their own extras with
//! [`KeyboardController::add`].

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyModifiers};

use super::PerformanceAction;

/// A keyboard shortcut definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Shortcut {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Create a shortcut with no modifiers
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Create a shortcut with Ctrl modifier
    pub fn ctrl(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CONTROL)
    }
}

/// A keyboard binding (shortcut to action)
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub shortcut: Shortcut,
    pub action: PerformanceAction,
    /// Description for help display
    pub description: String,
}

impl KeyBinding {
    pub fn new(
        shortcut: Shortcut,
        action: PerformanceAction,
        description: impl Into<String>,
    ) -> Self {
        Self {
            shortcut,
            action,
            description: description.into(),
        }
    }
}

/// Keyboard controller with configurable bindings
#[derive(Debug, Clone)]
pub struct KeyboardController {
    bindings: HashMap<Shortcut, KeyBinding>,
}

impl KeyboardController {
    /// Create an empty keyboard controller
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Create a keyboard controller with default bindings
    pub fn with_defaults() -> Self {
        let mut controller = Self::new();
        controller.add(KeyBinding::new(
            Shortcut::key(KeyCode::Left),
            PerformanceAction::Previous,
            "Previous progression",
        ));
        controller.add(KeyBinding::new(
            Shortcut::key(KeyCode::Right),
            PerformanceAction::Next,
            "Next progression",
        ));
        controller.add(KeyBinding::new(
            Shortcut::key(KeyCode::Esc),
            PerformanceAction::Exit,
            "Leave performance mode",
        ));
        controller.add(KeyBinding::new(
            Shortcut::key(KeyCode::Char('n')),
            PerformanceAction::ToggleNotes,
            "Show or hide notes",
        ));
        controller
    }

    /// Add a key binding, replacing any binding for the same shortcut
    pub fn add(&mut self, binding: KeyBinding) {
        self.bindings.insert(binding.shortcut.clone(), binding);
    }

    /// Get action for a key event
    pub fn get_action(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<PerformanceAction> {
        self.bindings
            .get(&Shortcut::new(code, modifiers))
            .map(|b| b.action)
    }

    /// Bindings in action order, for help display
    pub fn bindings(&self) -> Vec<&KeyBinding> {
        let mut list: Vec<&KeyBinding> = self.bindings.values().collect();
        list.sort_by(|a, b| {
            a.action
                .cmp(&b.action)
                .then_with(|| a.shortcut.modifiers.bits().cmp(&b.shortcut.modifiers.bits()))
        });
        list
    }
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Format a shortcut for display
pub fn format_shortcut(shortcut: &Shortcut) -> String {
    let mut parts = Vec::new();

    if shortcut.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("Ctrl".to_string());
    }
    if shortcut.modifiers.contains(KeyModifiers::ALT) {
        parts.push("Alt".to_string());
    }
    if shortcut.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("Shift".to_string());
    }

    let key = match shortcut.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        _ => "?".to_string(),
    };

    parts.push(key);
    parts.join("+")
}
