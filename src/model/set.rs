// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sets and the immutable snapshot a performance runs over.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Progression;

/// Set record without its progressions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInfo {
    pub id: String,
    pub owner_id: String,
    pub name: String,
}

/// A set with its progressions ordered by position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Set {
    info: SetInfo,
    progressions: Vec<Progression>,
}

impl Set {
    /// Assemble a set, sorting progressions by position
    pub fn new(info: SetInfo, mut progressions: Vec<Progression>) -> Self {
        progressions.sort_by_key(|p| p.position);
        Self { info, progressions }
    }

    /// Get the set record
    pub fn info(&self) -> &SetInfo {
        &self.info
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Get progressions in order
    pub fn progressions(&self) -> &[Progression] {
        &self.progressions
    }

    /// Number of progressions
    pub fn len(&self) -> usize {
        self.progressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progressions.is_empty()
    }

    /// Check that positions are exactly `0..n-1` in order
    pub fn positions_dense(&self) -> bool {
        self.progressions
            .iter()
            .enumerate()
            .all(|(i, p)| p.position as usize == i)
    }

    pub(crate) fn info_mut(&mut self) -> &mut SetInfo {
        &mut self.info
    }

    pub(crate) fn progressions_mut(&mut self) -> &mut Vec<Progression> {
        &mut self.progressions
    }
}

/// Immutable ordered copy of a set taken when a performance starts.
///
/// Cloning is cheap; every clone shares the same progressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    set_id: String,
    set_name: String,
    progressions: Arc<[Progression]>,
}

impl SessionSnapshot {
    /// Freeze the current order of a set
    pub fn of(set: &Set) -> Self {
        Self {
            set_id: set.id().to_string(),
            set_name: set.name().to_string(),
            progressions: set.progressions().into(),
        }
    }

    pub fn set_id(&self) -> &str {
        &self.set_id
    }

    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    /// Get progression at index
    pub fn get(&self, index: usize) -> Option<&Progression> {
        self.progressions.get(index)
    }

    pub fn progressions(&self) -> &[Progression] {
        &self.progressions
    }

    pub fn len(&self) -> usize {
        self.progressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progressions.is_empty()
    }
}
