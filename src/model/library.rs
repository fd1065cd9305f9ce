// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Library entries: reusable progression templates owned by a user.

use serde::{Deserialize, Serialize};

use super::{AudioReference, Instrument, Progression, ProgressionFields};

/// A progression template independent of any set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub id: String,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub chords: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Instrument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioReference>,
}

impl LibraryEntry {
    /// Build an entry from editable fields
    pub fn from_fields(id: impl Into<String>, owner_id: impl Into<String>, fields: ProgressionFields) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            name: fields.name,
            chords: fields.chords,
            instrument: fields.instrument,
            notes: fields.notes,
            audio: fields.audio,
        }
    }

    /// Fields to copy into a set
    pub fn fields(&self) -> ProgressionFields {
        ProgressionFields {
            name: self.name.clone(),
            chords: self.chords.clone(),
            instrument: self.instrument,
            notes: self.notes.clone(),
            audio: self.audio.clone(),
        }
    }
}

impl From<&Progression> for ProgressionFields {
    fn from(progression: &Progression) -> Self {
        progression.fields()
    }
}
