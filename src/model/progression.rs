// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Progressions: one chord sequence entry in a set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Opaque key into object storage.
///
/// Not playable by itself; exchange it for a signed handle through the
/// resource resolver first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioReference(String);

impl AudioReference {
    /// Wrap a storage key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the storage key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Instrument tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    Piano,
    Guitar,
    Bass,
    Synth,
    Drums,
    Vocals,
    Other,
}

impl Instrument {
    /// All instrument tags in display order
    pub const ALL: [Instrument; 7] = [
        Instrument::Piano,
        Instrument::Guitar,
        Instrument::Bass,
        Instrument::Synth,
        Instrument::Drums,
        Instrument::Vocals,
        Instrument::Other,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Piano => "Piano",
            Instrument::Guitar => "Guitar",
            Instrument::Bass => "Bass",
            Instrument::Synth => "Synth",
            Instrument::Drums => "Drums",
            Instrument::Vocals => "Vocals",
            Instrument::Other => "Other",
        }
    }

    /// Parse a form value; empty text means no tag
    pub fn from_tag(tag: &str) -> Result<Option<Instrument>> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(None);
        }
        tag.parse().map(Some)
    }
}

impl FromStr for Instrument {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Instrument::ALL
            .iter()
            .find(|i| i.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| EngineError::Validation(format!("unknown instrument '{}'", s)))
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User-editable fields of a progression or library entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressionFields {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Chord text (required)
    pub chords: String,
    /// Instrument tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Instrument>,
    /// Free-text performance notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Attached audio clip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioReference>,
}

impl ProgressionFields {
    /// Create fields with chord text only
    pub fn new(chords: impl Into<String>) -> Self {
        Self {
            chords: chords.into(),
            ..Default::default()
        }
    }

    /// Builder: set name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: set instrument
    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instrument = Some(instrument);
        self
    }

    /// Builder: set notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Builder: attach audio
    pub fn with_audio(mut self, audio: AudioReference) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Reject empty chord text
    pub fn validate(&self) -> Result<()> {
        validate_chords(&self.chords)
    }
}

fn validate_chords(chords: &str) -> Result<()> {
    if chords.trim().is_empty() {
        return Err(EngineError::Validation("chords must not be empty".into()));
    }
    Ok(())
}

/// Partial update of a progression.
///
/// The outer `Option` says whether a field is touched; for optional fields
/// the inner `Option` is the new value (`Some(None)` clears it).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressionPatch {
    pub name: Option<Option<String>>,
    pub chords: Option<String>,
    pub instrument: Option<Option<Instrument>>,
    pub notes: Option<Option<String>>,
    pub audio: Option<Option<AudioReference>>,
}

impl ProgressionPatch {
    /// Patch replacing every editable field
    pub fn replace_all(fields: ProgressionFields) -> Self {
        Self {
            name: Some(fields.name),
            chords: Some(fields.chords),
            instrument: Some(fields.instrument),
            notes: Some(fields.notes),
            audio: Some(fields.audio),
        }
    }

    /// Builder: set chords
    pub fn chords(mut self, chords: impl Into<String>) -> Self {
        self.chords = Some(chords.into());
        self
    }

    /// Builder: set or clear name
    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = Some(name);
        self
    }

    /// Builder: set or clear notes
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    /// Builder: set or clear audio
    pub fn audio(mut self, audio: Option<AudioReference>) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Builder: set or clear instrument
    pub fn instrument(mut self, instrument: Option<Instrument>) -> Self {
        self.instrument = Some(instrument);
        self
    }

    /// Check if the patch touches nothing
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.chords.is_none()
            && self.instrument.is_none()
            && self.notes.is_none()
            && self.audio.is_none()
    }

    /// Reject a patch that would empty the chord text
    pub fn validate(&self) -> Result<()> {
        match &self.chords {
            Some(chords) => validate_chords(chords),
            None => Ok(()),
        }
    }

    /// Apply to a progression in place
    pub fn apply(&self, progression: &mut Progression) {
        if let Some(name) = &self.name {
            progression.name = name.clone();
        }
        if let Some(chords) = &self.chords {
            progression.chords = chords.clone();
        }
        if let Some(instrument) = self.instrument {
            progression.instrument = instrument;
        }
        if let Some(notes) = &self.notes {
            progression.notes = notes.clone();
        }
        if let Some(audio) = &self.audio {
            progression.audio = audio.clone();
        }
    }
}

/// One entry of a set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub id: String,
    pub set_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub chords: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Instrument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioReference>,
    /// Zero-based order within the set
    pub position: u32,
}

impl Progression {
    /// Build a progression from its editable fields
    pub fn from_fields(
        id: impl Into<String>,
        set_id: impl Into<String>,
        fields: ProgressionFields,
        position: u32,
    ) -> Self {
        Self {
            id: id.into(),
            set_id: set_id.into(),
            name: fields.name,
            chords: fields.chords,
            instrument: fields.instrument,
            notes: fields.notes,
            audio: fields.audio,
            position,
        }
    }

    /// Copy out the editable fields
    pub fn fields(&self) -> ProgressionFields {
        ProgressionFields {
            name: self.name.clone(),
            chords: self.chords.clone(),
            instrument: self.instrument,
            notes: self.notes.clone(),
            audio: self.audio.clone(),
        }
    }

    /// Check if there are notes worth showing
    pub fn has_notes(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Title for display: the name, or the chords when unnamed
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.chords)
    }
}
