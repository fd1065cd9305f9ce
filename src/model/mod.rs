// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Data model for sets, progressions and library entries.
//!
//! This module provides:
//! - Progressions with their editable fields and partial updates
//! - Sets ordered by position, and the snapshot a performance runs over
//! - Library entries used as templates

pub mod library;
pub mod progression;
pub mod set;

pub use library::LibraryEntry;
pub use progression::{AudioReference, Instrument, Progression, ProgressionFields, ProgressionPatch};
pub use set::{SessionSnapshot, Set, SetInfo};
