// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Editing sets and their progressions.
//!
//! This module provides:
//! - The per-set editor with optimistic reorder and rollback by reload
//! - Set and library listing, creation and deletion for the current user

pub mod catalog;
pub mod set_editor;

pub use catalog::SetCatalog;
pub use set_editor::{ReorderOutcome, SetEditor};
