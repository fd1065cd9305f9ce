// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session engine for chord-progression setlists.
//!
//! Sets are edited through [`editor::SetEditor`], which keeps a set's order
//! in step with a remote store, and performed through
//! [`perform::PerformanceSession`], which steps through a frozen snapshot
//! while resolving each step's audio clip.

pub mod audio;
pub mod auth;
pub mod config;
pub mod control;
pub mod editor;
pub mod error;
pub mod model;
pub mod perform;
pub mod recording;
pub mod services;
pub mod timing;
pub mod ui;

pub use error::{EngineError, Result};
