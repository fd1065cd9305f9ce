// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance mode: stepping through a set on stage.

pub mod session;

pub use session::{PerformanceSession, SessionState};
