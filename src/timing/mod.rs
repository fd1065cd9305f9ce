// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! This module provides the elapsed-time stopwatch shown during a
//! performance.

pub mod stopwatch;

pub use stopwatch::{format_mm_ss, ClockState, Stopwatch};
