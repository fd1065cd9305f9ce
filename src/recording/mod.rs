// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recording system.
//!
//! This module provides capture of audio clips from an input device and
//! their upload as new audio references.

pub mod capture;

pub use capture::{AudioRecorder, CaptureDevice, CaptureError, RecordingState};
