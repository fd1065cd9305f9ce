// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error taxonomy for the session engine.
//!
//! Nothing here is fatal to the process; every variant is meant to be
//! surfaced at the UI boundary and recovered from there.

use thiserror::Error;

use crate::services::ServiceError;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by the editor, resolver, recorder and performance session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An owner-stamped write was attempted with no signed-in user
    #[error("not authenticated")]
    Unauthenticated,

    /// Referenced set, progression or library entry is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Object storage could not issue a playable handle
    #[error("failed to resolve audio '{reference}': {reason}")]
    Resolution { reference: String, reason: String },

    /// Object storage rejected an upload
    #[error("failed to upload audio '{name}': {reason}")]
    Upload { name: String, reason: String },

    /// Capture device unavailable or access refused
    #[error("capture device unavailable: {0}")]
    PermissionDenied(String),

    /// Persistence service failed during create/update/delete/reorder
    #[error("remote write failed: {0}")]
    RemoteWrite(#[source] ServiceError),

    /// Persistence service failed while loading
    #[error("remote read failed: {0}")]
    RemoteRead(#[source] ServiceError),

    /// Input failed validation (empty chords, blank set name, unknown tag)
    #[error("invalid input: {0}")]
    Validation(String),

    /// Reorder request is not a single adjacent swap within bounds
    #[error("invalid move from {from} to {to} in a set of {len}")]
    InvalidMove { from: usize, to: usize, len: usize },

    /// Recorder operation not valid in its current state
    #[error("recorder is {0}")]
    RecorderBusy(&'static str),

    /// Performance input already has a listener
    #[error("performance input is already bound")]
    InputBound,
}

impl EngineError {
    /// Map a persistence failure on a read into the taxonomy
    pub(crate) fn from_read(what: impl Into<String>, err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => EngineError::NotFound(what.into()),
            ServiceError::Unauthorized => EngineError::Unauthenticated,
            other => EngineError::RemoteRead(other),
        }
    }

    /// Check whether the caller can simply retry later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::Resolution { .. }
                | EngineError::Upload { .. }
                | EngineError::RemoteWrite(ServiceError::Transport(_))
                | EngineError::RemoteRead(ServiceError::Transport(_))
        )
    }
}
