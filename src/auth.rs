// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Explicit sign-in context.
//!
//! Components that stamp ownership hold a handle to this context instead of
//! reaching for global state. The identity is acquired at sign-in and
//! cleared at sign-out; every clone of the context sees the change.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::error::{EngineError, Result};
use crate::services::{IdentityProvider, UserIdentity};

/// Shared handle to the current sign-in
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    user: Arc<RwLock<Option<UserIdentity>>>,
}

impl AuthContext {
    /// Create a context with nobody signed in
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Create a context already signed in
    pub fn signed_in(user: UserIdentity) -> Self {
        let ctx = Self::default();
        ctx.sign_in(user);
        ctx
    }

    /// Start a session for a user
    pub fn sign_in(&self, user: UserIdentity) {
        info!(user = %user.id, "signed in");
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    /// End the session
    pub fn sign_out(&self) {
        let previous = self.user.write().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(user) = previous {
            info!(user = %user.id, "signed out");
        }
    }

    /// Check if someone is signed in
    pub fn is_signed_in(&self) -> bool {
        self.current_user().is_some()
    }
}

impl IdentityProvider for AuthContext {
    fn current_user(&self) -> Option<UserIdentity> {
        self.user.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Get the current user or fail with `Unauthenticated`
pub fn require_user(identity: &dyn IdentityProvider) -> Result<UserIdentity> {
    identity.current_user().ok_or(EngineError::Unauthenticated)
}
