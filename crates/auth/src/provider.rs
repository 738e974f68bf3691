//! Identity-provider boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::Session;

/// Kinds of lifecycle notification the identity provider emits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    UserUpdated,
    TokenRefreshed,
}

/// A lifecycle notification: what happened, and the session after it
/// happened (`None` means the provider no longer holds one, e.g. sign-out
/// or expiry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChange {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no authenticated user")]
    NotAuthenticated,

    /// Provider-side failure (transport, rate limit, internal error).
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Imperative surface of the identity provider.
///
/// Lifecycle notifications are delivered out-of-band as [`AuthChange`]
/// messages over an [`EventBus`](loadlink_events::EventBus); this trait only
/// covers the calls the application initiates. Implementations must be safe
/// to share across threads.
pub trait IdentityProvider: Send + Sync {
    /// The session the provider holds right now, if any. Asked exactly once,
    /// by the controller's bootstrap.
    fn current_session(&self) -> Result<Option<Session>, AuthError>;

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    fn sign_out(&self) -> Result<(), AuthError>;

    /// Ask the provider to re-send the verification message for `email`.
    fn resend_verification(&self, email: &str) -> Result<(), AuthError>;

    fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError>;

    fn update_password(&self, new_password: &str) -> Result<(), AuthError>;
}
