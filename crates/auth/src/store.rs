//! Profile-store boundary.

use thiserror::Error;

use loadlink_core::UserId;

use crate::profile::{Profile, ProfileUpdate};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileStoreError {
    /// No profile row exists for the requested user.
    #[error("profile not found")]
    NotFound,

    /// Store-level failure (network, permission, backend).
    #[error("profile store error: {0}")]
    Backend(String),
}

/// Keyed profile record store: one row per authenticated identity, keyed by
/// the provider's user id.
///
/// Both error variants are reported identically to the session controller —
/// a missing row and a failed lookup leave the session valid and the
/// profile absent.
pub trait ProfileStore: Send + Sync {
    fn get_by_id(&self, id: UserId) -> Result<Profile, ProfileStoreError>;

    /// Merge `fields` into the row for `id`; `None` fields are untouched.
    fn update(&self, id: UserId, fields: ProfileUpdate) -> Result<(), ProfileStoreError>;
}
