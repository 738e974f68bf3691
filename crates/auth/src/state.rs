//! The session state cell: single source of truth for "is anyone logged in".

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::profile::Profile;
use crate::role::UserRole;
use crate::session::{Session, UserHandle};

/// Supersession tag. Bumped on every session replacement; a profile-fetch
/// result is applied only while the generation it was issued under is still
/// current.
pub type Generation = u64;

/// Immutable view of session state at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session: Option<Session>,
    pub profile: Option<Profile>,

    /// True from construction until the first resolution — either "no
    /// session" or "session plus settled profile fetch" — and again while a
    /// new session's profile is being fetched.
    pub is_loading: bool,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn user(&self) -> Option<&UserHandle> {
        self.session.as_ref().map(|s| &s.user)
    }

    /// Role on file; `Unset` when no profile is present.
    pub fn role(&self) -> UserRole {
        self.profile
            .as_ref()
            .map(|p| p.user_type)
            .unwrap_or(UserRole::Unset)
    }

    /// Verified if the provider confirmed the email OR the profile's own
    /// flag is set. Either source alone is sufficient.
    pub fn is_email_verified(&self) -> bool {
        let provider = self
            .user()
            .is_some_and(|u| u.email_confirmed_at.is_some());
        let profile = self.profile.as_ref().is_some_and(|p| p.email_verified);
        provider || profile
    }
}

#[derive(Debug)]
struct CellInner {
    session: Option<Session>,
    profile: Option<Profile>,
    is_loading: bool,
    generation: Generation,
}

/// The single mutable cell behind every screen's view of identity.
///
/// Read by any number of consumers; written only by the session controller.
/// Constructed explicitly and handed to whoever needs it — there is no
/// ambient/global lookup.
#[derive(Debug)]
pub struct SessionCell {
    inner: RwLock<CellInner>,
}

impl SessionCell {
    /// Starts in the bootstrapping state: nothing known yet, loading.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CellInner {
                session: None,
                profile: None,
                is_loading: true,
                generation: 0,
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.read();
        SessionSnapshot {
            session: inner.session.clone(),
            profile: inner.profile.clone(),
            is_loading: inner.is_loading,
        }
    }

    pub fn generation(&self) -> Generation {
        self.read().generation
    }

    /// Replace the held session wholesale.
    ///
    /// Any profile belonged to the previous session and is cleared with it.
    /// Loading stays up only while a profile fetch is owed, i.e. when a
    /// session is present. Returns the new generation, which tags that
    /// fetch.
    pub(crate) fn replace_session(&self, session: Option<Session>) -> Generation {
        let mut inner = self.write();
        inner.generation += 1;
        inner.profile = None;
        inner.is_loading = session.is_some();
        inner.session = session;
        inner.generation
    }

    /// Apply a settled profile fetch. Returns whether it was applied.
    ///
    /// A result is dropped when its generation has been superseded, when the
    /// fetch for this generation already settled, or when the fetched
    /// profile does not belong to the currently held session. At most one
    /// settle takes effect per generation.
    pub(crate) fn settle_profile(
        &self,
        generation: Generation,
        profile: Option<Profile>,
    ) -> bool {
        let mut inner = self.write();

        if inner.generation != generation {
            debug!(
                issued = generation,
                current = inner.generation,
                "profile result superseded"
            );
            return false;
        }
        if !inner.is_loading {
            debug!(generation, "profile fetch already settled");
            return false;
        }
        if let Some(p) = &profile {
            let owner_matches = inner
                .session
                .as_ref()
                .is_some_and(|s| s.user_id() == p.id);
            if !owner_matches {
                debug!(generation, "fetched profile does not match held session");
                return false;
            }
        }

        inner.profile = profile;
        inner.is_loading = false;
        true
    }

    fn read(&self) -> RwLockReadGuard<'_, CellInner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CellInner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}
