//! Session lifecycle controller.
//!
//! The sole subscriber to identity-provider notifications and the sole
//! writer of the session cell. Handlers are pure state transitions; the
//! profile fetch a transition owes is returned as a [`FetchTicket`] and run
//! outside the handler, so a newer event can supersede it before it
//! settles.
//!
//! No failure on any path here escapes as a panic or an unhandled error —
//! failures become notices and log entries, and the session survives them.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::guard::routes;
use crate::notify::{ErrorRecord, NotificationSink};
use crate::profile::ProfileUpdate;
use crate::provider::{AuthChange, AuthError, AuthEventKind, IdentityProvider};
use crate::session::Session;
use crate::state::{SessionCell, SessionSnapshot};
use crate::store::ProfileStore;
use crate::sync::{FetchTicket, ProfileSynchronizer};

pub struct SessionController {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    synchronizer: ProfileSynchronizer,
    cell: Arc<SessionCell>,
    notices: Arc<dyn NotificationSink>,
}

impl SessionController {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        notices: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            provider,
            synchronizer: ProfileSynchronizer::new(profiles.clone()),
            profiles,
            cell: Arc::new(SessionCell::new()),
            notices,
        }
    }

    /// Handle to the state cell, for the routing layer and screens.
    pub fn cell(&self) -> Arc<SessionCell> {
        self.cell.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.cell.snapshot()
    }

    /// One-time startup check against the provider.
    ///
    /// Resolves the bootstrapping state either way: a session found owes a
    /// profile fetch (returned ticket); none found, or a provider failure,
    /// resolves to unauthenticated rather than leaving every guard in
    /// perpetual loading.
    pub fn bootstrap(&self) -> Option<FetchTicket> {
        match self.provider.current_session() {
            Ok(session) => self.adopt_session(session),
            Err(err) => {
                warn!(error = %err, "initial session check failed");
                self.notices
                    .error("Could not restore your session. Please sign in again.");
                self.notices.record(
                    ErrorRecord::new("initial session check failed").with_detail(err.to_string()),
                );
                self.cell.replace_session(None);
                None
            }
        }
    }

    /// React to a provider lifecycle notification.
    ///
    /// Pure transition: the returned ticket tells the caller a profile fetch
    /// is owed for the newly adopted session. Notifications can arrive
    /// back-to-back before an earlier fetch settles; the ticket's generation
    /// is what keeps the late result from being applied.
    pub fn on_auth_change(&self, change: AuthChange) -> Option<FetchTicket> {
        match change.kind {
            AuthEventKind::SignedOut => {
                debug!("signed out; clearing session state");
                self.cell.replace_session(None);
                None
            }
            AuthEventKind::SignedIn
            | AuthEventKind::UserUpdated
            | AuthEventKind::TokenRefreshed => self.adopt_session(change.session),
        }
    }

    fn adopt_session(&self, session: Option<Session>) -> Option<FetchTicket> {
        match session {
            None => {
                // Provider-side expiry looks like an event without a session.
                self.cell.replace_session(None);
                None
            }
            Some(session) => {
                let user_id = session.user_id();
                let generation = self.cell.replace_session(Some(session));
                debug!(%user_id, generation, "session adopted; profile fetch owed");
                Some(FetchTicket {
                    generation,
                    user_id,
                    issued_at: Utc::now(),
                })
            }
        }
    }

    /// Perform the fetch for `ticket` and settle the outcome.
    ///
    /// A fetch failure leaves the session valid: the state settles to
    /// "ready, no profile" with a notice, never back to unauthenticated.
    pub fn run_fetch(&self, ticket: FetchTicket) {
        match self.synchronizer.fetch(&ticket) {
            Ok(profile) => {
                if !self.cell.settle_profile(ticket.generation, Some(profile)) {
                    debug!(
                        generation = ticket.generation,
                        "profile result arrived late; dropped"
                    );
                }
            }
            Err(err) => {
                if self.cell.settle_profile(ticket.generation, None) {
                    warn!(user_id = %ticket.user_id, error = %err, "profile fetch failed");
                    self.notices
                        .error("We couldn't load your profile. Some pages may be unavailable.");
                    self.notices.record(
                        ErrorRecord::new("profile fetch failed").with_detail(err.to_string()),
                    );
                } else {
                    debug!(
                        generation = ticket.generation,
                        "profile failure arrived late; dropped"
                    );
                }
            }
        }
    }

    /// Demote a fetch that outlived its deadline.
    ///
    /// Settles to "ready, no profile" through the same path as a fetch
    /// failure. A no-op when the fetch already settled or was superseded.
    pub fn expire_fetch(&self, ticket: &FetchTicket) {
        if self.cell.settle_profile(ticket.generation, None) {
            warn!(user_id = %ticket.user_id, "profile fetch timed out");
            self.notices
                .error("Loading your profile took too long. Some pages may be unavailable.");
        }
    }

    /// Best-effort sign-out.
    ///
    /// Returns the path the caller should navigate to on success. On failure
    /// a notice is emitted and `None` returned — never an error: local state
    /// is cleared by the provider's own signed-out notification regardless
    /// of what this call reported.
    pub fn sign_out(&self) -> Option<&'static str> {
        match self.provider.sign_out() {
            Ok(()) => {
                info!("sign-out accepted by provider");
                self.notices.success("You have been signed out.");
                Some(routes::LOGIN)
            }
            Err(err) => {
                warn!(error = %err, "sign-out failed");
                self.notices.error("Sign-out failed. Please try again.");
                self.notices
                    .record(ErrorRecord::new("sign-out failed").with_detail(err.to_string()));
                None
            }
        }
    }

    /// Re-send the verification message for the currently authenticated
    /// email.
    ///
    /// Fails fast when nobody is signed in. Recording `verification_sent_at`
    /// on the profile is fire-and-forget: a store failure there is logged,
    /// not surfaced.
    pub fn resend_verification(&self) -> Result<(), AuthError> {
        let Some(user) = self.cell.snapshot().user().cloned() else {
            self.notices
                .error("You need to be signed in to resend the verification email.");
            return Err(AuthError::NotAuthenticated);
        };

        match self.provider.resend_verification(&user.email) {
            Ok(()) => {
                self.notices
                    .success("Verification email sent. Check your inbox.");

                let stamp = ProfileUpdate {
                    verification_sent_at: Some(Utc::now()),
                    ..ProfileUpdate::default()
                };
                if let Err(err) = self.profiles.update(user.id, stamp) {
                    warn!(user_id = %user.id, error = %err, "failed to record verification_sent_at");
                }
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "verification resend failed");
                self.notices
                    .error("Could not resend the verification email.");
                self.notices.record(
                    ErrorRecord::new("verification resend failed").with_detail(err.to_string()),
                );
                Err(err)
            }
        }
    }
}
