//! Provider session and the identity handle derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loadlink_core::{SessionId, UserId};

/// Minimal identity record carried inside a session.
///
/// Derived 1:1 from the session; null exactly when no session is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserHandle {
    pub id: UserId,
    pub email: String,

    /// Provider-side confirmation timestamp, set once the user has followed
    /// the verification link the provider mailed out.
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

/// Provider-issued proof of authentication.
///
/// Opaque to this crate beyond presence, expiry and the embedded handle.
/// Replaced wholesale on every lifecycle event, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserHandle,
}

impl Session {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session {
            session_id: SessionId::new(),
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_at,
            user: UserHandle {
                id: UserId::new(),
                email: "ops@example.com".into(),
                email_confirmed_at: None,
            },
        }
    }

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let now = Utc::now();
        assert!(session(now).is_expired(now));
        assert!(session(now - Duration::seconds(1)).is_expired(now));
        assert!(!session(now + Duration::seconds(1)).is_expired(now));
    }
}
