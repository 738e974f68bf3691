//! Profile synchronizer: one fetch per session transition, tagged for
//! supersession.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use loadlink_core::UserId;

use crate::profile::Profile;
use crate::state::Generation;
use crate::store::{ProfileStore, ProfileStoreError};

/// Tag for a pending profile fetch.
///
/// Minted by the controller when a session transition owes a (re)fetch. The
/// result is settled against the cell, which applies it only while this
/// generation is still current — a fetch issued for session event N can
/// never overwrite state produced by event N+1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub(crate) generation: Generation,
    pub(crate) user_id: UserId,
    pub(crate) issued_at: DateTime<Utc>,
}

impl FetchTicket {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

/// Fetches exactly one profile row per ticket.
///
/// Reports absence and store failure as plain values; nothing here throws
/// into the controller's event-handling path.
pub struct ProfileSynchronizer {
    profiles: Arc<dyn ProfileStore>,
}

impl ProfileSynchronizer {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    pub fn fetch(&self, ticket: &FetchTicket) -> Result<Profile, ProfileStoreError> {
        if ticket.user_id.is_nil() {
            return Err(ProfileStoreError::Backend(
                "refusing to fetch a profile for the nil user id".into(),
            ));
        }
        self.profiles.get_by_id(ticket.user_id)
    }
}
