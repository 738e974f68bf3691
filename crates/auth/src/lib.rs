//! `loadlink-auth` — session lifecycle and role-based access control.
//!
//! The pieces that keep "who is signed in" consistent across asynchronous
//! identity-provider events: the session/profile cell every screen reads,
//! the controller that is the sole writer of that cell, and the pure
//! decision function the routing layer consults before rendering a
//! protected screen.
//!
//! This crate is intentionally decoupled from UI and storage.

pub mod controller;
pub mod guard;
pub mod notify;
pub mod profile;
pub mod provider;
pub mod role;
pub mod session;
pub mod state;
pub mod store;
pub mod sync;

pub use controller::SessionController;
pub use guard::{GuardDecision, decide, role_home, routes};
pub use notify::{ErrorRecord, NotificationSink, TracingSink};
pub use profile::{AccountType, Profile, ProfileUpdate};
pub use provider::{AuthChange, AuthError, AuthEventKind, IdentityProvider};
pub use role::UserRole;
pub use session::{Session, UserHandle};
pub use state::{Generation, SessionCell, SessionSnapshot};
pub use store::{ProfileStore, ProfileStoreError};
pub use sync::{FetchTicket, ProfileSynchronizer};
