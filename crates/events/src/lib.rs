//! `loadlink-events` — notification transport for identity lifecycle events.
//!
//! The identity provider announces session changes (signed-in, signed-out,
//! user-updated, token-refreshed) over this bus; the session controller is
//! the subscriber that turns them into state transitions.

pub mod bus;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::InMemoryEventBus;
