//! Infrastructure layer: in-process adapters and the session event pump.
//!
//! The identity provider and profile store here are in-memory doubles for
//! development and tests; production deployments swap in adapters for the
//! hosted identity/database service behind the same traits.

pub mod in_memory;
pub mod workers;

#[cfg(test)]
mod integration_tests;

pub use in_memory::{InMemoryIdentityProvider, InMemoryProfileStore, RecordingSink};
pub use workers::{SessionWorker, WorkerHandle};
