//! `loadlink-core` — shared domain primitives for the LoadLink marketplace.
//!
//! Identifiers and the error model only; no IO, no session logic.

pub mod error;
pub mod id;

pub use error::{CoreError, CoreResult};
pub use id::{SessionId, UserId};
