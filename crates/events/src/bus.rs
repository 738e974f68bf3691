//! Publish/subscribe abstraction for lifecycle notifications.
//!
//! The bus is the **transport layer** between the identity provider and its
//! in-process consumers. It makes minimal assumptions:
//!
//! - **Transport-agnostic**: in-memory channels here; a provider SDK callback
//!   or a websocket pump can implement the same trait.
//! - **Broadcast semantics**: every subscriber gets a copy of every message.
//! - **No persistence**: the bus distributes; the session cell is the source
//!   of truth for current state.
//! - **No overlap guarantee**: messages may arrive back-to-back before a
//!   consumer has finished reacting to the previous one. Consumers must
//!   tolerate that (the controller does, via generation tagging).

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a notification stream.
///
/// Each subscription owns its receiving end; messages are delivered in the
/// order the bus published them. Designed for single-threaded consumption —
/// one subscription per consumer thread.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Notification bus contract.
///
/// `publish()` can fail (implementation-specific); the caller decides whether
/// to retry. `subscribe()` hands out an independent stream per call.
///
/// Implementations must be safe to share across threads (`Send + Sync`);
/// publishing from the provider while a worker consumes is the normal case.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
