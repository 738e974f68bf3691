//! Session event pump.
//!
//! Bridges the notification bus and the session controller on a background
//! thread: each notification becomes a state transition, and any profile
//! fetch the transition owes runs here — outside the handler — under a
//! bounded deadline.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use loadlink_auth::{AuthChange, FetchTicket, SessionController};
use loadlink_events::{EventBus, Subscription};

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

#[derive(Debug)]
pub struct SessionWorker;

impl SessionWorker {
    /// Spawn the pump thread.
    ///
    /// `fetch_deadline` bounds every profile fetch: a store that never
    /// answers demotes the session to "ready, no profile" instead of
    /// leaving every guard loading forever.
    pub fn spawn<B>(
        bus: B,
        controller: Arc<SessionController>,
        fetch_deadline: Duration,
    ) -> WorkerHandle
    where
        B: EventBus<AuthChange> + Send + Sync + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<AuthChange> = bus.subscribe();

        let join = thread::Builder::new()
            .name("session-worker".to_string())
            .spawn(move || worker_loop(sub, shutdown_rx, controller, fetch_deadline))
            .expect("failed to spawn session worker thread");

        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

fn worker_loop(
    sub: Subscription<AuthChange>,
    shutdown_rx: mpsc::Receiver<()>,
    controller: Arc<SessionController>,
    fetch_deadline: Duration,
) {
    let tick = Duration::from_millis(250);

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(change) => {
                if let Some(ticket) = controller.on_auth_change(change) {
                    run_fetch_with_deadline(&controller, ticket, fetch_deadline);
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Run the fetch on a helper thread so a hung store cannot stall the pump.
///
/// When the deadline elapses the fetch is expired through the controller;
/// the straggling store call settles into a no-op when it finally returns.
fn run_fetch_with_deadline(
    controller: &Arc<SessionController>,
    ticket: FetchTicket,
    deadline: Duration,
) {
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let fetcher = {
        let controller = controller.clone();
        let ticket = ticket.clone();
        thread::spawn(move || {
            controller.run_fetch(ticket);
            let _ = done_tx.send(());
        })
    };

    match done_rx.recv_timeout(deadline) {
        Ok(()) => {
            let _ = fetcher.join();
        }
        Err(_) => {
            warn!(user_id = %ticket.user_id(), "profile fetch exceeded deadline");
            controller.expire_fetch(&ticket);
            // The fetcher thread is left to finish on its own.
        }
    }
}
