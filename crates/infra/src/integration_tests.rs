//! Integration tests for the session core.
//!
//! Wires the real controller to the in-memory provider/store/sink and
//! exercises the full flow: bootstrap, sign-in, profile fetch, guard
//! decisions, supersession, sign-out and the worker-driven pump.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use loadlink_auth::{
    AuthChange, GuardDecision, IdentityProvider, Profile, ProfileStore, ProfileStoreError,
    ProfileUpdate, SessionController, UserRole, decide, routes,
};
use loadlink_core::UserId;
use loadlink_events::{EventBus, InMemoryEventBus, Subscription};

use crate::in_memory::{InMemoryIdentityProvider, InMemoryProfileStore, RecordingSink};
use crate::workers::SessionWorker;

struct Harness {
    bus: Arc<InMemoryEventBus<AuthChange>>,
    provider: Arc<InMemoryIdentityProvider>,
    store: Arc<InMemoryProfileStore>,
    sink: Arc<RecordingSink>,
    controller: Arc<SessionController>,
}

fn harness() -> Harness {
    let bus = Arc::new(InMemoryEventBus::new());
    let provider = Arc::new(InMemoryIdentityProvider::new(bus.clone()));
    let store = Arc::new(InMemoryProfileStore::new());
    let sink = Arc::new(RecordingSink::new());
    let controller = Arc::new(SessionController::new(
        provider.clone(),
        store.clone(),
        sink.clone(),
    ));
    Harness {
        bus,
        provider,
        store,
        sink,
        controller,
    }
}

fn profile_row(id: UserId, role: UserRole) -> Profile {
    Profile {
        id,
        user_type: role,
        account_type: Default::default(),
        email_verified: false,
        full_name: None,
        phone: None,
        company_name: None,
        verification_sent_at: None,
    }
}

/// Drain pending notifications and run any owed fetches, synchronously.
fn drive(h: &Harness, sub: &Subscription<AuthChange>) {
    while let Ok(change) = sub.try_recv() {
        if let Some(ticket) = h.controller.on_auth_change(change) {
            h.controller.run_fetch(ticket);
        }
    }
}

/// Poll until `cond` holds; the worker processes events on its own thread.
fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("condition not reached within timeout");
}

#[test]
fn no_session_at_startup_redirects_protected_screens_to_login() {
    let h = harness();

    assert!(h.controller.bootstrap().is_none());

    let snap = h.controller.snapshot();
    assert_eq!(
        decide(&snap, &[UserRole::Driver]),
        GuardDecision::RedirectTo(routes::LOGIN)
    );
}

#[test]
fn business_user_is_routed_by_role() {
    let h = harness();
    let sub = h.bus.subscribe();

    let id = h.provider.register("acme@example.com", "pw", true);
    h.store.insert(profile_row(id, UserRole::Business));

    h.provider.sign_in("acme@example.com", "pw").unwrap();
    drive(&h, &sub);

    let snap = h.controller.snapshot();

    // Wrong door: a driver-only screen bounces them to their own dashboard.
    assert_eq!(
        decide(&snap, &[UserRole::Driver]),
        GuardDecision::RedirectTo(routes::BUSINESS_DASHBOARD)
    );
    // Their own screen renders.
    assert_eq!(decide(&snap, &[UserRole::Business]), GuardDecision::Render);
}

#[test]
fn pending_profile_fetch_shows_loading() {
    let h = harness();
    let sub = h.bus.subscribe();

    let id = h.provider.register("d@example.com", "pw", true);
    h.store.insert(profile_row(id, UserRole::Driver));
    h.provider.sign_in("d@example.com", "pw").unwrap();

    // Transition applied, fetch not yet run.
    let change = sub.try_recv().unwrap();
    let ticket = h.controller.on_auth_change(change).unwrap();

    let snap = h.controller.snapshot();
    assert_eq!(decide(&snap, &[]), GuardDecision::ShowLoading);
    assert_eq!(
        decide(&snap, &[UserRole::Driver]),
        GuardDecision::ShowLoading
    );

    h.controller.run_fetch(ticket);
    assert_eq!(
        decide(&h.controller.snapshot(), &[UserRole::Driver]),
        GuardDecision::Render
    );
}

#[test]
fn fetch_failure_keeps_the_session_usable() {
    let h = harness();
    let sub = h.bus.subscribe();

    h.provider.register("l@example.com", "pw", true);
    h.store.fail_reads(true);

    h.provider.sign_in("l@example.com", "pw").unwrap();
    drive(&h, &sub);

    let snap = h.controller.snapshot();
    assert!(snap.is_authenticated());
    assert!(snap.profile.is_none());
    assert!(!snap.is_loading);

    // Open screen still renders; a gated screen falls back to home
    // (no profile, so no mapped role dashboard).
    assert_eq!(decide(&snap, &[]), GuardDecision::Render);
    assert_eq!(
        decide(&snap, &[UserRole::Logistics]),
        GuardDecision::RedirectTo(routes::HOME)
    );

    assert_eq!(h.sink.errors().len(), 1);
    assert_eq!(h.sink.records().len(), 1);
}

#[test]
fn a_newer_sign_in_supersedes_an_older_fetch() {
    let h = harness();
    let sub = h.bus.subscribe();

    let id_a = h.provider.register("a@example.com", "pw", true);
    let id_b = h.provider.register("b@example.com", "pw", true);
    h.store.insert(profile_row(id_a, UserRole::Driver));
    h.store.insert(profile_row(id_b, UserRole::Business));

    h.provider.sign_in("a@example.com", "pw").unwrap();
    let ticket_a = h
        .controller
        .on_auth_change(sub.try_recv().unwrap())
        .unwrap();

    h.provider.sign_in("b@example.com", "pw").unwrap();
    let ticket_b = h
        .controller
        .on_auth_change(sub.try_recv().unwrap())
        .unwrap();

    // B settles first; A's result arrives late and must be discarded.
    h.controller.run_fetch(ticket_b);
    h.controller.run_fetch(ticket_a);

    let snap = h.controller.snapshot();
    let profile = snap.profile.clone().unwrap();
    assert_eq!(profile.id, id_b);
    assert_eq!(snap.session.unwrap().user.id, id_b);
}

#[test]
fn sign_out_clears_state_and_is_idempotent() {
    let h = harness();
    let sub = h.bus.subscribe();

    let id = h.provider.register("d@example.com", "pw", true);
    h.store.insert(profile_row(id, UserRole::Driver));
    h.provider.sign_in("d@example.com", "pw").unwrap();
    drive(&h, &sub);

    assert_eq!(h.controller.sign_out(), Some(routes::LOGIN));
    drive(&h, &sub);

    let snap = h.controller.snapshot();
    assert!(!snap.is_authenticated());
    assert!(snap.profile.is_none());

    // A second immediate call neither throws nor produces an error notice.
    assert_eq!(h.controller.sign_out(), Some(routes::LOGIN));
    drive(&h, &sub);

    assert_eq!(h.sink.successes().len(), 2);
    assert!(h.sink.errors().is_empty());
    assert!(!h.controller.snapshot().is_authenticated());
}

#[test]
fn failed_sign_out_is_reported_but_not_fatal() {
    let h = harness();
    let sub = h.bus.subscribe();

    let id = h.provider.register("d@example.com", "pw", true);
    h.store.insert(profile_row(id, UserRole::Driver));
    h.provider.sign_in("d@example.com", "pw").unwrap();
    drive(&h, &sub);

    h.provider.fail_next_sign_out();
    assert_eq!(h.controller.sign_out(), None);
    drive(&h, &sub);

    // The provider call failed, so no signed-out event: still signed in.
    assert!(h.controller.snapshot().is_authenticated());
    assert_eq!(h.sink.errors().len(), 1);
    assert_eq!(h.sink.records().len(), 1);

    // The retry goes through.
    assert_eq!(h.controller.sign_out(), Some(routes::LOGIN));
    drive(&h, &sub);
    assert!(!h.controller.snapshot().is_authenticated());
}

#[test]
fn resend_verification_stamps_the_profile() {
    let h = harness();
    let sub = h.bus.subscribe();

    let id = h.provider.register("v@example.com", "pw", false);
    h.store.insert(profile_row(id, UserRole::Logistics));
    h.provider.sign_in("v@example.com", "pw").unwrap();
    drive(&h, &sub);

    h.controller.resend_verification().unwrap();

    assert_eq!(h.sink.successes().len(), 1);
    assert!(h.store.get(id).unwrap().verification_sent_at.is_some());
}

#[test]
fn worker_drives_the_full_session_lifecycle() {
    let h = harness();

    h.controller.bootstrap();
    let worker = SessionWorker::spawn(
        h.bus.clone(),
        h.controller.clone(),
        Duration::from_secs(1),
    );

    let id = h.provider.register("d@example.com", "pw", true);
    h.store.insert(profile_row(id, UserRole::Driver));
    h.provider.sign_in("d@example.com", "pw").unwrap();

    wait_until(|| {
        let snap = h.controller.snapshot();
        !snap.is_loading && snap.profile.is_some()
    });
    assert_eq!(h.controller.snapshot().role(), UserRole::Driver);

    assert_eq!(h.controller.sign_out(), Some(routes::LOGIN));
    wait_until(|| !h.controller.snapshot().is_authenticated());

    worker.shutdown();
}

/// Store whose reads hang past the worker's deadline.
struct SlowStore {
    delay: Duration,
}

impl ProfileStore for SlowStore {
    fn get_by_id(&self, _id: UserId) -> Result<Profile, ProfileStoreError> {
        thread::sleep(self.delay);
        Err(ProfileStoreError::NotFound)
    }

    fn update(&self, _id: UserId, _fields: ProfileUpdate) -> Result<(), ProfileStoreError> {
        Ok(())
    }
}

#[test]
fn hung_fetch_demotes_to_ready_without_a_profile() {
    let bus = Arc::new(InMemoryEventBus::new());
    let provider = Arc::new(InMemoryIdentityProvider::new(bus.clone()));
    let sink = Arc::new(RecordingSink::new());
    let controller = Arc::new(SessionController::new(
        provider.clone(),
        Arc::new(SlowStore {
            delay: Duration::from_millis(500),
        }),
        sink.clone(),
    ));

    controller.bootstrap();
    let worker = SessionWorker::spawn(bus.clone(), controller.clone(), Duration::from_millis(50));

    provider.register("slow@example.com", "pw", true);
    provider.sign_in("slow@example.com", "pw").unwrap();

    wait_until(|| {
        let snap = controller.snapshot();
        snap.is_authenticated() && !snap.is_loading
    });

    let snap = controller.snapshot();
    assert!(snap.profile.is_none());
    assert_eq!(decide(&snap, &[]), GuardDecision::Render);
    assert_eq!(sink.errors().len(), 1);

    worker.shutdown();
}
