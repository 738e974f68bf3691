//! In-memory doubles for the identity provider, profile store and
//! notification sink.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{Duration, Utc};
use uuid::Uuid;

use loadlink_auth::{
    AuthChange, AuthError, AuthEventKind, ErrorRecord, IdentityProvider, NotificationSink,
    Profile, ProfileStore, ProfileStoreError, ProfileUpdate, Session, UserHandle,
};
use loadlink_core::{SessionId, UserId};
use loadlink_events::{EventBus, InMemoryEventBus};

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: UserHandle,
}

/// Identity provider double.
///
/// Holds registered accounts, mints uuid-token sessions and publishes
/// [`AuthChange`] notifications on the bus exactly where a hosted provider
/// would fire its callbacks. `fail_next_sign_out` injects a provider-side
/// failure for error-path tests.
pub struct InMemoryIdentityProvider {
    bus: Arc<InMemoryEventBus<AuthChange>>,
    accounts: RwLock<HashMap<String, Account>>,
    current: Mutex<Option<Session>>,
    session_ttl: Duration,
    fail_next_sign_out: AtomicBool,
}

impl InMemoryIdentityProvider {
    pub fn new(bus: Arc<InMemoryEventBus<AuthChange>>) -> Self {
        Self {
            bus,
            accounts: RwLock::new(HashMap::new()),
            current: Mutex::new(None),
            session_ttl: Duration::hours(1),
            fail_next_sign_out: AtomicBool::new(false),
        }
    }

    /// Register an account without going through `sign_up`. Returns the
    /// provider-issued user id, the key for the matching profile row.
    pub fn register(&self, email: &str, password: &str, confirmed: bool) -> UserId {
        let user = UserHandle {
            id: UserId::new(),
            email: email.to_string(),
            email_confirmed_at: confirmed.then(Utc::now),
        };
        let id = user.id;
        self.write_accounts().insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                user,
            },
        );
        id
    }

    /// Make the next `sign_out` call fail provider-side.
    pub fn fail_next_sign_out(&self) {
        self.fail_next_sign_out.store(true, Ordering::SeqCst);
    }

    fn mint_session(&self, user: UserHandle) -> Session {
        Session {
            session_id: SessionId::new(),
            access_token: Uuid::now_v7().simple().to_string(),
            refresh_token: Uuid::now_v7().simple().to_string(),
            expires_at: Utc::now() + self.session_ttl,
            user,
        }
    }

    fn publish(&self, kind: AuthEventKind, session: Option<Session>) {
        // In-memory publish is infallible.
        let _ = self.bus.publish(AuthChange { kind, session });
    }

    fn write_accounts(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Account>> {
        self.accounts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_accounts(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<String, Account>> {
        self.accounts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_lock(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn current_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.current_lock().clone())
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let account = self
            .read_accounts()
            .get(&email.to_lowercase())
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;
        if account.password != password {
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.mint_session(account.user);
        *self.current_lock() = Some(session.clone());
        self.publish(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if self.read_accounts().contains_key(&email.to_lowercase()) {
            return Err(AuthError::Provider("email already registered".into()));
        }
        self.register(email, password, false);
        self.sign_in(email, password)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        if self.fail_next_sign_out.swap(false, Ordering::SeqCst) {
            return Err(AuthError::Provider("sign-out rejected".into()));
        }
        *self.current_lock() = None;
        self.publish(AuthEventKind::SignedOut, None);
        Ok(())
    }

    fn resend_verification(&self, email: &str) -> Result<(), AuthError> {
        if self.read_accounts().contains_key(&email.to_lowercase()) {
            Ok(())
        } else {
            Err(AuthError::Provider("unknown email".into()))
        }
    }

    fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError> {
        if self.read_accounts().contains_key(&email.to_lowercase()) {
            Ok(())
        } else {
            Err(AuthError::Provider("unknown email".into()))
        }
    }

    fn update_password(&self, new_password: &str) -> Result<(), AuthError> {
        let current = self.current_lock().clone();
        let Some(session) = current else {
            return Err(AuthError::NotAuthenticated);
        };

        if let Some(account) = self
            .write_accounts()
            .get_mut(&session.user.email.to_lowercase())
        {
            account.password = new_password.to_string();
        }
        self.publish(AuthEventKind::UserUpdated, Some(session));
        Ok(())
    }
}

/// Profile store double: one row per user id, partial-field merge on
/// update, injectable read failures.
#[derive(Default)]
pub struct InMemoryProfileStore {
    rows: RwLock<HashMap<UserId, Profile>>,
    fail_reads: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: Profile) {
        self.write_rows().insert(profile.id, profile);
    }

    /// Make every subsequent read fail as a backend error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, id: UserId) -> Option<Profile> {
        self.read_rows().get(&id).cloned()
    }

    fn write_rows(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<UserId, Profile>> {
        self.rows
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_rows(&self) -> std::sync::RwLockReadGuard<'_, HashMap<UserId, Profile>> {
        self.rows
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn get_by_id(&self, id: UserId) -> Result<Profile, ProfileStoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ProfileStoreError::Backend("injected read failure".into()));
        }
        self.read_rows()
            .get(&id)
            .cloned()
            .ok_or(ProfileStoreError::NotFound)
    }

    fn update(&self, id: UserId, fields: ProfileUpdate) -> Result<(), ProfileStoreError> {
        let mut rows = self.write_rows();
        let Some(row) = rows.get_mut(&id) else {
            return Err(ProfileStoreError::NotFound);
        };

        if let Some(v) = fields.email_verified {
            row.email_verified = v;
        }
        if let Some(v) = fields.verification_sent_at {
            row.verification_sent_at = Some(v);
        }
        if let Some(v) = fields.full_name {
            row.full_name = Some(v);
        }
        if let Some(v) = fields.phone {
            row.phone = Some(v);
        }
        if let Some(v) = fields.company_name {
            row.company_name = Some(v);
        }
        Ok(())
    }
}

/// Notification sink that captures everything for assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    records: Mutex<Vec<ErrorRecord>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn successes(&self) -> Vec<String> {
        self.lock(&self.successes).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lock(&self.errors).clone()
    }

    pub fn records(&self) -> Vec<ErrorRecord> {
        self.lock(&self.records).clone()
    }

    fn lock<'a, T>(&self, m: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NotificationSink for RecordingSink {
    fn success(&self, message: &str) {
        self.lock(&self.successes).push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.lock(&self.errors).push(message.to_string());
    }

    fn record(&self, record: ErrorRecord) {
        self.lock(&self.records).push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadlink_auth::UserRole;

    fn profile(id: UserId) -> Profile {
        Profile {
            id,
            user_type: UserRole::Driver,
            account_type: Default::default(),
            email_verified: false,
            full_name: None,
            phone: None,
            company_name: None,
            verification_sent_at: None,
        }
    }

    #[test]
    fn sign_in_publishes_a_signed_in_change() {
        let bus = Arc::new(InMemoryEventBus::new());
        let provider = InMemoryIdentityProvider::new(bus.clone());
        provider.register("ops@example.com", "pw", true);

        let sub = bus.subscribe();
        let session = provider.sign_in("ops@example.com", "pw").unwrap();

        let change = sub.try_recv().unwrap();
        assert_eq!(change.kind, AuthEventKind::SignedIn);
        assert_eq!(change.session.unwrap().user.id, session.user.id);
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let bus = Arc::new(InMemoryEventBus::new());
        let provider = InMemoryIdentityProvider::new(bus);
        provider.register("ops@example.com", "pw", true);

        let err = provider.sign_in("ops@example.com", "nope").unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn update_merges_only_the_given_fields() {
        let store = InMemoryProfileStore::new();
        let id = UserId::new();
        let mut row = profile(id);
        row.full_name = Some("Pat Carrier".into());
        store.insert(row);

        store
            .update(
                id,
                ProfileUpdate {
                    email_verified: Some(true),
                    ..ProfileUpdate::default()
                },
            )
            .unwrap();

        let row = store.get(id).unwrap();
        assert!(row.email_verified);
        assert_eq!(row.full_name.as_deref(), Some("Pat Carrier"));
    }

    #[test]
    fn updating_a_missing_row_is_not_found() {
        let store = InMemoryProfileStore::new();
        let err = store
            .update(UserId::new(), ProfileUpdate::default())
            .unwrap_err();
        assert_eq!(err, ProfileStoreError::NotFound);
    }
}
