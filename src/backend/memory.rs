//! In process backend.
//!
//! Keeps records and accounts in memory and behaves like the hosted service
//! where the portal depends on it: a pending profile is created when an
//! identity signs up, duplicate keys are rejected, and signing out is
//! idempotent. Faults and lookup latency can be injected for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::backend::{
    AccountEntry, Collection, Credentials, Identity, Query, Record, Records, SignUpOutcome,
    Subscription,
};
use crate::common::{debug, info};
use crate::core::{Principal, PrincipalId, Profile, Status};
use crate::{Result, SiakadError};

const CHANGE_CHANNEL_CAPACITY: usize = 16;
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

pub struct MemoryBackend {
    state: Mutex<State>,
    changes: broadcast::Sender<Option<Principal>>,
    session_ttl: Duration,
}

#[derive(Default)]
struct State {
    collections: HashMap<&'static str, Vec<Record>>,
    unique_keys: HashMap<&'static str, Vec<&'static str>>,
    accounts: HashMap<String, Account>,
    session: Option<Principal>,
    faults: HashMap<&'static str, String>,
    sign_out_fault: Option<String>,
    lookup_delays: HashMap<PrincipalId, Duration>,
    sign_out_calls: usize,
    sign_out_delay: Option<Duration>,
}

struct Account {
    id: PrincipalId,
    password: String,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::with_session_ttl(DEFAULT_SESSION_TTL)
    }

    pub fn with_session_ttl(session_ttl: Duration) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let mut state = State::default();
        state.unique_keys.insert(Collection::PROFILES.name(), vec!["id"]);
        state
            .unique_keys
            .insert(Collection::ATTENDANCE.name(), vec!["user_id", "date"]);

        Self {
            state: Mutex::new(state),
            changes,
            session_ttl,
        }
    }

    /// Create an identity together with its profile, bypassing approval.
    pub fn add_account(&self, entry: &AccountEntry) -> PrincipalId {
        let id = PrincipalId::new(random_hex(16));
        let profile = Profile::new(
            id.clone(),
            entry.full_name.clone(),
            entry.role.clone(),
            entry.status.clone(),
        )
        .with_pending_email(entry.email.clone());

        let mut state = self.lock();
        state.accounts.insert(
            entry.email.clone(),
            Account {
                id: id.clone(),
                password: entry.password.clone(),
            },
        );
        state
            .records_mut(Collection::PROFILES)
            .push(serde_json::to_value(profile).unwrap_or(Value::Null));
        debug!(email=%entry.email, %id, "Account seeded");
        id
    }

    /// Make every record operation on the collection fail until cleared with `None`.
    pub fn inject_fault(&self, collection: Collection, fault: Option<&str>) {
        let mut state = self.lock();
        match fault {
            Some(message) => {
                state.faults.insert(collection.name(), message.to_owned());
            }
            None => {
                state.faults.remove(collection.name());
            }
        }
    }

    pub fn inject_sign_out_fault(&self, fault: Option<&str>) {
        self.lock().sign_out_fault = fault.map(str::to_owned);
    }

    /// Delay profile lookups for the principal.
    pub fn delay_lookup(&self, id: &PrincipalId, delay: Duration) {
        self.lock().lookup_delays.insert(id.clone(), delay);
    }

    /// Delay sign out requests before they reach the session.
    pub fn delay_sign_out(&self, delay: Duration) {
        self.lock().sign_out_delay = Some(delay);
    }

    pub fn sign_out_calls(&self) -> usize {
        self.lock().sign_out_calls
    }

    /// Drop the session as if its token expired.
    pub fn expire_session(&self) {
        let expired = self.lock().session.take();
        if expired.is_some() {
            info!("Session expired");
            self.notify(None);
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, change: Option<Principal>) {
        // No receiver is not an error.
        let _ = self.changes.send(change);
    }

    async fn sign_out_latency(&self) {
        let delay = self.lock().sign_out_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn end_session(&self, owned: impl FnOnce(&Principal) -> bool) -> Result<bool> {
        let ended = {
            let mut state = self.lock();
            state.sign_out_calls += 1;
            if let Some(fault) = state.sign_out_fault.clone() {
                return Err(SiakadError::backend(None, fault));
            }
            match state.session.as_ref() {
                Some(principal) if owned(principal) => state.session.take(),
                _ => None,
            }
        };
        if ended.is_some() {
            info!("Signed out");
            self.notify(None);
        }
        Ok(ended.is_some())
    }

    fn issue_principal(&self, id: PrincipalId, email: &str) -> Principal {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.session_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        Principal::new(id, Some(email.to_owned()), random_hex(32), now, now + ttl)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        MemoryBackend::new()
    }
}

impl State {
    fn records(&self, collection: Collection) -> &[Record] {
        self.collections
            .get(collection.name())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn records_mut(&mut self, collection: Collection) -> &mut Vec<Record> {
        self.collections.entry(collection.name()).or_default()
    }

    fn check_fault(&self, collection: Collection) -> Result<()> {
        match self.faults.get(collection.name()) {
            Some(message) => Err(SiakadError::backend(None, message.clone())),
            None => Ok(()),
        }
    }

    fn violates_unique(&self, collection: Collection, record: &Record) -> bool {
        let keys = match self.unique_keys.get(collection.name()) {
            Some(keys) => keys,
            None => return false,
        };
        self.records(collection)
            .iter()
            .any(|existing| keys.iter().all(|key| existing.get(key) == record.get(key)))
    }
}

#[async_trait]
impl Identity for MemoryBackend {
    async fn current_principal(&self) -> Option<Principal> {
        let mut state = self.lock();
        let expired = state
            .session
            .as_ref()
            .map_or(false, Principal::is_expired);
        if expired {
            state.session = None;
            drop(state);
            self.notify(None);
            return None;
        }
        state.session.clone()
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.changes.subscribe())
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Principal> {
        let principal = {
            let mut state = self.lock();
            let id = match state.accounts.get(&credentials.email) {
                Some(account) if account.password == credentials.password => account.id.clone(),
                _ => {
                    return Err(SiakadError::backend(
                        Some("invalid_credentials"),
                        "Invalid login credentials",
                    ))
                }
            };
            let principal = self.issue_principal(id, &credentials.email);
            state.session = Some(principal.clone());
            principal
        };
        info!(id=%principal.id(), "Signed in");
        self.notify(Some(principal.clone()));
        Ok(principal)
    }

    async fn sign_up(&self, credentials: &Credentials, metadata: Record) -> Result<SignUpOutcome> {
        let mut state = self.lock();
        if state.accounts.contains_key(&credentials.email) {
            return Ok(SignUpOutcome::AlreadyRegistered);
        }

        let id = PrincipalId::new(random_hex(16));
        state.accounts.insert(
            credentials.email.clone(),
            Account {
                id: id.clone(),
                password: credentials.password.clone(),
            },
        );

        // Profile is created pending, the same way the hosted service trigger does.
        let profile = json!({
            "id": id,
            "full_name": metadata.get("full_name").cloned().unwrap_or_else(|| json!("")),
            "role": metadata.get("role").cloned().unwrap_or_else(|| json!("")),
            "status": Status::PENDING,
            "pending_email": credentials.email,
        });
        state.records_mut(Collection::PROFILES).push(profile);

        info!(%id, "Signed up");
        Ok(SignUpOutcome::Registered(id))
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_out_latency().await;
        self.end_session(|_| true).map(|_| ())
    }

    async fn sign_out_principal(&self, id: &PrincipalId) -> Result<bool> {
        self.sign_out_latency().await;
        self.end_session(|principal| principal.id() == id)
    }

    async fn update_password(&self, password: &str) -> Result<()> {
        let mut state = self.lock();
        let id = match state.session.as_ref() {
            Some(principal) => principal.id().clone(),
            None => return Err(SiakadError::Unauthenticated),
        };
        if let Some(account) = state.accounts.values_mut().find(|a| a.id == id) {
            account.password = password.to_owned();
        }
        Ok(())
    }
}

#[async_trait]
impl Records for MemoryBackend {
    async fn find_one(&self, collection: Collection, query: &Query) -> Result<Option<Record>> {
        let delay = {
            let state = self.lock();
            query
                .eq_value("id")
                .and_then(Value::as_str)
                .and_then(|id| state.lookup_delays.get(&PrincipalId::new(id)).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.lock();
        state.check_fault(collection)?;
        let mut matched = query.apply(state.records(collection));
        match matched.len() {
            0 => Ok(None),
            1 => Ok(matched.pop()),
            n => Err(SiakadError::backend(
                Some("multiple_rows"),
                format!("expected one record in {}, found {}", collection, n),
            )),
        }
    }

    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Record>> {
        let state = self.lock();
        state.check_fault(collection)?;
        Ok(query.apply(state.records(collection)))
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64> {
        let state = self.lock();
        state.check_fault(collection)?;
        Ok(state
            .records(collection)
            .iter()
            .filter(|record| query.matches(record))
            .count() as u64)
    }

    async fn insert(&self, collection: Collection, record: Record) -> Result<()> {
        let mut state = self.lock();
        state.check_fault(collection)?;
        if !record.is_object() {
            return Err(SiakadError::validation("record must be an object"));
        }
        if state.violates_unique(collection, &record) {
            return Err(SiakadError::backend(
                Some("23505"),
                format!("duplicate key value violates unique constraint on {}", collection),
            ));
        }
        state.records_mut(collection).push(record);
        Ok(())
    }

    async fn update(&self, collection: Collection, query: &Query, patch: Record) -> Result<u64> {
        let mut state = self.lock();
        state.check_fault(collection)?;
        let patch = match patch {
            Value::Object(patch) => patch,
            _ => return Err(SiakadError::validation("patch must be an object")),
        };

        let mut updated = 0;
        for record in state.records_mut(collection).iter_mut() {
            if !query.matches(record) {
                continue;
            }
            if let Value::Object(fields) = record {
                for (key, value) in &patch {
                    fields.insert(key.clone(), value.clone());
                }
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete(&self, collection: Collection, query: &Query) -> Result<u64> {
        let mut state = self.lock();
        state.check_fault(collection)?;
        let records = state.records_mut(collection);
        let before = records.len();
        records.retain(|record| !query.matches(record));
        Ok((before - records.len()) as u64)
    }
}

fn random_hex(bytes: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..bytes)
        .map(|_| format!("{:02x}", rng.gen::<u8>()))
        .collect()
}

// Distinct emails among seeded accounts.
pub(crate) fn seed(backend: &MemoryBackend, accounts: &[AccountEntry]) -> usize {
    let mut seen = HashSet::new();
    for account in accounts {
        if seen.insert(account.email.as_str()) {
            backend.add_account(account);
        }
    }
    seen.len()
}
