//! Data access collaborator.
//!
//! Everything the portal persists or authenticates goes through the
//! [`Identity`] and [`Records`] traits. The gate and the portal services
//! receive an injected `Arc<dyn Backend>`; nothing holds a global client.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{Principal, PrincipalId};
use crate::Result;

mod collection;
pub use self::collection::Collection;

mod query;
pub use self::query::{Condition, Order, Query};

mod subscription;
pub use self::subscription::Subscription;

mod config;
pub use self::config::{AccountEntry, BackendKind, Config};

pub mod memory;
pub use self::memory::MemoryBackend;

pub mod rest;
pub use self::rest::RestBackend;

/// Record as exchanged with the backend.
pub type Record = serde_json::Value;

/// Email and password pair.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    // New identity created. It stays unusable until the profile is approved.
    Registered(PrincipalId),
    // Identity with the email already exists but is not confirmed yet.
    AlreadyRegistered,
}

#[async_trait]
pub trait Identity: Send + Sync {
    /// Current principal. Absence is a normal result, never an error.
    async fn current_principal(&self) -> Option<Principal>;

    /// Listen identity changes. `None` is delivered when the principal goes away.
    fn subscribe(&self) -> Subscription;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Principal>;

    async fn sign_up(&self, credentials: &Credentials, metadata: Record) -> Result<SignUpOutcome>;

    /// Idempotent. Signing out without a session succeeds.
    async fn sign_out(&self) -> Result<()>;

    /// Sign out only while the session belongs to `id`.
    /// Return whether a session was ended.
    async fn sign_out_principal(&self, id: &PrincipalId) -> Result<bool>;

    async fn update_password(&self, password: &str) -> Result<()>;
}

#[async_trait]
pub trait Records: Send + Sync {
    /// `Ok(None)` when no record matches. Errors are faults only.
    async fn find_one(&self, collection: Collection, query: &Query) -> Result<Option<Record>>;

    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Record>>;

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64>;

    async fn insert(&self, collection: Collection, record: Record) -> Result<()>;

    /// Return the number of updated records.
    async fn update(&self, collection: Collection, query: &Query, patch: Record) -> Result<u64>;

    /// Return the number of deleted records.
    async fn delete(&self, collection: Collection, query: &Query) -> Result<u64>;
}

pub trait Backend: Identity + Records {}

impl<T> Backend for T where T: Identity + Records {}

pub type SharedBackend = Arc<dyn Backend>;
