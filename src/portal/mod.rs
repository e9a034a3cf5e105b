//! Operations behind the role dashboards.
//!
//! Each function takes the injected backend. Whether the caller may run an
//! operation is decided by the gate view, see [`crate::core::Action`].

pub mod account;
pub mod analytics;
pub mod attendance;
pub mod materials;
pub mod registration;
pub mod student;
pub mod users;

use serde::de::DeserializeOwned;

use crate::backend::{Backend, Collection, Query, Record, Records};
use crate::common::info;
use crate::core::PrincipalId;
use crate::Result;

/// Outcome of removing a user.
/// The profile removal is immediate. Purging the identity is left to an
/// administrator of the hosted service and happens eventually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalReceipt {
    pub id: PrincipalId,
    pub profile_removed: bool,
    pub identity_purge: IdentityPurge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPurge {
    Deferred,
}

pub(crate) async fn remove_profile(backend: &dyn Backend, id: &PrincipalId) -> Result<RemovalReceipt> {
    let deleted = backend
        .delete(Collection::PROFILES, &Query::new().eq("id", id.as_str()))
        .await?;
    info!(%id, deleted, "Profile removed, identity purge deferred");

    Ok(RemovalReceipt {
        id: id.clone(),
        profile_removed: deleted > 0,
        identity_purge: IdentityPurge::Deferred,
    })
}

pub(crate) fn decode_all<T: DeserializeOwned>(records: Vec<Record>) -> Result<Vec<T>> {
    records
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(Into::into))
        .collect()
}
