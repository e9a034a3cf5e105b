use serde_json::json;

use crate::backend::{Backend, Collection, Query, Records};
use crate::common::info;
use crate::core::{PrincipalId, Profile, Status};
use crate::portal::{decode_all, remove_profile, RemovalReceipt};
use crate::{Result, SiakadError};

/// Registrations waiting for a decision.
pub async fn pending(backend: &dyn Backend) -> Result<Vec<Profile>> {
    let records = backend
        .select(
            Collection::PROFILES,
            &Query::new().eq("status", Status::PENDING),
        )
        .await?;
    decode_all(records)
}

pub async fn approve(backend: &dyn Backend, id: &PrincipalId) -> Result<()> {
    let updated = backend
        .update(
            Collection::PROFILES,
            &Query::new()
                .eq("id", id.as_str())
                .eq("status", Status::PENDING),
            json!({ "status": Status::APPROVED }),
        )
        .await?;
    if updated == 0 {
        return Err(SiakadError::backend(
            None,
            format!("no pending registration for {}", id),
        ));
    }
    info!(%id, "Registration approved");
    Ok(())
}

/// Rejecting removes the profile. The identity itself is purged later.
pub async fn reject(backend: &dyn Backend, id: &PrincipalId) -> Result<RemovalReceipt> {
    let receipt = remove_profile(backend, id).await?;
    info!(%id, removed=receipt.profile_removed, "Registration rejected");
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AccountEntry, Credentials, Identity, MemoryBackend};
    use crate::core::Role;
    use crate::portal::IdentityPurge;

    fn backend() -> (MemoryBackend, PrincipalId) {
        let backend = MemoryBackend::new();
        backend.add_account(&AccountEntry {
            email: "guru@example.com".into(),
            password: "secret".into(),
            full_name: "Guru".into(),
            role: Role::TeacherAdmin,
            status: Status::Approved,
        });
        let id = backend.add_account(&AccountEntry {
            email: "budi@example.com".into(),
            password: "secret".into(),
            full_name: "Budi".into(),
            role: Role::Student,
            status: Status::Pending,
        });
        (backend, id)
    }

    #[tokio::test]
    async fn approve_pending_registration() {
        let (backend, id) = backend();

        let waiting = pending(&backend).await.unwrap();
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].id, id);
        assert_eq!(waiting[0].pending_email.as_deref(), Some("budi@example.com"));

        approve(&backend, &id).await.unwrap();
        assert!(pending(&backend).await.unwrap().is_empty());

        // Already decided.
        assert!(approve(&backend, &id).await.is_err());
    }

    #[tokio::test]
    async fn reject_removes_profile_only() {
        let (backend, id) = backend();

        let receipt = reject(&backend, &id).await.unwrap();
        assert!(receipt.profile_removed);
        assert_eq!(receipt.identity_purge, IdentityPurge::Deferred);
        assert!(pending(&backend).await.unwrap().is_empty());

        // The identity still signs in, the gate then finds no profile.
        backend
            .sign_in(&Credentials::new("budi@example.com", "secret"))
            .await
            .unwrap();
    }
}
