use crate::backend::{Backend, Collection, Query, Records};
use crate::common::info;
use crate::core::{PrincipalId, Profile, Status};
use crate::portal::{decode_all, remove_profile, RemovalReceipt};
use crate::Result;

/// Users with a decided registration, approved or rejected.
pub async fn managed(backend: &dyn Backend) -> Result<Vec<Profile>> {
    let records = backend
        .select(
            Collection::PROFILES,
            &Query::new()
                .any_of("status", [Status::APPROVED, Status::REJECTED])
                .order("full_name", true),
        )
        .await?;
    decode_all(records)
}

/// Case insensitive match on name or email. A blank term keeps everything.
pub fn search<'a>(profiles: &'a [Profile], term: &str) -> Vec<&'a Profile> {
    let term = term.trim().to_lowercase();
    profiles
        .iter()
        .filter(|profile| {
            term.is_empty()
                || profile.full_name.to_lowercase().contains(&term)
                || profile
                    .pending_email
                    .as_deref()
                    .map_or(false, |email| email.to_lowercase().contains(&term))
        })
        .collect()
}

pub async fn delete(backend: &dyn Backend, id: &PrincipalId) -> Result<RemovalReceipt> {
    let receipt = remove_profile(backend, id).await?;
    info!(%id, removed=receipt.profile_removed, "User deleted");
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AccountEntry, MemoryBackend};
    use crate::core::Role;

    fn account(email: &str, name: &str, status: Status) -> AccountEntry {
        AccountEntry {
            email: email.into(),
            password: "secret".into(),
            full_name: name.into(),
            role: Role::Student,
            status,
        }
    }

    #[tokio::test]
    async fn managed_excludes_pending() {
        let backend = MemoryBackend::new();
        backend.add_account(&account("b@example.com", "Budi", Status::Approved));
        backend.add_account(&account("a@example.com", "Ani", Status::Rejected));
        backend.add_account(&account("c@example.com", "Citra", Status::Pending));

        let users = managed(&backend).await.unwrap();
        let names: Vec<_> = users.iter().map(|p| p.full_name.as_str()).collect();
        assert_eq!(names, vec!["Ani", "Budi"]);
    }

    #[test]
    fn search_by_name_or_email() {
        let profiles = vec![
            Profile::new("1", "Budi Santoso", Role::Student, Status::Approved)
                .with_pending_email("budi@example.com"),
            Profile::new("2", "Ani", Role::TeacherAdmin, Status::Approved)
                .with_pending_email("guru.ani@example.com"),
        ];

        assert_eq!(search(&profiles, "  ").len(), 2);
        assert_eq!(search(&profiles, "SANTOSO")[0].id.as_str(), "1");
        assert_eq!(search(&profiles, "guru.")[0].id.as_str(), "2");
        assert!(search(&profiles, "zzz").is_empty());
    }

    #[tokio::test]
    async fn delete_reports_missing_profile() {
        let backend = MemoryBackend::new();
        let id = backend.add_account(&account("b@example.com", "Budi", Status::Approved));

        assert!(delete(&backend, &id).await.unwrap().profile_removed);
        assert!(!delete(&backend, &id).await.unwrap().profile_removed);
    }
}
