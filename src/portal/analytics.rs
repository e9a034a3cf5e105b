use crate::backend::{Backend, Collection, Query, Records};
use crate::core::{Role, Status};
use crate::Result;

/// Head counts shown on the administrator dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub students: u64,
    pub teachers: u64,
    pub pending: u64,
}

pub async fn summary(backend: &dyn Backend) -> Result<Summary> {
    let approved = |role: &str| {
        Query::new()
            .eq("role", role)
            .eq("status", Status::APPROVED)
    };

    let students = backend
        .count(Collection::PROFILES, &approved(Role::STUDENT))
        .await?;
    let teachers = backend
        .count(Collection::PROFILES, &approved(Role::TEACHER_ADMIN))
        .await?;
    let pending = backend
        .count(
            Collection::PROFILES,
            &Query::new().eq("status", Status::PENDING),
        )
        .await?;

    Ok(Summary {
        students,
        teachers,
        pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AccountEntry, MemoryBackend};

    #[tokio::test]
    async fn counts_by_role_and_status() {
        let backend = MemoryBackend::new();
        let accounts = [
            ("s1@example.com", Role::Student, Status::Approved),
            ("s2@example.com", Role::Student, Status::Approved),
            ("s3@example.com", Role::Student, Status::Pending),
            ("s4@example.com", Role::Student, Status::Rejected),
            ("g1@example.com", Role::TeacherAdmin, Status::Approved),
            ("g2@example.com", Role::TeacherAdmin, Status::Pending),
        ];
        for (email, role, status) in accounts {
            backend.add_account(&AccountEntry {
                email: email.into(),
                password: "secret".into(),
                full_name: "x".into(),
                role,
                status,
            });
        }

        assert_eq!(
            summary(&backend).await.unwrap(),
            Summary {
                students: 2,
                teachers: 1,
                pending: 2,
            }
        );
    }

    #[tokio::test]
    async fn fault_propagates() {
        let backend = MemoryBackend::new();
        backend.inject_fault(Collection::PROFILES, Some("offline"));
        assert!(summary(&backend).await.is_err());
    }
}
