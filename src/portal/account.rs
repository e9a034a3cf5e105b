use serde_json::json;

use crate::backend::{Backend, Collection, Credentials, Identity, Query, Records, SignUpOutcome};
use crate::common::info;
use crate::core::{Principal, Role};
use crate::{Result, SiakadError};

pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone)]
pub struct Registration {
    pub credentials: Credentials,
    pub full_name: String,
    pub role: Role,
}

pub async fn sign_in(backend: &dyn Backend, credentials: &Credentials) -> Result<Principal> {
    info!(email=%credentials.email, "Try sign in");
    backend.sign_in(credentials).await
}

/// Register a new identity. The profile starts pending until an administrator approves it.
pub async fn register(backend: &dyn Backend, registration: &Registration) -> Result<SignUpOutcome> {
    let full_name = registration.full_name.trim();
    if full_name.is_empty() {
        return Err(SiakadError::validation("full name is required"));
    }
    if registration.credentials.email.trim().is_empty() {
        return Err(SiakadError::validation("email is required"));
    }
    check_password_length(&registration.credentials.password)?;
    if let Role::Unrecognized(role) = &registration.role {
        return Err(SiakadError::validation(format!("unknown role {}", role)));
    }

    let metadata = json!({
        "full_name": full_name,
        "role": registration.role,
    });
    let outcome = backend
        .sign_up(&registration.credentials, metadata)
        .await?;
    info!(email=%registration.credentials.email, ?outcome, "Registration submitted");
    Ok(outcome)
}

pub async fn update_full_name(backend: &dyn Backend, principal: &Principal, full_name: &str) -> Result<()> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(SiakadError::validation("full name is required"));
    }

    let updated = backend
        .update(
            Collection::PROFILES,
            &Query::new().eq("id", principal.id().as_str()),
            json!({ "full_name": full_name }),
        )
        .await?;
    if updated == 0 {
        return Err(SiakadError::backend(None, "profile not found"));
    }
    Ok(())
}

pub async fn change_password(backend: &dyn Backend, password: &str, confirmation: &str) -> Result<()> {
    if password != confirmation {
        return Err(SiakadError::validation(
            "password and confirmation do not match",
        ));
    }
    check_password_length(password)?;

    backend.update_password(password).await?;
    info!("Password updated");
    Ok(())
}

fn check_password_length(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(SiakadError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AccountEntry, Identity, MemoryBackend, Records};
    use crate::core::{Profile, Status};

    fn registration(password: &str, full_name: &str) -> Registration {
        Registration {
            credentials: Credentials::new("siti@example.com", password),
            full_name: full_name.into(),
            role: Role::Student,
        }
    }

    #[tokio::test]
    async fn register_validates_before_signing_up() {
        let backend = MemoryBackend::new();

        let err = register(&backend, &registration("12345", "Siti"))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = register(&backend, &registration("123456", "  "))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let outcome = register(&backend, &registration("123456", "Siti"))
            .await
            .unwrap();
        assert!(matches!(outcome, SignUpOutcome::Registered(_)));
    }

    #[tokio::test]
    async fn password_change_rules() {
        let backend = MemoryBackend::new();
        backend.add_account(&AccountEntry {
            email: "a@example.com".into(),
            password: "secret".into(),
            full_name: "A".into(),
            role: Role::Student,
            status: Status::Approved,
        });

        let err = change_password(&backend, "abcdef", "abcdeg").await.unwrap_err();
        assert!(err.is_validation());
        let err = change_password(&backend, "abc", "abc").await.unwrap_err();
        assert!(err.is_validation());

        // Without a session the backend refuses.
        let err = change_password(&backend, "abcdef", "abcdef").await.unwrap_err();
        assert!(matches!(err, SiakadError::Unauthenticated));

        sign_in(&backend, &Credentials::new("a@example.com", "secret"))
            .await
            .unwrap();
        change_password(&backend, "abcdef", "abcdef").await.unwrap();
        backend.sign_out().await.unwrap();
        sign_in(&backend, &Credentials::new("a@example.com", "abcdef"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn full_name_update() {
        let backend = MemoryBackend::new();
        backend.add_account(&AccountEntry {
            email: "a@example.com".into(),
            password: "secret".into(),
            full_name: "A".into(),
            role: Role::Student,
            status: Status::Approved,
        });
        let principal = sign_in(&backend, &Credentials::new("a@example.com", "secret"))
            .await
            .unwrap();

        update_full_name(&backend, &principal, "Ahmad Fauzi").await.unwrap();

        let record = backend
            .find_one(
                Collection::PROFILES,
                &Query::new().eq("id", principal.id().as_str()),
            )
            .await
            .unwrap()
            .unwrap();
        let profile: Profile = serde_json::from_value(record).unwrap();
        assert_eq!(profile.full_name, "Ahmad Fauzi");
    }
}
