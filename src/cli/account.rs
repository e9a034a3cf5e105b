use clap::Args;

use crate::backend::SignUpOutcome;
use crate::cli::{PortalOptions, Session};
use crate::core::{Action, Role};
use crate::portal::account::{self, Registration};
use crate::{Result, SiakadError};

/// Register a new account with the global email and password
#[derive(Args, Debug)]
pub struct RegisterCommand {
    /// Full name
    #[arg(long)]
    full_name: String,
    /// Role, siswa or guru
    #[arg(long, value_parser = parse_role)]
    role: Role,
}

impl RegisterCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let credentials = options
            .credentials()
            .ok_or_else(|| SiakadError::validation("email and password are required"))?;

        let session = Session::anonymous(&options).await?;
        session.authorize(Action::Register)?;

        let registration = Registration {
            credentials,
            full_name: self.full_name,
            role: self.role,
        };
        match account::register(session.backend(), &registration).await? {
            SignUpOutcome::Registered(id) => {
                println!("Registered {}. Verify the email and wait for approval.", id)
            }
            SignUpOutcome::AlreadyRegistered => {
                println!("Registration already pending for {}", registration.credentials.email)
            }
        }

        session.close().await
    }
}

fn parse_role(s: &str) -> std::result::Result<Role, String> {
    match s.trim().to_lowercase().as_str() {
        "siswa" | "student" => Ok(Role::Student),
        "guru" | "admin" | "guru/admin" | "teacher" => Ok(Role::TeacherAdmin),
        other => Err(format!("unknown role {}", other)),
    }
}

/// Show the profile or change the full name
#[derive(Args, Debug)]
pub struct ProfileCommand {
    /// New full name
    #[arg(long)]
    full_name: Option<String>,
}

impl ProfileCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let session = Session::open(&options).await?;
        session.authorize(Action::EditProfile)?;

        match self.full_name {
            Some(full_name) => {
                account::update_full_name(session.backend(), session.principal()?, &full_name)
                    .await?;
                println!("OK");
            }
            None => {
                let profile = session.profile()?;
                println!("id: {}", profile.id);
                println!("full name: {}", profile.full_name);
                println!("role: {}", profile.role);
                println!("status: {}", profile.status);
                if let Some(email) = &profile.pending_email {
                    println!("email: {}", email);
                }
            }
        }

        session.close().await
    }
}

/// Change the password of the signed in account
#[derive(Args, Debug)]
pub struct PasswordCommand {
    /// New password
    #[arg(long, env = "SIAKAD_NEW_PASSWORD", hide_env_values = true)]
    new_password: String,
    /// New password again
    #[arg(long, env = "SIAKAD_NEW_PASSWORD_CONFIRMATION", hide_env_values = true)]
    confirmation: String,
}

impl PasswordCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let session = Session::open(&options).await?;
        session.authorize(Action::EditProfile)?;

        account::change_password(session.backend(), &self.new_password, &self.confirmation).await?;
        println!("OK");

        session.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_aliases() {
        assert_eq!(parse_role("Siswa").unwrap(), Role::Student);
        assert_eq!(parse_role("Guru/Admin").unwrap(), Role::TeacherAdmin);
        assert!(parse_role("tamu").is_err());
    }
}
