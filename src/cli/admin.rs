use clap::Args;

use crate::cli::{PortalOptions, Session};
use crate::core::{Action, PrincipalId, Profile};
use crate::portal::{analytics, registration, users, RemovalReceipt};
use crate::Result;

fn print_profile(profile: &Profile) {
    println!(
        "{}\t{}\t{}\t{}\t{}",
        profile.id,
        profile.full_name,
        profile.pending_email.as_deref().unwrap_or("-"),
        profile.role,
        profile.status
    );
}

fn print_receipt(receipt: &RemovalReceipt) {
    if receipt.profile_removed {
        println!(
            "Removed profile {}. Identity purge {:?}.",
            receipt.id, receipt.identity_purge
        );
    } else {
        println!("No profile for {}", receipt.id);
    }
}

/// List registrations waiting for approval
#[derive(Args, Debug)]
pub struct PendingCommand {}

impl PendingCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let session = Session::open(&options).await?;
        session.authorize(Action::ReviewRegistrations)?;

        let profiles = registration::pending(session.backend()).await?;
        if profiles.is_empty() {
            println!("No pending registrations");
        }
        profiles.iter().for_each(print_profile);

        session.close().await
    }
}

/// Approve a registration
#[derive(Args, Debug)]
pub struct ApproveCommand {
    /// Profile id
    id: String,
}

impl ApproveCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let session = Session::open(&options).await?;
        session.authorize(Action::ReviewRegistrations)?;

        registration::approve(session.backend(), &PrincipalId::new(self.id)).await?;
        println!("OK");

        session.close().await
    }
}

/// Reject a registration
#[derive(Args, Debug)]
pub struct RejectCommand {
    /// Profile id
    id: String,
}

impl RejectCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let session = Session::open(&options).await?;
        session.authorize(Action::ReviewRegistrations)?;

        let receipt = registration::reject(session.backend(), &PrincipalId::new(self.id)).await?;
        print_receipt(&receipt);

        session.close().await
    }
}

/// List approved and rejected users
#[derive(Args, Debug)]
pub struct UsersCommand {
    /// Filter by name or email
    #[arg(long, short = 's', default_value = "")]
    search: String,
}

impl UsersCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let session = Session::open(&options).await?;
        session.authorize(Action::ManageUsers)?;

        let profiles = users::managed(session.backend()).await?;
        users::search(&profiles, &self.search)
            .into_iter()
            .for_each(print_profile);

        session.close().await
    }
}

/// Delete a user
#[derive(Args, Debug)]
pub struct DeleteUserCommand {
    /// Profile id
    id: String,
}

impl DeleteUserCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let session = Session::open(&options).await?;
        session.authorize(Action::ManageUsers)?;

        let receipt = users::delete(session.backend(), &PrincipalId::new(self.id)).await?;
        print_receipt(&receipt);

        session.close().await
    }
}

/// Show user statistics
#[derive(Args, Debug)]
pub struct StatsCommand {}

impl StatsCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let session = Session::open(&options).await?;
        session.authorize(Action::ViewAnalytics)?;

        let summary = analytics::summary(session.backend()).await?;
        println!("students: {}", summary.students);
        println!("teachers: {}", summary.teachers);
        println!("pending: {}", summary.pending);

        session.close().await
    }
}
