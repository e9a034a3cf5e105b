use clap::Args;

use crate::cli::{PortalOptions, Session};
use crate::Result;

/// Show the view decided for the account
#[derive(Args, Debug)]
pub struct ViewCommand {}

impl ViewCommand {
    pub async fn run(self, options: PortalOptions) -> Result<()> {
        let session = Session::open(&options).await?;
        let snapshot = session.snapshot();

        println!("view: {}", snapshot.view);
        if let Some(principal) = &snapshot.principal {
            println!("principal: {}", principal.email().unwrap_or(principal.id().as_str()));
        }
        if let Some(profile) = &snapshot.profile {
            println!(
                "profile: {} ({}, {})",
                profile.full_name, profile.role, profile.status
            );
        }
        let actions = snapshot
            .view
            .actions()
            .iter()
            .map(|action| format!("{:?}", action))
            .collect::<Vec<_>>();
        println!("actions: {}", actions.join(", "));

        session.close().await
    }
}
