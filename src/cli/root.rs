use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::backend::{self, BackendKind, Credentials};
use crate::cli::{account, admin, student, view};
use crate::config::Initializer;
use crate::Result;

/// Siakad command
#[derive(Parser, Debug)]
#[command(version, propagate_version = true, subcommand_required = true)]
pub struct SiakadCommand {
    /// Portal options
    #[command(flatten)]
    pub portal: PortalOptions,
    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Portal options
#[derive(Args, Debug, Clone)]
pub struct PortalOptions {
    /// Configuration file path
    #[arg(
        long,
        short = 'C',
        default_value = "./files/config.yaml",
        env = "SIAKAD_CONFIG_PATH",
        global = true
    )]
    pub config: PathBuf,
    /// Backend implementation
    #[arg(long, value_enum, env = "SIAKAD_BACKEND", global = true)]
    pub backend: Option<BackendKind>,
    /// Base url of the hosted backend
    #[arg(long, env = "SIAKAD_URL", global = true)]
    pub url: Option<String>,
    /// Public api key of the hosted backend
    #[arg(long, env = "SIAKAD_ANON_KEY", hide_env_values = true, global = true)]
    pub anon_key: Option<String>,
    /// Account email
    #[arg(long, env = "SIAKAD_EMAIL", global = true)]
    pub email: Option<String>,
    /// Account password
    #[arg(long, env = "SIAKAD_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,
}

impl PortalOptions {
    /// Load the config file, then let flags and env win over it.
    pub(crate) async fn initializer(&self) -> Result<Initializer> {
        let mut initializer = Initializer::load_optional_config_file(&self.config).await?;

        let mut config = {
            let mut config = backend::Config::default();
            config.set_kind(self.backend);
            config.set_url(&mut self.url.clone());
            config.set_anon_key(&mut self.anon_key.clone());
            config
        };
        initializer.override_backend(&mut config);

        Ok(initializer)
    }

    pub(crate) fn credentials(&self) -> Option<Credentials> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some(Credentials::new(email, password)),
            _ => None,
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the view decided for the account
    View(view::ViewCommand),
    /// Register a new account
    Register(account::RegisterCommand),
    /// List registrations waiting for approval
    Pending(admin::PendingCommand),
    /// Approve a registration
    Approve(admin::ApproveCommand),
    /// Reject a registration
    Reject(admin::RejectCommand),
    /// List approved and rejected users
    Users(admin::UsersCommand),
    /// Delete a user
    DeleteUser(admin::DeleteUserCommand),
    /// Show user statistics
    Stats(admin::StatsCommand),
    /// Show or record attendance
    Attendance(student::AttendanceCommand),
    /// Show the student dashboard
    Dashboard(student::DashboardCommand),
    /// List learning materials
    Materials(student::MaterialsCommand),
    /// Show or edit the profile
    Profile(account::ProfileCommand),
    /// Change password
    Password(account::PasswordCommand),
}

impl SiakadCommand {
    pub async fn run(self) -> Result<()> {
        let SiakadCommand { portal, command } = self;

        match command {
            Command::View(cmd) => cmd.run(portal).await,
            Command::Register(cmd) => cmd.run(portal).await,
            Command::Pending(cmd) => cmd.run(portal).await,
            Command::Approve(cmd) => cmd.run(portal).await,
            Command::Reject(cmd) => cmd.run(portal).await,
            Command::Users(cmd) => cmd.run(portal).await,
            Command::DeleteUser(cmd) => cmd.run(portal).await,
            Command::Stats(cmd) => cmd.run(portal).await,
            Command::Attendance(cmd) => cmd.run(portal).await,
            Command::Dashboard(cmd) => cmd.run(portal).await,
            Command::Materials(cmd) => cmd.run(portal).await,
            Command::Profile(cmd) => cmd.run(portal).await,
            Command::Password(cmd) => cmd.run(portal).await,
        }
    }
}

/// Parse command line args
pub fn parse() -> SiakadCommand {
    SiakadCommand::parse()
}
