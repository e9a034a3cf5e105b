use crate::backend::{Backend, Credentials};
use crate::cli::PortalOptions;
use crate::common::{debug, ErrorKind};
use crate::config::Portal;
use crate::core::{Action, Principal, Profile, Snapshot, View};
use crate::portal::account;
use crate::{Result, SiakadError};

/// Portal mounted for a single command.
pub(crate) struct Session {
    portal: Portal,
    snapshot: Snapshot,
}

impl Session {
    /// Sign in with the configured credentials if any, then wait for the gate decision.
    pub(crate) async fn open(options: &PortalOptions) -> Result<Self> {
        let credentials = options.credentials();
        Session::connect(options, credentials.as_ref()).await
    }

    /// Mount the gate without signing in.
    pub(crate) async fn anonymous(options: &PortalOptions) -> Result<Self> {
        Session::connect(options, None).await
    }

    async fn connect(options: &PortalOptions, credentials: Option<&Credentials>) -> Result<Self> {
        let initializer = options.initializer().await?;
        let backend = initializer.build_backend()?;

        if let Some(credentials) = credentials {
            account::sign_in(backend.as_ref(), credentials).await?;
        }

        let portal = initializer.launch(backend, tokio::signal::ctrl_c());
        let snapshot = portal.gate.settled().await?;
        debug!(view=%snapshot.view, "Gate settled");

        Ok(Self { portal, snapshot })
    }

    pub(crate) fn view(&self) -> View {
        self.snapshot.view
    }

    pub(crate) fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub(crate) fn backend(&self) -> &dyn Backend {
        self.portal.backend.as_ref()
    }

    /// Fail unless the decided view offers the action.
    pub(crate) fn authorize(&self, action: Action) -> Result<()> {
        authorize(self.view(), action)
    }

    pub(crate) fn principal(&self) -> Result<&Principal> {
        self.snapshot
            .principal
            .as_ref()
            .ok_or(SiakadError::Unauthenticated)
    }

    pub(crate) fn profile(&self) -> Result<&Profile> {
        self.snapshot
            .profile
            .as_ref()
            .ok_or(SiakadError::Unauthenticated)
    }

    pub(crate) async fn close(self) -> Result<()> {
        self.portal.gate.shutdown().await;
        self.portal
            .task
            .await
            .map_err(|err| ErrorKind::Internal(format!("gate task failed: {}", err)).into())
    }
}

fn authorize(view: View, action: Action) -> Result<()> {
    if view.permits(action) {
        return Ok(());
    }
    match view {
        View::SignIn => Err(SiakadError::Unauthenticated),
        view => Err(SiakadError::Forbidden {
            view: view.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_view_is_unauthenticated() {
        for action in [Action::StudentOverview, Action::ManageUsers, Action::Logout] {
            assert!(matches!(
                authorize(View::SignIn, action),
                Err(SiakadError::Unauthenticated)
            ));
        }
        assert!(authorize(View::SignIn, Action::Register).is_ok());
    }

    #[test]
    fn other_views_are_forbidden() {
        let cases = [
            (View::PendingApproval, Action::RecordAttendance),
            (View::AccountProblem, Action::EditProfile),
            (View::StudentDashboard, Action::ReviewRegistrations),
            (View::AdminDashboard, Action::BrowseMaterials),
            (View::Loading, Action::SignIn),
        ];
        for (view, action) in cases {
            match authorize(view, action) {
                Err(SiakadError::Forbidden { view: name }) => assert_eq!(name, view.as_str()),
                other => panic!("{} {:?}: {:?}", view, action, other),
            }
        }
    }

    #[test]
    fn permitted_actions_pass() {
        assert!(authorize(View::StudentDashboard, Action::BrowseMaterials).is_ok());
        assert!(authorize(View::AdminDashboard, Action::ViewAnalytics).is_ok());
        assert!(authorize(View::PendingApproval, Action::Logout).is_ok());
    }
}
