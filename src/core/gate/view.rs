use std::fmt;

use crate::core::{Profile, Role, Status};

/// Top level view the gate allows the current user to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Loading,
    SignIn,
    PendingApproval,
    StudentDashboard,
    AdminDashboard,
    // Account state outside the known combinations. Offers logout only.
    AccountProblem,
}

/// Operation a view offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SignIn,
    Register,
    Logout,
    EditProfile,
    StudentOverview,
    RecordAttendance,
    BrowseMaterials,
    ReviewRegistrations,
    ManageUsers,
    ViewAnalytics,
}

impl View {
    /// Decide the view of an authenticated principal from its profile.
    pub fn for_profile(profile: &Profile) -> View {
        match (&profile.status, &profile.role) {
            (Status::Pending, _) => View::PendingApproval,
            (Status::Approved, Role::Student) => View::StudentDashboard,
            (Status::Approved, Role::TeacherAdmin) => View::AdminDashboard,
            _ => View::AccountProblem,
        }
    }

    pub fn actions(&self) -> &'static [Action] {
        match self {
            View::Loading => &[],
            View::SignIn => &[Action::SignIn, Action::Register],
            View::PendingApproval | View::AccountProblem => &[Action::Logout],
            View::StudentDashboard => &[
                Action::StudentOverview,
                Action::RecordAttendance,
                Action::BrowseMaterials,
                Action::EditProfile,
                Action::Logout,
            ],
            View::AdminDashboard => &[
                Action::ReviewRegistrations,
                Action::ManageUsers,
                Action::ViewAnalytics,
                Action::EditProfile,
                Action::Logout,
            ],
        }
    }

    pub fn permits(&self, action: Action) -> bool {
        self.actions().contains(&action)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Loading => "loading",
            View::SignIn => "sign-in",
            View::PendingApproval => "pending-approval",
            View::StudentDashboard => "student-dashboard",
            View::AdminDashboard => "admin-dashboard",
            View::AccountProblem => "account-problem",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role, status: Status) -> Profile {
        Profile::new("u1", "Test", role, status)
    }

    #[test]
    fn pending_regardless_of_role() {
        for role in [
            Role::Student,
            Role::TeacherAdmin,
            Role::Unrecognized("Tamu".into()),
        ] {
            let view = View::for_profile(&profile(role, Status::Pending));
            assert_eq!(view, View::PendingApproval);
        }
    }

    #[test]
    fn approved_dispatches_on_role() {
        assert_eq!(
            View::for_profile(&profile(Role::Student, Status::Approved)),
            View::StudentDashboard
        );
        assert_eq!(
            View::for_profile(&profile(Role::TeacherAdmin, Status::Approved)),
            View::AdminDashboard
        );
    }

    #[test]
    fn everything_else_is_account_problem_with_logout_only() {
        let cases = [
            (Role::Student, Status::Rejected),
            (Role::TeacherAdmin, Status::Rejected),
            (Role::Unrecognized("Tamu".into()), Status::Approved),
            (Role::Student, Status::Unrecognized("suspended".into())),
            (Role::default(), Status::Rejected),
        ];
        for (role, status) in cases {
            let view = View::for_profile(&profile(role, status));
            assert_eq!(view, View::AccountProblem);
            assert_eq!(view.actions(), &[Action::Logout]);
        }
    }

    #[test]
    fn dashboards_do_not_cross() {
        assert!(!View::StudentDashboard.permits(Action::ReviewRegistrations));
        assert!(!View::AdminDashboard.permits(Action::RecordAttendance));
        assert!(!View::AdminDashboard.permits(Action::BrowseMaterials));
        assert!(View::StudentDashboard.permits(Action::BrowseMaterials));
        assert!(!View::PendingApproval.permits(Action::BrowseMaterials));
        assert!(View::SignIn.permits(Action::Register));
        assert!(View::Loading.actions().is_empty());
    }
}
