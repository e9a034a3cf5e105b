use std::fmt;

use crate::common::{debug, trace};
use crate::core::gate::View;
use crate::core::{Principal, PrincipalId, Profile};

/// Identifies one profile lookup.
/// A lookup result is committed only while its id is still the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupId(u64);

impl fmt::Display for LookupId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Initializing,
    ResolvingProfile {
        principal: Principal,
        lookup: LookupId,
    },
    Authenticated {
        principal: Principal,
        profile: Profile,
    },
    Unauthenticated,
}

/// Gate state. A profile only exists together with the principal it was resolved for.
#[derive(Debug, Clone, PartialEq)]
pub struct GateState {
    phase: Phase,
    next_lookup: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // Result of the initial session query.
    SessionLoaded(Option<Principal>),
    // Identity change notification.
    PrincipalChanged(Option<Principal>),
    ProfileLoaded {
        lookup: LookupId,
        principal: PrincipalId,
        outcome: ProfileOutcome,
    },
    LogoutRequested,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileOutcome {
    Found(Profile),
    NotFound,
    Fault(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadSession,
    FetchProfile {
        lookup: LookupId,
        principal: Principal,
    },
    /// End the backend session. With `principal` set, only a session still
    /// belonging to that principal is ended.
    SignOut {
        reason: SignOutReason,
        principal: Option<PrincipalId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    UserRequested,
    // Principal without profile record.
    ProfileNotFound,
    // Profile lookup failed.
    ProfileFault,
}

impl GateState {
    /// Initial state and the effects run on entry.
    pub fn initial() -> (GateState, Vec<Effect>) {
        (GateState::default(), vec![Effect::LoadSession])
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn principal(&self) -> Option<&Principal> {
        match &self.phase {
            Phase::ResolvingProfile { principal, .. } | Phase::Authenticated { principal, .. } => {
                Some(principal)
            }
            Phase::Initializing | Phase::Unauthenticated => None,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match &self.phase {
            Phase::Authenticated { profile, .. } => Some(profile),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            Phase::Initializing | Phase::ResolvingProfile { .. }
        )
    }

    pub fn view(&self) -> View {
        match &self.phase {
            Phase::Initializing | Phase::ResolvingProfile { .. } => View::Loading,
            Phase::Authenticated { profile, .. } => View::for_profile(profile),
            Phase::Unauthenticated => View::SignIn,
        }
    }

    fn resolve(self, principal: Principal) -> (GateState, Vec<Effect>) {
        let lookup = LookupId(self.next_lookup);
        debug!(id=%principal.id(), %lookup, "Resolving profile");
        let state = GateState {
            phase: Phase::ResolvingProfile {
                principal: principal.clone(),
                lookup,
            },
            next_lookup: self.next_lookup + 1,
        };
        (state, vec![Effect::FetchProfile { lookup, principal }])
    }

    fn unauthenticated(self) -> (GateState, Vec<Effect>) {
        let state = GateState {
            phase: Phase::Unauthenticated,
            ..self
        };
        (state, Vec::new())
    }

    fn signed_out(self, reason: SignOutReason, principal: Option<PrincipalId>) -> (GateState, Vec<Effect>) {
        let (state, _) = self.unauthenticated();
        (state, vec![Effect::SignOut { reason, principal }])
    }

    fn unchanged(self) -> (GateState, Vec<Effect>) {
        (self, Vec::new())
    }
}

impl Default for GateState {
    fn default() -> Self {
        Self {
            phase: Phase::Initializing,
            next_lookup: 1,
        }
    }
}

/// Compute the next state. Pure, all I/O is requested through the returned effects.
pub fn transition(state: GateState, event: Event) -> (GateState, Vec<Effect>) {
    match event {
        // A change notification may already have superseded the initial query.
        Event::SessionLoaded(_) if !matches!(state.phase, Phase::Initializing) => {
            trace!("Stale session query result ignored");
            state.unchanged()
        }
        Event::SessionLoaded(Some(principal)) => state.resolve(principal),
        Event::SessionLoaded(None) => state.unauthenticated(),
        Event::PrincipalChanged(Some(principal)) => state.resolve(principal),
        Event::PrincipalChanged(None) if matches!(state.phase, Phase::Unauthenticated) => {
            state.unchanged()
        }
        Event::PrincipalChanged(None) => state.unauthenticated(),
        Event::ProfileLoaded {
            lookup,
            principal,
            outcome,
        } => {
            let current = match &state.phase {
                Phase::ResolvingProfile {
                    principal: current,
                    lookup: current_lookup,
                } if *current_lookup == lookup && current.id() == &principal => {
                    Some(current.clone())
                }
                _ => None,
            };
            let current = match current {
                Some(current) => current,
                None => {
                    debug!(%lookup, id=%principal, "Superseded profile lookup discarded");
                    return state.unchanged();
                }
            };

            match outcome {
                ProfileOutcome::Found(profile) if profile.id == principal => GateState {
                    phase: Phase::Authenticated {
                        principal: current,
                        profile,
                    },
                    ..state
                }
                .unchanged(),
                ProfileOutcome::Found(_) | ProfileOutcome::Fault(_) => {
                    state.signed_out(SignOutReason::ProfileFault, Some(principal))
                }
                ProfileOutcome::NotFound => {
                    state.signed_out(SignOutReason::ProfileNotFound, Some(principal))
                }
            }
        }
        // Local state is cleared whatever the remote sign out does.
        Event::LogoutRequested => state.signed_out(SignOutReason::UserRequested, None),
    }
}
