use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::info_span;
use tracing_futures::Instrument;

use crate::backend::{Backend, Collection, Identity, Query, Records, SharedBackend};
use crate::common::{debug, error, info, warn, ErrorKind};
use crate::core::gate::{transition, Effect, Event, GateState, ProfileOutcome, SignOutReason, View};
use crate::core::{Config, Principal, PrincipalId, Profile};
use crate::Result;

pub struct Builder {
    backend: SharedBackend,
    config: Config,
}

impl Builder {
    pub fn new(backend: SharedBackend) -> Self {
        Builder::from_config(backend, Config::default())
    }

    pub fn from_config(backend: SharedBackend, config: Config) -> Self {
        Self { backend, config }
    }

    pub fn build(self) -> (Gate, GateHandle) {
        let (event_send, event_recv) = mpsc::channel(self.config.event_channel_buffer());
        let (command_send, command_recv) = mpsc::channel(self.config.command_channel_buffer());

        let state = GateState::default();
        let (snapshot_send, snapshot_recv) = watch::channel(Snapshot::of(&state));

        let gate = Gate {
            backend: self.backend,
            state,
            event_send,
            event_recv,
            command_recv,
            snapshot_send,
        };
        let handle = GateHandle {
            command_send,
            snapshot_recv,
        };
        (gate, handle)
    }
}

/// What the gate currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub view: View,
    pub principal: Option<Principal>,
    pub profile: Option<Profile>,
    pub loading: bool,
}

impl Snapshot {
    fn of(state: &GateState) -> Self {
        Self {
            view: state.view(),
            principal: state.principal().cloned(),
            profile: state.profile().cloned(),
            loading: state.is_loading(),
        }
    }
}

pub(crate) enum Command {
    // Respond with the snapshot after local state is cleared.
    Logout(oneshot::Sender<Snapshot>),
    Shutdown,
}

/// Single writer of the gate state.
/// Events are applied one at a time, effects run as separate tasks and
/// report back through the event queue.
pub struct Gate {
    backend: SharedBackend,
    state: GateState,
    event_send: mpsc::Sender<Event>,
    event_recv: mpsc::Receiver<Event>,
    command_recv: mpsc::Receiver<Command>,
    snapshot_send: watch::Sender<Snapshot>,
}

impl Gate {
    pub async fn run(mut self, shutdown: impl Future) {
        info!("Gate running");

        // Subscribe before the initial query so no change is missed.
        let mut subscription = self.backend.subscribe();

        let (state, effects) = GateState::initial();
        self.state = state;
        self.publish();
        self.execute(effects);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                command = self.command_recv.recv() => match command {
                    Some(Command::Logout(done)) => {
                        self.apply(Event::LogoutRequested);
                        let _ = done.send(Snapshot::of(&self.state));
                    }
                    Some(Command::Shutdown) | None => break,
                },
                change = subscription.next(), if subscription.is_active() => match change {
                    Some(principal) => self.apply(Event::PrincipalChanged(principal)),
                    None => warn!("Identity change subscription closed"),
                },
                Some(event) = self.event_recv.recv() => self.apply(event),
            }
        }

        subscription.unsubscribe();
        info!("Gate stopped");
    }

    fn apply(&mut self, event: Event) {
        debug!(?event, "Gate event");

        let before = self.state.view();
        let state = std::mem::take(&mut self.state);
        let (state, effects) = transition(state, event);
        self.state = state;

        let after = self.state.view();
        if before != after {
            info!(from=%before, to=%after, "View changed");
        }
        self.publish();
        self.execute(effects);
    }

    fn publish(&self) {
        self.snapshot_send.send_replace(Snapshot::of(&self.state));
    }

    fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            let backend = Arc::clone(&self.backend);
            let events = self.event_send.clone();

            match effect {
                Effect::LoadSession => {
                    tokio::spawn(
                        async move {
                            let session = backend.current_principal().await;
                            let _ = events.send(Event::SessionLoaded(session)).await;
                        }
                        .instrument(info_span!("load_session")),
                    );
                }
                Effect::FetchProfile { lookup, principal } => {
                    let span = info_span!("fetch_profile", %lookup, id=%principal.id());
                    tokio::spawn(
                        async move {
                            let id = principal.id().clone();
                            let outcome = fetch_profile(backend.as_ref(), &id).await;
                            let _ = events
                                .send(Event::ProfileLoaded {
                                    lookup,
                                    principal: id,
                                    outcome,
                                })
                                .await;
                        }
                        .instrument(span),
                    );
                }
                // Never blocks the local transition, which already happened.
                Effect::SignOut { reason, principal } => {
                    tokio::spawn(
                        async move { sign_out(backend.as_ref(), reason, principal.as_ref()).await }
                            .instrument(info_span!("sign_out")),
                    );
                }
            }
        }
    }
}

// A forced sign out leaves alone a session another principal started meanwhile.
async fn sign_out(backend: &dyn Backend, reason: SignOutReason, principal: Option<&PrincipalId>) {
    let result = match principal {
        Some(id) => backend.sign_out_principal(id).await.map(|ended| {
            if !ended {
                debug!(?reason, %id, "No session of the principal left");
            }
        }),
        None => backend.sign_out().await,
    };

    match result {
        Ok(()) => debug!(?reason, "Signed out"),
        Err(err) => warn!(?reason, %err, "Sign out failed"),
    }
}

pub(crate) async fn fetch_profile(backend: &dyn Backend, id: &PrincipalId) -> ProfileOutcome {
    let query = Query::new().eq("id", id.as_str());

    match backend.find_one(Collection::PROFILES, &query).await {
        Ok(Some(record)) => match serde_json::from_value::<Profile>(record) {
            Ok(profile) => ProfileOutcome::Found(profile),
            Err(err) => {
                error!(%err, "Malformed profile record");
                ProfileOutcome::Fault(err.to_string())
            }
        },
        Ok(None) => {
            warn!("Principal without profile");
            ProfileOutcome::NotFound
        }
        Err(err) => {
            error!(%err, "Profile lookup failed");
            ProfileOutcome::Fault(err.to_string())
        }
    }
}

/// Handle to a running gate.
#[derive(Clone)]
pub struct GateHandle {
    command_send: mpsc::Sender<Command>,
    snapshot_recv: watch::Receiver<Snapshot>,
}

impl GateHandle {
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_recv.borrow().clone()
    }

    pub fn view(&self) -> View {
        self.snapshot_recv.borrow().view
    }

    /// Wait until the gate is no longer loading.
    pub async fn settled(&self) -> Result<Snapshot> {
        self.wait_until(|snapshot| !snapshot.loading).await
    }

    pub async fn wait_until(&self, mut predicate: impl FnMut(&Snapshot) -> bool) -> Result<Snapshot> {
        let mut recv = self.snapshot_recv.clone();
        let snapshot = recv
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| ErrorKind::Internal("gate stopped".into()))?;
        Ok(snapshot.clone())
    }

    /// Clear the principal and profile, then sign out from the backend.
    /// Resolves once local state is cleared, a remote fault does not fail it.
    pub async fn logout(&self) -> Result<Snapshot> {
        let (done, recv) = oneshot::channel();
        self.command_send
            .send(Command::Logout(done))
            .await
            .map_err(|_| ErrorKind::Internal("gate stopped".into()))?;
        recv.await
            .map_err(|_| ErrorKind::Internal("gate dropped logout".into()).into())
    }

    pub async fn shutdown(&self) {
        let _ = self.command_send.send(Command::Shutdown).await;
    }
}
