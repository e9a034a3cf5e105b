//! Session/profile authorization gate.
//!
//! Decides which top level view the current principal may see. The decision
//! logic is the pure [`transition`] function; [`Gate`] drives it from an event
//! queue fed by the identity collaborator and by its own effects.

mod state;
pub use self::state::{
    transition, Effect, Event, GateState, LookupId, Phase, ProfileOutcome, SignOutReason,
};

mod view;
pub use self::view::{Action, View};

mod runtime;
pub use self::runtime::{Builder, Gate, GateHandle, Snapshot};
