mod config;
pub use self::config::Config;

mod principal;
pub use self::principal::{Principal, PrincipalId};

mod profile;
pub use self::profile::{Profile, Role, Status};

pub mod gate;
pub use self::gate::{Action, Builder, Gate, GateHandle, Snapshot, View};
