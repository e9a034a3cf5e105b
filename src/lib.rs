#![allow(clippy::module_inception)]

pub mod backend;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod portal;

pub use crate::error::SiakadError;
pub type Result<T, E = crate::error::SiakadError> = std::result::Result<T, E>;

pub use crate::core::{Principal, PrincipalId, Profile, Role, Status, View};

pub(crate) mod common {
    pub(crate) type Result<T, E = crate::error::internal::Error> = std::result::Result<T, E>;

    pub(crate) type Error = crate::error::internal::Error;
    pub(crate) type ErrorKind = crate::error::internal::ErrorKind;

    pub use crate::error::SiakadError;

    pub(crate) type Time = chrono::DateTime<chrono::Utc>;

    pub use tracing::{debug, error, info, trace, warn};
}
