mod root;
pub use root::{parse, Command, PortalOptions, SiakadCommand};

mod session;
pub(crate) use session::Session;

pub mod account;
pub mod admin;
pub mod student;
pub mod view;
