mod initialize;
pub use initialize::{Initializer, Portal};

mod config;
pub use config::Config;

pub mod env {
    pub const LOG_DIRECTIVE: &str = "SIAKAD_LOG";
}
