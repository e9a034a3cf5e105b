use serde::Deserialize;

use crate::backend;
use crate::core;

#[derive(Deserialize, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: backend::Config,
    #[serde(default)]
    pub gate: core::Config,
}
