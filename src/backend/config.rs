use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;

use crate::core::{Role, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    // Hosted service over http.
    Rest,
    // In process store.
    Memory,
}

// Backend configuration.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    kind: Option<BackendKind>,
    // Base url of the hosted service.
    url: Option<String>,
    // Public api key sent with every request.
    anon_key: Option<String>,
    // Timeout applied to each http request.
    request_timeout_milliseconds: Option<u64>,
    // Lifetime of sessions issued by the memory backend.
    session_ttl_seconds: Option<u64>,
    // Accounts seeded into the memory backend.
    #[serde(default)]
    pub(crate) accounts: Vec<AccountEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccountEntry {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub status: Status,
}

impl Config {
    const DEFAULT_KIND: BackendKind = BackendKind::Rest;
    const DEFAULT_REQUEST_TIMEOUT_MILLISECONDS: u64 = 10_000;
    const DEFAULT_SESSION_TTL_SECONDS: u64 = 60 * 60;
    const MIN_REQUEST_TIMEOUT_MILLISECONDS: u64 = 100;
    const MIN_SESSION_TTL_SECONDS: u64 = 1;

    pub fn set_kind(&mut self, val: Option<BackendKind>) {
        if let Some(val) = val {
            self.kind = Some(val);
        }
    }
    pub fn set_url(&mut self, val: &mut Option<String>) {
        if let Some(val) = val.take() {
            self.url = Some(val)
        }
    }
    pub fn set_anon_key(&mut self, val: &mut Option<String>) {
        if let Some(val) = val.take() {
            self.anon_key = Some(val)
        }
    }
    pub fn set_request_timeout_milliseconds(&mut self, val: Option<u64>) {
        if let Some(val) = val {
            self.request_timeout_milliseconds = Some(std::cmp::max(val, Config::MIN_REQUEST_TIMEOUT_MILLISECONDS));
        }
    }
    pub fn set_session_ttl_seconds(&mut self, val: Option<u64>) {
        if let Some(val) = val {
            self.session_ttl_seconds = Some(std::cmp::max(val, Config::MIN_SESSION_TTL_SECONDS));
        }
    }

    pub(crate) fn override_merge(&mut self, other: &mut Config) {
        self.set_kind(other.kind);
        self.set_url(&mut other.url);
        self.set_anon_key(&mut other.anon_key);
        self.set_request_timeout_milliseconds(other.request_timeout_milliseconds);
        self.set_session_ttl_seconds(other.session_ttl_seconds);
        self.accounts.append(&mut other.accounts);
    }

    pub fn kind(&self) -> BackendKind {
        self.kind.unwrap_or(Config::DEFAULT_KIND)
    }

    pub(crate) fn url(&self) -> Option<&str> {
        self.url.as_deref().map(|url| url.trim_end_matches('/'))
    }

    pub(crate) fn anon_key(&self) -> Option<&str> {
        self.anon_key.as_deref()
    }

    // File values skip the setters, so the lower bounds apply here too.
    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.request_timeout_milliseconds
                .unwrap_or(Config::DEFAULT_REQUEST_TIMEOUT_MILLISECONDS)
                .max(Config::MIN_REQUEST_TIMEOUT_MILLISECONDS),
        )
    }

    pub(crate) fn session_ttl(&self) -> Duration {
        Duration::from_secs(
            self.session_ttl_seconds
                .unwrap_or(Config::DEFAULT_SESSION_TTL_SECONDS)
                .max(Config::MIN_SESSION_TTL_SECONDS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_merge_prefers_other() {
        let mut file: Config = serde_yaml::from_str(
            r#"
kind: rest
url: https://school.example.com/
anon_key: file-key
request_timeout_milliseconds: 500
"#,
        )
        .unwrap();
        let mut flags = Config::default();
        flags.set_anon_key(&mut Some("flag-key".into()));

        file.override_merge(&mut flags);

        assert_eq!(file.kind(), BackendKind::Rest);
        assert_eq!(file.url(), Some("https://school.example.com"));
        assert_eq!(file.anon_key(), Some("flag-key"));
        assert_eq!(file.request_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn zero_durations_from_file_are_raised() {
        let config: Config = serde_yaml::from_str(
            "request_timeout_milliseconds: 0\nsession_ttl_seconds: 0",
        )
        .unwrap();
        assert_eq!(config.request_timeout(), Duration::from_millis(100));
        assert_eq!(config.session_ttl(), Duration::from_secs(1));
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.kind(), BackendKind::Rest);
        assert_eq!(config.session_ttl(), Duration::from_secs(3600));
    }
}
