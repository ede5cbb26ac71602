//! Desk configuration, read from the environment (and `.env` via dotenvy).

use crate::{DeskError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:4000";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub login_path: String,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }
}

impl DeskConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let timeout_secs = match lookup("ORDERDESK_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| DeskError::Config(format!("ORDERDESK_TIMEOUT_SECS is not a number: {raw}")))?,
            None => defaults.timeout_secs,
        };
        Ok(Self {
            api_url: lookup("ORDERDESK_API_URL").unwrap_or(defaults.api_url),
            token: lookup("ORDERDESK_TOKEN").filter(|t| !t.is_empty()),
            timeout_secs,
            login_path: lookup("ORDERDESK_LOGIN_PATH").unwrap_or(defaults.login_path),
        })
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self { self.api_url = url.into(); self }
    pub fn with_token(mut self, token: impl Into<String>) -> Self { self.token = Some(token.into()); self }
}
