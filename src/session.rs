//! Operator session and notices.
//!
//! The token lives here and is handed to each API call explicitly.

use chrono::{DateTime, Utc};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A toast shown to the operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into(), at: Utc::now() }
    }
    pub fn success(message: impl Into<String>) -> Self { Self::new(NoticeLevel::Success, message) }
    pub fn info(message: impl Into<String>) -> Self { Self::new(NoticeLevel::Info, message) }
    pub fn error(message: impl Into<String>) -> Self { Self::new(NoticeLevel::Error, message) }
}

#[derive(Clone, Debug)]
pub struct Session {
    token: Option<String>,
    login_path: String,
    redirect: Option<String>,
}

impl Session {
    pub fn new(token: Option<String>, login_path: impl Into<String>) -> Self {
        Self { token: token.filter(|t| !t.is_empty()), login_path: login_path.into(), redirect: None }
    }

    pub fn token(&self) -> Option<&str> { self.token.as_deref() }
    pub fn is_logged_in(&self) -> bool { self.token.is_some() }

    /// Drop the token and remember where the operator must go next.
    pub fn logout(&mut self) {
        if self.token.take().is_some() {
            warn!(login = %self.login_path, "session ended, redirecting to login");
        }
        self.redirect = Some(self.login_path.clone());
    }

    /// Pending login redirect, if the session was ended.
    pub fn redirect(&self) -> Option<&str> { self.redirect.as_deref() }

    pub fn login(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
        self.redirect = None;
    }
}
