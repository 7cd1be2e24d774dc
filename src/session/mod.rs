//! Session bootstrap for the remote API
//!
//! The API only answers requests that carry cookies issued to a real browser
//! visit. Obtaining those cookies is delegated to a [`SessionProvider`]; the
//! crawl engine calls it once at phase start and again whenever a challenge
//! page shows the current session is no longer accepted.
//!
//! Two providers ship with the crate:
//!
//! - [`StaticSession`] replays a fixed cookie set (e.g. exported from a browser)
//! - [`HomepageSession`] visits the site origin and keeps the cookies it sets
//!
//! A browser-driven provider lives outside this crate and only needs to
//! implement the trait.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::utils::error::SessionError;

/// Cookies that make up one browser-derived session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    cookies: Vec<(String, String)>,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a session from name/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut session = Self::new();
        for (name, value) in pairs {
            session.insert(name, value);
        }
        session
    }

    /// Parse a `Cookie` header value (`a=1; b=2`)
    pub fn parse(header: &str) -> Self {
        Self::from_pairs(header.split(';').filter_map(|part| {
            let (name, value) = part.trim().split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        }))
    }

    /// Insert or replace a cookie, keeping first-seen order
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.cookies.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.cookies.push((name, value)),
        }
    }

    /// Look up a cookie value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Render as a `Cookie` header value, or `None` when empty
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(n, v)| format!("{n}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Source of valid sessions for the remote API
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Obtain a fresh cookie set
    async fn bootstrap(&self) -> Result<Session, SessionError>;
}

/// Provider that always returns the same cookies
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    session: Session,
}

impl StaticSession {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Read a `Cookie` header value from an environment variable
    pub fn from_env(key: &str) -> Self {
        let session = std::env::var(key)
            .map(|v| Session::parse(&v))
            .unwrap_or_default();
        Self { session }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn bootstrap(&self) -> Result<Session, SessionError> {
        Ok(self.session.clone())
    }
}

/// Provider that visits the site origin and keeps the cookies it sets
pub struct HomepageSession {
    client: Client,
    site_url: String,
}

impl HomepageSession {
    /// Create a provider for the given site origin
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Http` if the HTTP client cannot be created
    pub fn new(site_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, SessionError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .cookie_store(true)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            site_url: site_url.to_string(),
        })
    }
}

#[async_trait]
impl SessionProvider for HomepageSession {
    async fn bootstrap(&self) -> Result<Session, SessionError> {
        tracing::info!(site = %self.site_url, "Bootstrapping session from homepage");

        let response = self.client.get(&self.site_url).send().await?;
        let status = response.status();

        let session = Session::from_pairs(
            response
                .cookies()
                .map(|c| (c.name().to_string(), c.value().to_string())),
        );

        if !status.is_success() {
            return Err(SessionError::Bootstrap(format!(
                "homepage returned status {status}"
            )));
        }

        if session.is_empty() {
            return Err(SessionError::Bootstrap(
                "homepage did not set any cookies".to_string(),
            ));
        }

        tracing::info!(cookies = session.len(), "Session bootstrapped");
        Ok(session)
    }
}
