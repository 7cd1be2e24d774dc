//! Paginated GraphQL fetcher
//!
//! This module issues exactly one HTTP request per page and classifies the
//! outcome. It never retries and never sleeps: retry and rate-limiting policy
//! belong to the crawl loop.
//!
//! - 200 with a `data` member → [`Page`] (missing `pageInfo` means no more pages)
//! - 200 without `data` → `FetchError::Rejected`
//! - 200 whose body is not JSON → `FetchError::Envelope`
//! - non-200 with the challenge marker in the body → `FetchError::SessionInvalid`
//! - any other non-200 → `FetchError::Status`
//! - timeouts and connection failures → `FetchError::Timeout` / `FetchError::Transport`

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use crate::config::ApiConfig;
use crate::crawler::headers::build_api_headers;
use crate::crawler::query::PagedQuery;
use crate::session::Session;
use crate::utils::error::{CrawlerError, FetchError};
use crate::utils::truncate_text;

/// Pagination metadata of one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// One decoded page of edges
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub edges: Vec<Value>,
    pub page_info: PageInfo,
}

impl Page {
    pub fn new(edges: Vec<Value>, has_next_page: bool, end_cursor: Option<&str>) -> Self {
        Self {
            edges,
            page_info: PageInfo {
                has_next_page,
                end_cursor: end_cursor.map(str::to_string),
            },
        }
    }

    pub fn has_more(&self) -> bool {
        self.page_info.has_next_page
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.page_info.end_cursor.as_deref()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPageInfo {
    #[serde(default)]
    has_next_page: Option<bool>,
    #[serde(default)]
    end_cursor: Option<String>,
}

/// Decode a response envelope `{data: {<path...>: {edges, pageInfo}}}`
///
/// A missing `data` member means the API rejected the query. A missing connection object
/// or `pageInfo` is an empty/last page, not an error.
pub fn decode_envelope(body: &Value, connection_path: &[&str]) -> Result<Page, FetchError> {
    let data = match body.get("data") {
        Some(d) if d.is_object() => d,
        _ => {
            let reason = body
                .get("errors")
                .map(|e| truncate_text(&e.to_string(), 200))
                .unwrap_or_else(|| "response has no data member".to_string());
            return Err(FetchError::Rejected(reason));
        }
    };

    let connection = connection_path
        .iter()
        .try_fold(data, |node, key| node.get(*key).filter(|v| v.is_object()));

    let Some(connection) = connection else {
        return Ok(Page::default());
    };

    let edges = match connection.get("edges") {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let page_info = connection
        .get("pageInfo")
        .and_then(|v| serde_json::from_value::<RawPageInfo>(v.clone()).ok())
        .unwrap_or_default();

    Ok(Page {
        edges,
        page_info: PageInfo {
            has_next_page: page_info.has_next_page.unwrap_or(false),
            end_cursor: page_info.end_cursor,
        },
    })
}

/// Anything that can produce one page for a query and cursor
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page that starts at `cursor` (`None` = first page)
    async fn fetch_page(&self, query: &PagedQuery, cursor: Option<&str>)
        -> Result<Page, FetchError>;

    /// Replace the session used for subsequent requests
    async fn install_session(&self, session: Session);
}

/// HTTP implementation of [`PageSource`] for the GraphQL endpoint
pub struct GraphQlFetcher {
    client: Client,
    base_url: Url,
    site_url: String,
    user_agent: String,
    locale: String,
    challenge_marker: String,
    session: RwLock<Session>,
}

impl GraphQlFetcher {
    /// Create a fetcher from API configuration
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::Config` for an unparseable base URL and
    /// `CrawlerError::Fetch` if the HTTP client cannot be created
    pub fn new(api: &ApiConfig) -> Result<Self, CrawlerError> {
        let base_url = Url::parse(&api.base_url)
            .map_err(|e| CrawlerError::Config(format!("api.base_url: {e}")))?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(api.request_timeout_secs))
            .gzip(true)
            .build()
            .map_err(FetchError::from)?;

        Ok(Self {
            client,
            base_url,
            site_url: api.site_url.clone(),
            user_agent: api.user_agent.clone(),
            locale: api.locale.clone(),
            challenge_marker: api.challenge_marker.clone(),
            session: RwLock::new(Session::new()),
        })
    }

    /// Snapshot of the session currently in use
    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }
}

#[async_trait]
impl PageSource for GraphQlFetcher {
    async fn fetch_page(
        &self,
        query: &PagedQuery,
        cursor: Option<&str>,
    ) -> Result<Page, FetchError> {
        let url = query.url(&self.base_url, cursor);
        let headers = {
            let session = self.session.read().await;
            build_api_headers(&self.user_agent, &self.site_url, &self.locale, &session)
        };

        tracing::debug!(
            operation = query.operation_name(),
            cursor = ?cursor,
            "Fetching page"
        );

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Transport(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Transport(e)
            }
        })?;

        if status != StatusCode::OK {
            let challenged = body.contains(&self.challenge_marker);
            tracing::warn!(
                status = status.as_u16(),
                challenged,
                body = %truncate_text(&body, 300),
                "API request failed"
            );
            return Err(if challenged {
                FetchError::SessionInvalid {
                    status: status.as_u16(),
                }
            } else {
                FetchError::Status(status.as_u16())
            });
        }

        let envelope: Value = serde_json::from_str(&body)
            .map_err(|e| FetchError::Envelope(format!("invalid JSON: {e}")))?;

        let page = decode_envelope(&envelope, query.connection_path())?;

        tracing::debug!(
            edges = page.edges.len(),
            has_next_page = page.page_info.has_next_page,
            end_cursor = ?page.page_info.end_cursor,
            "Page decoded"
        );

        Ok(page)
    }

    async fn install_session(&self, session: Session) {
        *self.session.write().await = session;
    }
}
