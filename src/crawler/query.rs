//! Persisted-query request construction
//!
//! Every page request is a GET against the GraphQL endpoint carrying three
//! query parameters: `operationName`, percent-encoded `variables` JSON and
//! percent-encoded `extensions` JSON with the pinned query hash. Page sizes
//! are fixed per query kind and never chosen by callers.

use serde_json::{json, Map, Value};
use url::Url;

use crate::config::ApiConfig;

/// Page size for catalog searches
pub const CATALOG_PAGE_SIZE: u32 = 100;

/// Page size for title reviews
pub const REVIEW_PAGE_SIZE: u32 = 25;

/// How the cursor is carried in the variables on the first page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstPageCursor {
    /// Leave `after` out entirely
    Omit,
    /// Send `after: ""`
    Empty,
}

/// One paginated persisted query, minus the cursor
#[derive(Debug, Clone, PartialEq)]
pub struct PagedQuery {
    operation_name: &'static str,
    query_hash: String,
    variables: Map<String, Value>,
    connection_path: &'static [&'static str],
    first_page: FirstPageCursor,
}

impl PagedQuery {
    /// Catalog search: titles by primary country, most popular first
    pub fn catalog(api: &ApiConfig) -> Self {
        let variables = json!({
            "first": CATALOG_PAGE_SIZE,
            "locale": api.locale,
            "originCountryConstraint": {
                "anyPrimaryCountries": [api.origin_country]
            },
            "sortBy": "POPULARITY",
            "sortOrder": "ASC"
        });

        Self {
            operation_name: "AdvancedTitleSearch",
            query_hash: api.catalog_query_hash.clone(),
            variables: into_map(variables),
            connection_path: &["advancedTitleSearch"],
            first_page: FirstPageCursor::Omit,
        }
    }

    /// Reviews for one title, most helpful first
    pub fn reviews(api: &ApiConfig, title_id: &str) -> Self {
        let variables = json!({
            "const": title_id,
            "filter": {},
            "first": REVIEW_PAGE_SIZE,
            "locale": api.locale,
            "sort": {
                "by": "HELPFULNESS_SCORE",
                "order": "DESC"
            }
        });

        Self {
            operation_name: "TitleReviewsRefine",
            query_hash: api.review_query_hash.clone(),
            variables: into_map(variables),
            connection_path: &["title", "reviews"],
            first_page: FirstPageCursor::Empty,
        }
    }

    pub fn operation_name(&self) -> &'static str {
        self.operation_name
    }

    /// Path from `data` to the connection object holding `edges`/`pageInfo`
    pub fn connection_path(&self) -> &'static [&'static str] {
        self.connection_path
    }

    /// Variables for the page that starts at `cursor`
    pub fn variables(&self, cursor: Option<&str>) -> Value {
        let mut vars = self.variables.clone();
        match (cursor, self.first_page) {
            (Some(c), _) => {
                vars.insert("after".to_string(), Value::String(c.to_string()));
            }
            (None, FirstPageCursor::Empty) => {
                vars.insert("after".to_string(), Value::String(String::new()));
            }
            (None, FirstPageCursor::Omit) => {}
        }
        Value::Object(vars)
    }

    /// Extensions carrying the pinned query identifier
    pub fn extensions(&self) -> Value {
        json!({
            "persistedQuery": {
                "sha256Hash": self.query_hash,
                "version": 1
            }
        })
    }

    /// Full request URL for the page that starts at `cursor`
    pub fn url(&self, base: &Url, cursor: Option<&str>) -> Url {
        let mut url = base.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("operationName", self.operation_name)
            .append_pair("variables", &self.variables(cursor).to_string())
            .append_pair("extensions", &self.extensions().to_string());
        url
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
