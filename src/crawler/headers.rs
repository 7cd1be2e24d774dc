use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, ORIGIN,
    REFERER, USER_AGENT,
};

use crate::session::Session;

/// Build browser-like headers for GraphQL API requests
///
/// # Arguments
///
/// * `user_agent` - User agent string (typically a modern browser UA)
/// * `site_url` - Site origin used for `Origin` and `Referer`
/// * `locale` - Locale such as `vi-VN`; its region also fills the country header
/// * `session` - Cookies to attach, if any
///
/// # Examples
///
/// ```
/// use marquee::crawler::headers::build_api_headers;
/// use marquee::session::Session;
///
/// let headers = build_api_headers(
///     "Mozilla/5.0 (X11; Linux x86_64)",
///     "https://www.imdb.com/",
///     "vi-VN",
///     &Session::parse("session-id=1"),
/// );
/// assert!(headers.contains_key("cookie"));
/// ```
pub fn build_api_headers(
    user_agent: &str,
    site_url: &str,
    locale: &str,
    session: &Session,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    insert_lossy(&mut headers, USER_AGENT, user_agent);
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/graphql+json, application/json"),
    );
    insert_lossy(&mut headers, ACCEPT_LANGUAGE, &accept_language(locale));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    insert_lossy(&mut headers, ORIGIN, site_url.trim_end_matches('/'));
    insert_lossy(&mut headers, REFERER, site_url);

    headers.insert(
        HeaderName::from_static("x-imdb-client-name"),
        HeaderValue::from_static("imdb-web-next"),
    );
    insert_lossy(
        &mut headers,
        HeaderName::from_static("x-imdb-user-language"),
        locale,
    );
    if let Some(country) = locale.split('-').nth(1) {
        insert_lossy(
            &mut headers,
            HeaderName::from_static("x-imdb-user-country"),
            country,
        );
    }

    if let Some(cookie) = session.cookie_header() {
        insert_lossy(&mut headers, COOKIE, &cookie);
    }

    headers
}

/// Build headers for loading a rendered title page
pub fn build_page_headers(user_agent: &str, locale: &str, session: &Session) -> HeaderMap {
    let mut headers = HeaderMap::new();

    insert_lossy(&mut headers, USER_AGENT, user_agent);
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    insert_lossy(&mut headers, ACCEPT_LANGUAGE, &accept_language(locale));

    if let Some(cookie) = session.cookie_header() {
        insert_lossy(&mut headers, COOKIE, &cookie);
    }

    headers
}

/// `vi-VN` → `vi-VN,vi;q=0.9,en-US;q=0.8,en;q=0.7`
fn accept_language(locale: &str) -> String {
    let lang = locale.split('-').next().unwrap_or(locale);
    if lang == "en" {
        format!("{locale},en;q=0.9")
    } else {
        format!("{locale},{lang};q=0.9,en-US;q=0.8,en;q=0.7")
    }
}

// Values that are not valid header text are skipped rather than panicking.
fn insert_lossy(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => tracing::warn!(header = %name, "Skipping header with invalid value"),
    }
}
