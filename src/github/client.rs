//! GitHub REST API client.
//!
//! Shared request plumbing for the follower and detail collaborators:
//! headers, error mapping, pagination links and rate limit headers.

use crate::error::FetchError;
use crate::models::RateLimitInfo;
use crate::pipeline::Fetched;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// GitHub never returns more than this many items per page.
pub const MAX_PER_PAGE: usize = 100;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Configuration for the GitHub client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout_seconds: u64,
    /// Items requested per followers page.
    pub per_page: usize,
    /// Detail lookups kept in flight at once.
    pub concurrency: usize,
    pub show_progress: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            timeout_seconds: 30,
            per_page: MAX_PER_PAGE,
            concurrency: 8,
            show_progress: false,
        }
    }
}

impl From<&crate::config::GitHubConfig> for ClientConfig {
    fn from(config: &crate::config::GitHubConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            timeout_seconds: config.timeout_seconds,
            per_page: config.per_page,
            concurrency: config.concurrency,
            show_progress: config.show_progress,
        }
    }
}

/// Client for the two GitHub endpoints used by the ranking.
pub struct GitHubClient {
    pub(crate) config: ClientConfig,
    http: reqwest::Client,
}

impl GitHubClient {
    pub fn new(mut config: ClientConfig) -> Result<Self, reqwest::Error> {
        config.api_url = config.api_url.trim_end_matches('/').to_string();
        config.per_page = config.per_page.clamp(1, MAX_PER_PAGE);
        config.concurrency = config.concurrency.max(1);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether `url` lies under the configured API base. Only such URLs
    /// are sent the access token.
    pub fn is_api_url(&self, url: &str) -> bool {
        url.strip_prefix(self.config.api_url.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
    }

    /// Details endpoint for one account.
    pub fn user_url(&self, login: &str) -> String {
        format!("{}/users/{}", self.config.api_url, urlencoding::encode(login))
    }

    fn request(&self, url: &str, user_agent: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self
            .http
            .get(url)
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, GITHUB_ACCEPT);

        match token {
            Some(token) => builder.header(AUTHORIZATION, format!("token {}", token)),
            None => builder,
        }
    }

    /// GET a JSON document. On success also returns the next page URL, if any.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        user_agent: &str,
        token: Option<&str>,
    ) -> Fetched<(T, Option<String>)> {
        debug!("GET {}", url);

        let response = match self.request(url, user_agent, token).send().await {
            Ok(response) => response,
            Err(e) => return Fetched::err(self.transport_error(&e), None),
        };

        let rate_limit = rate_limit_from_headers(response.headers());
        let next = next_page_url(response.headers());
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Fetched::err(
                FetchError::new(status.as_u16(), error_message(status, &body)),
                rate_limit,
            );
        }

        match response.json::<T>().await {
            Ok(value) => Fetched::ok((value, next), rate_limit),
            Err(e) => Fetched::err(
                FetchError::new(
                    StatusCode::BAD_GATEWAY.as_u16(),
                    format!("Failed to parse GitHub response from {}: {}", url, e),
                ),
                rate_limit,
            ),
        }
    }

    fn transport_error(&self, e: &reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::new(
                StatusCode::REQUEST_TIMEOUT.as_u16(),
                format!("Request timed out after {}s", self.config.timeout_seconds),
            )
        } else if e.is_connect() {
            FetchError::new(
                StatusCode::BAD_GATEWAY.as_u16(),
                format!("Cannot connect to GitHub at {}", self.config.api_url),
            )
        } else {
            FetchError::new(
                StatusCode::BAD_GATEWAY.as_u16(),
                format!("Failed to send request: {}", e),
            )
        }
    }
}

/// The `message` field of a GitHub error body, else the status reason.
pub fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json["message"].as_str().map(String::from))
        .or_else(|| status.canonical_reason().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

/// Read `x-ratelimit-*` headers. All three must be present and numeric.
pub fn rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let number = |name: &str| -> Option<u64> {
        headers.get(name)?.to_str().ok()?.trim().parse().ok()
    };

    let limit = number("x-ratelimit-limit")?;
    let remaining = number("x-ratelimit-remaining")?;
    let reset_secs = i64::try_from(number("x-ratelimit-reset")?).ok()?;
    let reset = DateTime::<Utc>::from_timestamp(reset_secs, 0)?;

    Some(RateLimitInfo {
        limit,
        remaining,
        reset,
    })
}

fn next_page_url(headers: &HeaderMap) -> Option<String> {
    parse_next_link(headers.get(LINK)?.to_str().ok()?)
}

/// Find the `rel="next"` target in a `Link` header value.
pub fn parse_next_link(link: &str) -> Option<String> {
    link.split(',').find_map(|part| {
        let mut sections = part.split(';');
        let target = sections.next()?.trim();
        let is_next = sections.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(String::from)
    })
}
