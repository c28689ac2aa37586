//! HTTP client for GitHub traffic endpoints
//!
//! All requests carry the configured bearer token and a bounded timeout.
//! Non-success statuses map onto the error taxonomy in
//! [`crate::error::Error`]: 401/403 to `Auth`, 404 to `NotFound`, quota
//! exhaustion to `RateLimited`, elapsed timeouts to `Timeout`.
//!
//! No call retries: a failed request surfaces to the caller, which skips
//! the repository or aborts the run depending on the error class.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{Response, StatusCode};

use crate::config::{GithubConfig, Token};
use crate::error::{Error, Result};
use crate::types::{DailyCount, Metric, PopularKind, RateLimitStatus, RepoId};

use super::models::{PopularEntry, RateLimitResponse, RepoEntry, TrafficPoint, TrafficResponse};

/// Client for GitHub's traffic, popular, rate-limit, and repo-listing
/// endpoints.
pub struct GithubClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GithubClient {
    /// Create a client from configuration and a resolved token.
    pub fn new(config: &GithubConfig, token: &Token) -> Result<Self> {
        let base_url = config.api_url.trim_end_matches('/').to_string();

        // Build default headers
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("repopulse"));

        let auth_value = format!("Bearer {}", token.as_str());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| Error::Config(format!("invalid token: {}", e)))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Fetch the per-day series for one metric of a repository.
    ///
    /// `GET /repos/{owner}/{repo}/traffic/{views|clones}?per=day`
    ///
    /// Returns at most 14 days, oldest first. The series is sorted by
    /// date after decoding rather than trusting response order.
    pub async fn fetch_traffic(&self, repo: &RepoId, metric: Metric) -> Result<Vec<DailyCount>> {
        let url = format!(
            "{}/repos/{}/{}/traffic/{}",
            self.base_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            metric.as_str()
        );

        let response = self
            .http_client
            .get(&url)
            .query(&[("per", "day")])
            .send()
            .await
            .map_err(request_error)?;
        let response = self
            .check_status(response, &format!("{} for {}", metric, repo))
            .await?;

        let body: TrafficResponse = response
            .json()
            .await
            .map_err(|e| Error::Api(format!("failed to parse response: {}", e)))?;

        let mut days = body
            .days
            .iter()
            .map(parse_point)
            .collect::<Result<Vec<_>>>()?;
        days.sort_by_key(|d| d.date);
        Ok(days)
    }

    /// Fetch the ranked referrers or paths snapshot for a repository.
    ///
    /// `GET /repos/{owner}/{repo}/traffic/popular/{referrers|paths}`
    ///
    /// Entries arrive sorted by count descending; order is preserved.
    pub async fn fetch_popular(
        &self,
        repo: &RepoId,
        kind: PopularKind,
    ) -> Result<Vec<PopularEntry>> {
        let url = format!(
            "{}/repos/{}/{}/traffic/popular/{}",
            self.base_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            kind.as_str()
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(request_error)?;
        let response = self
            .check_status(response, &format!("popular {} for {}", kind, repo))
            .await?;

        response
            .json()
            .await
            .map_err(|e| Error::Api(format!("failed to parse response: {}", e)))
    }

    /// Fetch the current core API quota.
    ///
    /// `GET /rate_limit`
    pub async fn fetch_rate_limit(&self) -> Result<RateLimitStatus> {
        let url = format!("{}/rate_limit", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(request_error)?;
        let response = self.check_status(response, "rate limit").await?;

        let body: RateLimitResponse = response
            .json()
            .await
            .map_err(|e| Error::Api(format!("failed to parse response: {}", e)))?;

        Ok(RateLimitStatus {
            limit: body.resources.core.limit,
            remaining: body.resources.core.remaining,
            reset_at: epoch_to_utc(body.resources.core.reset),
        })
    }

    /// List repositories owned by the authenticated user.
    ///
    /// `GET /user/repos?affiliation=owner&per_page=100`, following
    /// RFC 5988 `Link: rel="next"` pagination.
    pub async fn list_repos(&self) -> Result<Vec<RepoId>> {
        let mut url = format!("{}/user/repos?affiliation=owner&per_page=100", self.base_url);
        let mut repos = Vec::new();

        loop {
            let response = self
                .http_client
                .get(&url)
                .send()
                .await
                .map_err(request_error)?;
            let response = self.check_status(response, "repository listing").await?;

            let next = next_page(response.headers());
            let page: Vec<RepoEntry> = response
                .json()
                .await
                .map_err(|e| Error::Api(format!("failed to parse response: {}", e)))?;

            repos.extend(
                page.into_iter()
                    .map(|entry| RepoId::new(entry.owner.login, entry.name)),
            );

            match next {
                Some(next_url) => url = next_url,
                None => break,
            }
        }

        Ok(repos)
    }

    /// Map a non-success status onto the error taxonomy.
    async fn check_status(&self, response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Quota exhaustion arrives as 403 (or 429) with the remaining
        // header at zero; distinguish it from a rejected token.
        if rate_limit_exhausted(status, response.headers()) {
            return Err(Error::RateLimited {
                reset_at: reset_time(response.headers()),
            });
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(Error::Auth(format!("{} rejected with {}", what, status)))
            }
            StatusCode::NOT_FOUND => Err(Error::NotFound(what.to_string())),
            _ => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown".to_string());
                Err(Error::Api(format!("{} failed ({}): {}", what, status, body)))
            }
        }
    }
}

/// Map a reqwest transport error, surfacing timeouts distinctly.
fn request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout(error.to_string())
    } else {
        Error::Api(format!("HTTP request failed: {}", error))
    }
}

/// Decode one wire point into a daily count.
fn parse_point(point: &TrafficPoint) -> Result<DailyCount> {
    let date = DateTime::parse_from_rfc3339(&point.timestamp)
        .map_err(|e| Error::Api(format!("bad timestamp {:?}: {}", point.timestamp, e)))?
        .date_naive();

    Ok(DailyCount {
        date,
        count: point.count,
        uniques: point.uniques,
    })
}

fn rate_limit_exhausted(status: StatusCode, headers: &HeaderMap) -> bool {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return false;
    }
    headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "0")
        .unwrap_or(false)
}

/// Parse `x-ratelimit-reset` (epoch seconds); falls back to now when the
/// header is missing or malformed.
fn reset_time(headers: &HeaderMap) -> DateTime<Utc> {
    headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .map(epoch_to_utc)
        .unwrap_or_else(Utc::now)
}

fn epoch_to_utc(epoch: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(epoch, 0).single().unwrap_or_else(Utc::now)
}

/// Extract the rel="next" target from an RFC 5988 `Link` header.
fn next_page(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if params.contains("rel=\"next\"") {
            Some(
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string(),
            )
        } else {
            None
        }
    })
}
