//! Discogs API Client
//!
//! Release metadata lookups against the public Discogs API, paced by a
//! per-run throttle so sequential imports stay under the anonymous rate
//! limit. A 429 answer is retried exactly once after honoring Retry-After;
//! any other failed status marks the release as having no artwork for the
//! rest of the run.

use crate::error::{ImportError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use vault_traits::http::{HttpClient, HttpRequest, HttpResponse};
use vault_traits::time::{Clock, Sleeper, SystemClock, TokioSleeper};

/// Minimum spacing between consecutive Discogs API requests.
pub const MIN_REQUEST_INTERVAL_MS: i64 = 1200;

const API_BASE: &str = "https://api.discogs.com";
const USER_AGENT: &str = "VinylCatalogTools/0.5.0 (+https://obsidian.md)";

/// Per-run throttle and lookup memo.
///
/// `image_url_cache` maps release ids to their primary image URL; an empty
/// string records a definitive miss so the same id is never re-queried
/// within one run.
#[derive(Debug, Default)]
pub struct ThrottleState {
    last_request_ms: i64,
    image_url_cache: HashMap<String, String>,
}

impl ThrottleState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Throttled client for the Discogs release endpoint.
pub struct DiscogsClient {
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl DiscogsClient {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self::with_parts(http, Arc::new(SystemClock), Arc::new(TokioSleeper))
    }

    /// Construct with explicit time sources, used by tests to drive the
    /// throttle deterministically.
    pub fn with_parts(
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            http,
            clock,
            sleeper,
        }
    }

    /// Wait until at least [`MIN_REQUEST_INTERVAL_MS`] has passed since the
    /// previous request recorded in `state`, then stamp the current time.
    async fn throttle(&self, state: &mut ThrottleState) {
        let now = self.clock.unix_timestamp_millis();
        let wait_ms = state.last_request_ms + MIN_REQUEST_INTERVAL_MS - now;
        if wait_ms > 0 {
            self.sleeper.sleep(Duration::from_millis(wait_ms as u64)).await;
        }
        state.last_request_ms = self.clock.unix_timestamp_millis();
    }

    fn release_request(&self, release_id: &str) -> HttpRequest {
        HttpRequest::get(format!(
            "{API_BASE}/releases/{}",
            urlencoding::encode(release_id)
        ))
        .header("accept", "application/json")
        .header("user-agent", USER_AGENT)
    }

    /// Primary image URL for a release, or `None` if the release has no
    /// artwork or the lookup failed with a client/server status.
    ///
    /// Results (including misses) are memoized in `state`, so repeated ids
    /// within one run cost a single request.
    pub async fn release_image_url(
        &self,
        release_id: &str,
        state: &mut ThrottleState,
    ) -> Result<Option<String>> {
        let key = release_id.trim();
        if key.is_empty() {
            return Ok(None);
        }
        if let Some(cached) = state.image_url_cache.get(key) {
            return Ok(non_empty(cached.clone()));
        }

        self.throttle(state).await;
        let response = self.http.execute(self.release_request(key)).await?;

        if response.status >= 400 {
            if response.status == 429 {
                let retry_after_secs = response
                    .header("retry-after")
                    .and_then(|value| value.trim().parse::<f64>().ok())
                    .unwrap_or(2.0);
                let wait_ms = ((retry_after_secs * 1000.0).max(1000.0)) as u64;
                warn!(release_id = key, wait_ms, "Rate limited by Discogs, retrying once");

                self.sleeper.sleep(Duration::from_millis(wait_ms)).await;
                self.throttle(state).await;
                let retry = self.http.execute(self.release_request(key)).await?;
                if retry.status >= 400 {
                    state.image_url_cache.insert(key.to_string(), String::new());
                    return Ok(None);
                }
                let url = first_image_url(&retry)?;
                state.image_url_cache.insert(key.to_string(), url.clone());
                return Ok(non_empty(url));
            }

            debug!(release_id = key, status = response.status, "Release lookup failed");
            state.image_url_cache.insert(key.to_string(), String::new());
            return Ok(None);
        }

        let url = first_image_url(&response)?;
        state.image_url_cache.insert(key.to_string(), url.clone());
        Ok(non_empty(url))
    }

    /// Download an image body. Status policy is left to the caller.
    pub async fn fetch_image(&self, url: &str) -> Result<HttpResponse> {
        let request = HttpRequest::get(url)
            .header("accept", "image/*,*/*")
            .header("user-agent", USER_AGENT);
        Ok(self.http.execute(request).await?)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReleasePayload {
    #[serde(default)]
    images: Vec<ReleaseImage>,
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseImage {
    #[serde(default)]
    uri: String,
    #[serde(default)]
    uri150: String,
}

fn first_image_url(response: &HttpResponse) -> Result<String> {
    let payload: ReleasePayload = serde_json::from_slice(&response.body)
        .map_err(|e| ImportError::JsonParse(e.to_string()))?;
    let url = payload
        .images
        .first()
        .map(|image| {
            let full = image.uri.trim();
            if full.is_empty() {
                image.uri150.trim()
            } else {
                full
            }
        })
        .unwrap_or("");
    Ok(url.to_string())
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
