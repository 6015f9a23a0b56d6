//! Cloudflare cache purge adapter
//!
//! Exact patterns are purged by URL (`files`), directory wildcards by URL
//! prefix (`prefixes`), and the root wildcard purges the whole zone. The two
//! purge kinds cannot share one API call, so a mixed batch becomes two calls
//! whose IDs are joined with a comma. When the first call succeeds and the
//! second fails the batch is reported as partially applied.
//!
//! Keys are percent-encoded segment by segment before they are joined onto
//! the public URL prefix.

use crate::cdn::CdnInvalidator;
use crate::error::InvalidationError;
use crate::invalidation::InvalidationPattern;
use crate::types::ReferenceId;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const MAX_PATTERNS_PER_REQUEST: usize = 30;

const CDN_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CDN_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Zone and credentials for the Cloudflare adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudflareConfig {
    pub zone_id: String,
    /// Public URL prefix assets are served under, e.g. `https://example.com/`
    pub url_prefix: String,
    /// API token (preferred over email + key)
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    /// Lower the per-request limit below the API maximum
    #[serde(default)]
    pub max_patterns_per_request: Option<usize>,
}

#[derive(Debug, Clone)]
enum Credentials {
    Token(String),
    Key { email: String, key: String },
}

fn map_http_error(error: reqwest::Error) -> InvalidationError {
    if error.is_timeout() {
        InvalidationError::RequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        InvalidationError::RequestFailed(format!("Connection error: {}", error))
    } else {
        InvalidationError::RequestFailed(format!("HTTP error: {}", error))
    }
}

fn map_status(status: u16, body: &str) -> InvalidationError {
    match status {
        401 | 403 => InvalidationError::AuthFailed(format!("Authentication failed: {}", body)),
        429 => InvalidationError::RateLimit(format!("Rate limit exceeded: {}", body)),
        _ => InvalidationError::RequestFailed(format!(
            "Request failed with status {}: {}",
            status, body
        )),
    }
}

fn build_cdn_http_client() -> Result<Client, InvalidationError> {
    Client::builder()
        .connect_timeout(CDN_HTTP_CONNECT_TIMEOUT)
        .timeout(CDN_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| InvalidationError::RequestFailed(format!("Failed to create HTTP client: {}", e)))
}

#[derive(Debug, Deserialize)]
struct PurgeResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<PurgeMessage>,
    #[serde(default)]
    result: Option<PurgeResult>,
}

#[derive(Debug, Deserialize)]
struct PurgeMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct PurgeResult {
    id: String,
}

/// Public URL of `key` below `url_prefix`, trailing slash for directories
fn object_url(url_prefix: &Url, key: &str, directory: bool) -> Result<Url, InvalidationError> {
    let mut url = url_prefix.clone();
    {
        let mut segments = url.path_segments_mut().map_err(|_| {
            InvalidationError::RequestFailed(format!("URL prefix cannot take a path: {}", url_prefix))
        })?;
        segments.pop_if_empty().extend(key.split('/'));
        if directory {
            segments.push("");
        }
    }
    Ok(url)
}

/// Purge bodies for one batch, in submission order
fn purge_bodies(
    url_prefix: &Url,
    patterns: &[InvalidationPattern],
) -> Result<Vec<Value>, InvalidationError> {
    if patterns
        .iter()
        .any(|p| matches!(p, InvalidationPattern::Prefix(dir) if dir.is_empty()))
    {
        return Ok(vec![json!({ "purge_everything": true })]);
    }

    let mut files = Vec::new();
    let mut prefixes = Vec::new();
    for pattern in patterns {
        match pattern {
            InvalidationPattern::Exact(path) => {
                files.push(object_url(url_prefix, path, false)?.to_string())
            }
            InvalidationPattern::Prefix(dir) => {
                let url = object_url(url_prefix, dir, true)?;
                prefixes.push(strip_scheme(url.as_str()).to_string())
            }
        }
    }

    let mut bodies = Vec::new();
    if !files.is_empty() {
        bodies.push(json!({ "files": files }));
    }
    if !prefixes.is_empty() {
        bodies.push(json!({ "prefixes": prefixes }));
    }
    Ok(bodies)
}

/// Send each body in order, stopping at the first failure. IDs accepted
/// before a failure are returned inside [`InvalidationError::Partial`].
async fn submit_bodies<F, Fut>(bodies: Vec<Value>, mut purge: F) -> Result<ReferenceId, InvalidationError>
where
    F: FnMut(Value) -> Fut,
    Fut: Future<Output = Result<ReferenceId, InvalidationError>>,
{
    let mut ids: Vec<ReferenceId> = Vec::new();
    for body in bodies {
        match purge(body).await {
            Ok(id) => ids.push(id),
            Err(e) if ids.is_empty() => return Err(e),
            Err(e) => {
                return Err(InvalidationError::Partial {
                    reference_id: ids.join(","),
                    reason: e.to_string(),
                })
            }
        }
    }
    Ok(ids.join(","))
}

/// Cloudflare prefixes are written without a scheme
fn strip_scheme(url: &str) -> &str {
    url.split_once("://").map(|(_, rest)| rest).unwrap_or(url)
}

fn parse_purge_response(body: &str) -> Result<ReferenceId, InvalidationError> {
    let response: PurgeResponse = serde_json::from_str(body).map_err(|e| {
        InvalidationError::RequestFailed(format!("Failed to parse response: {}", e))
    })?;
    if !response.success {
        let reasons: Vec<String> = response
            .errors
            .iter()
            .map(|e| format!("{} ({})", e.message, e.code))
            .collect();
        return Err(InvalidationError::Rejected(if reasons.is_empty() {
            "Cloudflare reported failure".to_string()
        } else {
            reasons.join("; ")
        }));
    }
    response
        .result
        .map(|r| r.id)
        .ok_or_else(|| InvalidationError::Rejected("Response carried no purge ID".to_string()))
}

/// Purges cached URLs within one Cloudflare zone
pub struct CloudflareInvalidator {
    client: Client,
    api_base: String,
    zone_id: String,
    url_prefix: Url,
    credentials: Credentials,
    max_patterns_per_request: usize,
}

impl CloudflareInvalidator {
    pub fn new(config: CloudflareConfig) -> Result<Self, InvalidationError> {
        let credentials = match (config.api_token, config.email, config.api_key) {
            (Some(token), _, _) => Credentials::Token(token),
            (None, Some(email), Some(key)) => Credentials::Key { email, key },
            _ => {
                return Err(InvalidationError::AuthFailed(
                    "Cloudflare requires an api_token or an email and api_key".to_string(),
                ))
            }
        };

        let mut url_prefix = config.url_prefix;
        if !url_prefix.ends_with('/') {
            url_prefix.push('/');
        }
        let url_prefix = Url::parse(&url_prefix).map_err(|e| {
            InvalidationError::RequestFailed(format!("Invalid url_prefix {}: {}", url_prefix, e))
        })?;

        Ok(Self {
            client: build_cdn_http_client()?,
            api_base: config
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            zone_id: config.zone_id,
            url_prefix,
            credentials,
            max_patterns_per_request: config
                .max_patterns_per_request
                .unwrap_or(MAX_PATTERNS_PER_REQUEST)
                .clamp(1, MAX_PATTERNS_PER_REQUEST),
        })
    }

    async fn purge(&self, body: &Value) -> Result<ReferenceId, InvalidationError> {
        let url = format!("{}/zones/{}/purge_cache", self.api_base, self.zone_id);
        let request = self.client.post(&url).json(body);
        let request = match &self.credentials {
            Credentials::Token(token) => request.header("Authorization", format!("Bearer {}", token)),
            Credentials::Key { email, key } => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
        };

        let response = request.send().await.map_err(map_http_error)?;
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        debug!(status = status.as_u16(), body = %text, "Cloudflare purge response");

        if !status.is_success() {
            return Err(map_status(status.as_u16(), &text));
        }
        parse_purge_response(&text)
    }
}

#[async_trait]
impl CdnInvalidator for CloudflareInvalidator {
    async fn invalidate(
        &self,
        patterns: &[InvalidationPattern],
    ) -> Result<ReferenceId, InvalidationError> {
        if patterns.is_empty() {
            return Err(InvalidationError::EmptyBatch);
        }

        let bodies = purge_bodies(&self.url_prefix, patterns)?;
        let reference = submit_bodies(bodies, move |body| async move { self.purge(&body).await }).await?;
        info!(zone = %self.zone_id, reference = %reference, patterns = patterns.len(), "Created Cloudflare purge");
        Ok(reference)
    }

    fn max_patterns_per_request(&self) -> usize {
        self.max_patterns_per_request
    }

    fn name(&self) -> String {
        format!("cloudflare:{}", self.zone_id)
    }
}
