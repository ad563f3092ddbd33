use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};

use slsync_core::SelectLineConfig;

use crate::error::ClientError;
use crate::session::AuthSession;

/// Response bodies attached to error diagnostics are cut off here.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client for a SelectLine mobile API deployment.
///
/// Owns the HTTP client and the cached [`AuthSession`]. All remote shape
/// details — paths, query-parameter names, the auth header and its value
/// prefix — come from [`SelectLineConfig`], since they vary between
/// installations. Point `base_url` at a mock server in tests.
pub struct SelectLineClient {
    http: Client,
    config: SelectLineConfig,
    base_url: Url,
    session: Option<AuthSession>,
}

impl SelectLineClient {
    /// Creates a client from a SelectLine deployment config.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::Auth`] if `base_url` does
    /// not parse as a URL.
    pub fn new(config: SelectLineConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("slsync/0.1 (catalog-mirror)")
            .build()?;

        // Normalise: exactly one trailing slash so Url::join treats the
        // last path segment as a directory.
        let normalised = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| ClientError::Auth(format!("invalid base URL '{}': {e}", config.base_url)))?;

        Ok(Self {
            http,
            config,
            base_url,
            session: None,
        })
    }

    /// Page size the deployment config asks list endpoints for.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }

    /// Ensures a live session, logging in only when the cached token is
    /// missing or within the safety margin of its expiry.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Auth`] if the login response has no token field.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx login response.
    pub async fn authenticate(&mut self) -> Result<(), ClientError> {
        if let Some(session) = &self.session {
            if session.is_valid(Utc::now()) {
                return Ok(());
            }
        }

        let url = self.build_url(&self.config.login_path.clone(), &[])?;
        let credentials = json!({
            "UserName": self.config.username,
            "Password": self.config.password,
            "AppKey": self.config.app_key,
        });

        let response = self.http.post(url.clone()).json(&credentials).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
                body: truncate_body(&body),
            });
        }

        let parsed: Value =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: "login response".to_string(),
                source: e,
            })?;
        let session = AuthSession::from_login_response(&parsed, Utc::now())?;
        tracing::debug!("SelectLine login succeeded");
        self.session = Some(session);
        Ok(())
    }

    /// Fetches one page of raw article-group records.
    ///
    /// A body that is not a JSON array is tolerated and treated as an
    /// empty page.
    ///
    /// # Errors
    ///
    /// Propagates auth and request failures from [`Self::request_json`].
    pub async fn fetch_groups_page(&mut self, page: u32) -> Result<Vec<Value>, ClientError> {
        let query = self.paging_query(page, None);
        let path = self.config.groups_path.clone();
        let body = self.request_json(&path, &query).await?;
        Ok(Self::as_record_array(body, "groups"))
    }

    /// Fetches one page of raw article records, optionally filtered to a
    /// single group.
    ///
    /// # Errors
    ///
    /// Propagates auth and request failures from [`Self::request_json`].
    pub async fn fetch_articles_page(
        &mut self,
        page: u32,
        group_filter: Option<&str>,
    ) -> Result<Vec<Value>, ClientError> {
        let query = self.paging_query(page, group_filter);
        let path = self.config.articles_path.clone();
        let body = self.request_json(&path, &query).await?;
        Ok(Self::as_record_array(body, "articles"))
    }

    /// Fetches the detail record for a single article by SKU, used by the
    /// on-demand enrichment path.
    ///
    /// Returns `Ok(None)` when the remote system does not know the SKU.
    ///
    /// # Errors
    ///
    /// Propagates auth and request failures from [`Self::request_json`];
    /// a 404 is mapped to `Ok(None)` rather than an error.
    pub async fn fetch_article_detail(&mut self, sku: &str) -> Result<Option<Value>, ClientError> {
        let path = format!("{}/{sku}", self.config.articles_path.trim_end_matches('/'));
        match self.request_json(&path, &[]).await {
            Ok(body) => Ok(Some(body)),
            Err(ClientError::UnexpectedStatus { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Sends an authenticated GET and parses the body as JSON.
    ///
    /// Retry policy, in order of precedence:
    /// - 401: the cached session is dropped and the request retried once,
    ///   forcing a fresh login.
    /// - 429/503: sleep the configured fixed backoff and retry, up to the
    ///   configured retry budget; the last response escalates when the
    ///   budget runs out.
    /// - any other non-2xx escalates immediately with a truncated body.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Auth`] if (re-)login fails.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::UnexpectedStatus`] per the policy above.
    /// - [`ClientError::Deserialize`] if the body is not valid JSON.
    async fn request_json(
        &mut self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, ClientError> {
        let mut retries_remaining = self.config.max_retries;
        let mut reauth_attempted = false;

        loop {
            self.authenticate().await?;
            let token = self
                .session
                .as_ref()
                .map(|s| s.token().to_owned())
                .ok_or_else(|| ClientError::Auth("no session after authenticate".to_string()))?;

            let url = self.build_url(path, query)?;
            let response = self
                .http
                .get(url.clone())
                .header(
                    self.config.auth_header.as_str(),
                    format!("{}{token}", self.config.auth_prefix),
                )
                .send()
                .await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !reauth_attempted {
                tracing::warn!(url = %url, "SelectLine rejected token, re-authenticating");
                self.session = None;
                reauth_attempted = true;
                continue;
            }

            if matches!(
                status,
                StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
            ) && retries_remaining > 0
            {
                retries_remaining -= 1;
                tracing::warn!(
                    status = status.as_u16(),
                    retries_remaining,
                    backoff_ms = self.config.retry_backoff_ms,
                    "SelectLine transient error, backing off"
                );
                tokio::time::sleep(Duration::from_millis(self.config.retry_backoff_ms)).await;
                continue;
            }

            let body = response.text().await?;
            if !status.is_success() {
                return Err(ClientError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                    body: truncate_body(&body),
                });
            }

            return serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: url.to_string(),
                source: e,
            });
        }
    }

    fn paging_query(&self, page: u32, group_filter: Option<&str>) -> Vec<(String, String)> {
        let mut query = vec![
            (self.config.page_param.clone(), page.to_string()),
            (
                self.config.page_size_param.clone(),
                self.config.page_size.to_string(),
            ),
        ];
        if let Some(group) = group_filter {
            query.push((self.config.group_filter_param.clone(), group.to_owned()));
        }
        query
    }

    /// Joins a path onto the base URL and appends percent-encoded query
    /// parameters.
    fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<Url, ClientError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Auth(format!("invalid request path '{path}': {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Degrades a non-array list response to an empty page with a warning
    /// instead of failing the fetch.
    fn as_record_array(body: Value, collection: &str) -> Vec<Value> {
        match body {
            Value::Array(records) => records,
            other => {
                tracing::warn!(
                    collection,
                    body_type = json_type_name(&other),
                    "expected a JSON array, treating response as empty page"
                );
                Vec::new()
            }
        }
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_owned();
    }
    let truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{truncated}…")
}
