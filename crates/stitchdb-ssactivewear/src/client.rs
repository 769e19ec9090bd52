//! HTTP client for the S&S Activewear REST API.
//!
//! Wraps `reqwest` with Basic auth, typed deserialization, and
//! retry-with-backoff on transient failures. Use [`SsClient::with_base_url`]
//! to point at a mock server in tests.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::retry::retry_with_backoff;
use crate::types::{SsInventoryItem, SsProduct, SsStyle};
use crate::SsError;

const DEFAULT_BASE_URL: &str = "https://api.ssactivewear.com/v2/";
const USER_AGENT: &str = "stitchdb/0.1 (catalog-reconciliation)";

/// Basic-auth credentials: S&S account number and API key.
#[derive(Clone)]
pub struct SsCredentials {
    pub account_number: String,
    pub api_key: String,
}

impl std::fmt::Debug for SsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsCredentials")
            .field("account_number", &self.account_number)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

pub struct SsClient {
    client: Client,
    credentials: SsCredentials,
    base_url: Url,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl SsClient {
    /// Creates a client pointed at the production S&S API.
    ///
    /// # Errors
    ///
    /// Returns [`SsError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(
        credentials: SsCredentials,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, SsError> {
        Self::with_base_url(
            credentials,
            timeout_secs,
            max_retries,
            backoff_base_secs,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SsError::Http`] if the client cannot be constructed or
    /// [`SsError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        credentials: SsCredentials,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
        base_url: &str,
    ) -> Result<Self, SsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        // Keep exactly one trailing slash so Url::join appends rather than
        // replacing the last path segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| SsError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            credentials,
            base_url,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Fetches one page of the style list, optionally filtered by brand
    /// and/or category. Pages are 1-based; an empty page means the end.
    ///
    /// # Errors
    ///
    /// Transient failures are retried; see [`SsError`] for the terminal
    /// variants.
    pub async fn list_styles(
        &self,
        page: u32,
        page_size: u32,
        brand: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<SsStyle>, SsError> {
        let mut url = self.endpoint("styles/")?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("page", &page.to_string());
            q.append_pair("pagesize", &page_size.to_string());
            if let Some(brand) = brand {
                q.append_pair("brand", brand);
            }
            if let Some(category) = category {
                q.append_pair("category", category);
            }
        }
        self.get_json(url, "styles").await
    }

    /// Fetches one style's metadata by part number.
    ///
    /// # Errors
    ///
    /// [`SsError::NotFound`] when the style does not exist upstream.
    pub async fn get_style(&self, style_name: &str) -> Result<SsStyle, SsError> {
        let url = self.endpoint(&format!("styles/{style_name}"))?;
        self.get_json(url, "style").await
    }

    /// Fetches every sellable variant for one style part number.
    ///
    /// # Errors
    ///
    /// [`SsError::NotFound`] when the style does not exist upstream.
    pub async fn products_for_style(&self, style_name: &str) -> Result<Vec<SsProduct>, SsError> {
        let mut url = self.endpoint("products/")?;
        url.query_pairs_mut().append_pair("style", style_name);
        self.get_json(url, "products").await
    }

    /// Fetches per-SKU warehouse inventory for one style part number.
    ///
    /// # Errors
    ///
    /// [`SsError::NotFound`] when the style does not exist upstream.
    pub async fn inventory_for_style(
        &self,
        style_name: &str,
    ) -> Result<Vec<SsInventoryItem>, SsError> {
        let mut url = self.endpoint("inventory/")?;
        url.query_pairs_mut().append_pair("style", style_name);
        self.get_json(url, "inventory").await
    }

    fn endpoint(&self, path: &str) -> Result<Url, SsError> {
        self.base_url.join(path).map_err(|e| SsError::InvalidBaseUrl {
            url: format!("{}{path}", self.base_url),
            reason: e.to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        context: &str,
    ) -> Result<T, SsError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url.clone())
                    .basic_auth(
                        &self.credentials.account_number,
                        Some(&self.credentials.api_key),
                    )
                    .send()
                    .await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(1);
                    return Err(SsError::RateLimited { retry_after_secs });
                }
                if status == StatusCode::NOT_FOUND {
                    return Err(SsError::NotFound {
                        url: url.to_string(),
                    });
                }
                if !status.is_success() {
                    return Err(SsError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                let body = response.bytes().await?;
                serde_json::from_slice(&body).map_err(|source| SsError::Deserialize {
                    context: format!("{context} ({url})"),
                    source,
                })
            }
        })
        .await
    }
}
