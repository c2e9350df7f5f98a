// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for syncing an athlete's activity history.
//!
//! Handles:
//! - Paginated activity listing (serial, one page in flight)
//! - Token refresh
//! - Rate limit and auth failure classification

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{ActivityDataset, ActivityRecord};
use crate::services::credentials::CredentialProvider;
use crate::services::dataset_cache::ActivitySource;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Page size for `/athlete/activities` (Strava's maximum).
pub const ACTIVITIES_PAGE_SIZE: u32 = 200;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            http,
            base_url: "https://www.strava.com/api/v3".to_string(),
            oauth_url: "https://www.strava.com/oauth/token".to_string(),
            client_id,
            client_secret,
        }
    }

    /// Client pointed at the endpoints named in the config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.strava_client_id.clone(),
            config.strava_client_secret.clone(),
        )
        .with_urls(&config.strava_api_url, &config.strava_oauth_url)
    }

    /// Override the API base URL and token endpoint.
    pub fn with_urls(mut self, base_url: &str, oauth_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self.oauth_url = oauth_url.to_string();
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Fetch one page of the authenticated athlete's activities as raw payloads.
    pub async fn list_activities(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>> {
        let url = format!("{}/athlete/activities", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("per_page", per_page.to_string()), ("page", page.to_string())])
            .send()
            .await
            .map_err(|e| AppError::Network(format!("page {} request failed: {}", page, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::Auth(format!("access token rejected: {}", body)));
            }

            // Rate limit - caller may retry the whole sync later
            if status.as_u16() == 429 {
                tracing::warn!(page, "Strava rate limit hit (429)");
                return Err(AppError::Network("rate limit exceeded".to_string()));
            }

            return Err(AppError::Network(format!("HTTP {}: {}", status, body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Network(format!("JSON parse error: {}", e)))?;

        match body {
            Value::Array(items) => Ok(items),
            other => Err(AppError::Network(format!(
                "expected a JSON array of activities, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Exchange a refresh token for a fresh access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenRefreshResponse> {
        let response = self
            .http
            .post(&self.oauth_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token refresh failed");
            return Err(AppError::Auth(format!(
                "Token refresh failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse token response: {}", e)))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// CancelToken - cooperative cancellation at page boundaries
// ─────────────────────────────────────────────────────────────────────────────

/// Shared flag checked before every page request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StravaService - full activity sync with token management
// ─────────────────────────────────────────────────────────────────────────────

/// High-level Strava service: obtains a bearer token and pages through the
/// athlete's full activity history.
#[derive(Clone)]
pub struct StravaService {
    client: StravaClient,
    credentials: Arc<dyn CredentialProvider>,
}

impl StravaService {
    pub fn new(client: StravaClient, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Fetch every activity, page by page, until Strava returns an empty page.
    ///
    /// Records are kept in fetch order and not deduplicated.
    pub async fn fetch_all_activities(&self, cancel: &CancelToken) -> Result<ActivityDataset> {
        let access_token = self.credentials.access_token().await?;

        let mut records = Vec::new();
        let mut page = 1;

        loop {
            if cancel.is_cancelled() {
                tracing::info!(page, fetched = records.len(), "Activity sync cancelled");
                return Err(AppError::Cancelled);
            }

            let batch = match self
                .client
                .list_activities(&access_token, page, ACTIVITIES_PAGE_SIZE)
                .await
            {
                Ok(batch) => batch,
                Err(e @ AppError::Auth(_)) => {
                    // Force a refresh on the next sync attempt
                    self.credentials.invalidate().await;
                    return Err(e);
                }
                Err(e) => return Err(e),
            };

            if batch.is_empty() {
                break;
            }

            tracing::debug!(page, count = batch.len(), "Fetched activity page");
            records.extend(batch.iter().map(ActivityRecord::from_raw));
            page += 1;
        }

        tracing::info!(
            activities = records.len(),
            pages = page - 1,
            "Activity sync complete"
        );

        Ok(ActivityDataset::new(records))
    }
}

#[async_trait]
impl ActivitySource for StravaService {
    fn identity(&self) -> String {
        self.credentials.identity()
    }

    async fn fetch_all(&self, cancel: &CancelToken) -> Result<ActivityDataset> {
        self.fetch_all_activities(cancel).await
    }
}
