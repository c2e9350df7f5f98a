// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token providers.

use crate::error::Result;
use crate::services::strava::StravaClient;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Supplies bearer tokens for Strava API calls.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// A currently valid access token. Failures are [`AppError::Auth`].
    ///
    /// [`AppError::Auth`]: crate::error::AppError::Auth
    async fn access_token(&self) -> Result<String>;

    /// Stable, non-secret identifier of the credential scope. Used as the
    /// dataset cache key.
    fn identity(&self) -> String;

    /// Drop any cached access token after Strava rejected it.
    async fn invalidate(&self) {}
}

/// Derive a cache identity from a secret without exposing it.
fn fingerprint(scope: &str, secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    format!("strava:{}:{}", scope, &hex::encode(digest)[..16])
}

/// A fixed access token (e.g. a short-lived token pasted in for local use).
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }

    fn identity(&self) -> String {
        fingerprint("static", &self.token)
    }
}

/// Cached access token with expiry information.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

struct TokenState {
    /// Strava rotates refresh tokens; always holds the latest one.
    refresh_token: String,
    cached: Option<CachedToken>,
}

/// Exchanges a long-lived refresh token for access tokens, caching each one
/// until shortly before it expires.
///
/// The state mutex serializes refreshes, so concurrent callers never race
/// two exchanges with the same refresh token.
pub struct RefreshTokenProvider {
    client: StravaClient,
    identity: String,
    state: Mutex<TokenState>,
}

impl RefreshTokenProvider {
    pub fn new(client: StravaClient, refresh_token: String) -> Self {
        let identity = fingerprint(client.client_id(), &refresh_token);
        Self {
            client,
            identity,
            state: Mutex::new(TokenState {
                refresh_token,
                cached: None,
            }),
        }
    }
}

#[async_trait]
impl CredentialProvider for RefreshTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        let mut state = self.state.lock().await;

        if let Some(cached) = &state.cached {
            if Utc::now() + margin < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        tracing::info!("Access token missing or expiring, refreshing");
        let fresh = self.client.refresh_token(&state.refresh_token).await?;

        let expires_at = DateTime::from_timestamp(fresh.expires_at, 0).unwrap_or_default();
        state.refresh_token = fresh.refresh_token;
        state.cached = Some(CachedToken {
            access_token: fresh.access_token.clone(),
            expires_at,
        });

        tracing::info!(expires_at = %expires_at, "Token refreshed and cached");
        Ok(fresh.access_token)
    }

    fn identity(&self) -> String {
        self.identity.clone()
    }

    async fn invalidate(&self) {
        self.state.lock().await.cached = None;
    }
}
