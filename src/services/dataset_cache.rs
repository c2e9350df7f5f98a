// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cached activity dataset snapshots.
//!
//! One full sync is the unit of caching. A snapshot bundles the dataset with
//! its spine and a loaded analytics engine, so every query against it is
//! served from memory. Concurrent misses for the same identity share a single
//! fetch.

use crate::db::AnalyticsEngine;
use crate::error::{AppError, Result};
use crate::models::ActivityDataset;
use crate::services::spine::{spine_for, DateSpineRow};
use crate::services::strava::CancelToken;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Where full activity histories come from.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Cache key for the data this source returns.
    fn identity(&self) -> String;

    /// Fetch the complete history, honoring `cancel` between requests.
    async fn fetch_all(&self, cancel: &CancelToken) -> Result<ActivityDataset>;
}

/// A fetched dataset, ready to query.
pub struct DatasetSnapshot {
    pub dataset: ActivityDataset,
    pub spine: Vec<DateSpineRow>,
    pub engine: AnalyticsEngine,
    pub fetched_at: DateTime<Utc>,
}

impl DatasetSnapshot {
    /// Build the spine and load the engine for a dataset.
    pub fn build(dataset: ActivityDataset) -> Result<Self> {
        let spine = spine_for(&dataset);
        let engine = AnalyticsEngine::load(&dataset, &spine)?;
        Ok(Self {
            dataset,
            spine,
            engine,
            fetched_at: Utc::now(),
        })
    }
}

/// Snapshot cache keyed by source identity.
pub struct DatasetCache {
    source: Arc<dyn ActivitySource>,
    snapshots: Cache<String, Arc<DatasetSnapshot>>,
    cancel: CancelToken,
}

impl DatasetCache {
    /// `ttl` of `None` keeps a snapshot until it is explicitly invalidated.
    pub fn new(source: Arc<dyn ActivitySource>, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(8);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            source,
            snapshots: builder.build(),
            cancel: CancelToken::new(),
        }
    }

    /// Cancellation handle for in-flight fetches (used on shutdown).
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Cached snapshot, fetching it first on a miss.
    ///
    /// Failed fetches are not cached.
    pub async fn get(&self) -> Result<Arc<DatasetSnapshot>> {
        let key = self.source.identity();

        self.snapshots
            .try_get_with(key.clone(), async {
                tracing::info!(identity = %key, "Dataset cache miss, syncing activities");
                let dataset = self.source.fetch_all(&self.cancel).await?;
                DatasetSnapshot::build(dataset).map(Arc::new)
            })
            .await
            .map_err(|e: Arc<AppError>| (*e).clone())
    }

    /// Snapshot if one is cached, without fetching.
    pub async fn peek(&self) -> Option<Arc<DatasetSnapshot>> {
        self.snapshots.get(&self.source.identity()).await
    }

    /// Drop the cached snapshot; the next `get` refetches.
    pub async fn invalidate(&self) {
        let key = self.source.identity();
        self.snapshots.invalidate(&key).await;
        tracing::info!(identity = %key, "Dataset cache invalidated");
    }

    /// Invalidate and immediately refetch.
    pub async fn refresh(&self) -> Result<Arc<DatasetSnapshot>> {
        self.invalidate().await;
        self.get().await
    }
}
