// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metric computation service.
//!
//! Handles the core workflow:
//! 1. Load (or reuse) the cached dataset snapshot
//! 2. Compile the selection into query text
//! 3. Execute it against the snapshot's engine

use crate::error::{AppError, Result};
use crate::models::{MetricSelection, QueryResult};
use crate::services::compiler::{CompiledQuery, MetricQueryCompiler};
use crate::services::dataset_cache::DatasetCache;
use chrono::{DateTime, NaiveDate, Utc};

/// Output of one metric computation.
#[derive(Debug, Clone)]
pub struct MetricReport {
    pub selection: MetricSelection,
    pub query: CompiledQuery,
    pub result: QueryResult,
}

/// First and last activity days of the cached dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    pub first_activity: Option<NaiveDate>,
    pub last_activity: Option<NaiveDate>,
    pub activity_count: usize,
}

/// Summary of a completed sync.
#[derive(Debug, Clone, Copy)]
pub struct SyncSummary {
    pub activity_count: usize,
    pub fetched_at: DateTime<Utc>,
}

pub struct MetricsService {
    cache: DatasetCache,
    compiler: MetricQueryCompiler,
}

impl MetricsService {
    pub fn new(cache: DatasetCache, compiler: MetricQueryCompiler) -> Self {
        Self { cache, compiler }
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Compile without touching the dataset.
    pub fn compile(&self, selection: &MetricSelection) -> CompiledQuery {
        self.compiler.compile(selection)
    }

    /// Compute a metric series. An empty dataset yields an empty result.
    pub async fn compute(&self, selection: &MetricSelection) -> Result<MetricReport> {
        let snapshot = self.cache.get().await?;
        let query = self.compile(selection);

        tracing::debug!(
            metric = %selection.metric,
            aggregate = %selection.aggregate,
            slice = %selection.slice,
            grain = %selection.grain,
            window = %selection.window,
            "Executing metric query"
        );

        let result = snapshot.engine.execute(&query.sql)?;

        Ok(MetricReport {
            selection: *selection,
            query,
            result,
        })
    }

    pub async fn timeline(&self) -> Result<Timeline> {
        let snapshot = self.cache.get().await?;
        let range = snapshot.dataset.date_range();

        Ok(Timeline {
            first_activity: range.map(|(first, _)| first),
            last_activity: range.map(|(_, last)| last),
            activity_count: snapshot.dataset.len(),
        })
    }

    /// Activity types seen between two days, inclusive.
    pub async fn activity_types(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
        if start > end {
            return Err(AppError::BadRequest(
                "'start' must not be after 'end'".to_string(),
            ));
        }

        let snapshot = self.cache.get().await?;
        snapshot.engine.activity_types_between(start, end)
    }

    /// Discard the cached dataset and sync again.
    pub async fn refresh(&self) -> Result<SyncSummary> {
        let snapshot = self.cache.refresh().await?;
        Ok(SyncSummary {
            activity_count: snapshot.dataset.len(),
            fetched_at: snapshot.fetched_at,
        })
    }
}
