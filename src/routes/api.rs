// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metric API routes.

use crate::error::{AppError, Result};
use crate::models::{Cell, MetricSelection, SelectionOptions, TimeWindow};
use crate::time_utils::{format_date, format_utc_rfc3339, parse_date};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes for metric exploration.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/options", get(get_options))
        .route("/api/metrics", get(get_metrics))
        .route("/api/metrics/query", get(get_metric_query))
        .route("/api/timeline", get(get_timeline))
        .route("/api/activity-types", get(get_activity_types))
        .route("/api/refresh", post(refresh))
}

// ─── Options ─────────────────────────────────────────────────

/// Every selectable key with its display label.
async fn get_options() -> Json<SelectionOptions> {
    Json(SelectionOptions::all())
}

// ─── Metrics ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct MetricsQuery {
    metric: Option<String>,
    aggregate: Option<String>,
    slice: Option<String>,
    grain: Option<String>,
    window: Option<String>,
}

impl MetricsQuery {
    /// Resolve raw keys into a selection.
    ///
    /// Unknown metric/aggregate/slice/grain keys are rejected. An unknown
    /// window falls back to all time.
    fn selection(&self) -> Result<MetricSelection> {
        let bad = |e: crate::models::selection::UnknownKey| AppError::BadRequest(e.to_string());
        let required = |name: &str, value: &Option<String>| {
            value
                .clone()
                .ok_or_else(|| AppError::BadRequest(format!("Missing '{}' parameter", name)))
        };

        let mut selection = MetricSelection::new(
            required("metric", &self.metric)?.parse().map_err(bad)?,
            required("aggregate", &self.aggregate)?.parse().map_err(bad)?,
        );

        if let Some(slice) = &self.slice {
            selection.slice = slice.parse().map_err(bad)?;
        }
        if let Some(grain) = &self.grain {
            selection.grain = grain.parse().map_err(bad)?;
        }
        if let Some(window) = &self.window {
            selection.window = TimeWindow::from_key(window);
        }

        Ok(selection)
    }
}

/// Metric series response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MetricsResponse {
    /// Query text that produced the rows
    pub query: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Name of the aggregate column, e.g. `sum_miles`
    pub value_column: String,
    /// Name of the slice column, if sliced
    pub slice_column: Option<String>,
    /// True when the selection matched no data (not an error)
    pub empty: bool,
}

/// Compute a metric series for the given selection.
async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetricsQuery>,
) -> Result<Json<MetricsResponse>> {
    let selection = params.selection()?;
    let report = state.metrics.compute(&selection).await?;

    Ok(Json(MetricsResponse {
        query: report.query.sql,
        empty: report.result.is_empty(),
        columns: report.result.columns,
        rows: report.result.rows,
        value_column: report.query.value_column,
        slice_column: report.query.slice_column.map(str::to_string),
    }))
}

/// Compiled query response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MetricQueryResponse {
    pub query: String,
    pub value_column: String,
    pub slice_column: Option<String>,
}

/// Show the query for a selection without syncing or executing anything.
async fn get_metric_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetricsQuery>,
) -> Result<Json<MetricQueryResponse>> {
    let compiled = state.metrics.compile(&params.selection()?);

    Ok(Json(MetricQueryResponse {
        query: compiled.sql,
        value_column: compiled.value_column,
        slice_column: compiled.slice_column.map(str::to_string),
    }))
}

// ─── Dataset ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimelineResponse {
    /// First activity day (YYYY-MM-DD), null when there are no activities
    pub first_activity: Option<String>,
    pub last_activity: Option<String>,
    pub activity_count: usize,
}

async fn get_timeline(State(state): State<Arc<AppState>>) -> Result<Json<TimelineResponse>> {
    let timeline = state.metrics.timeline().await?;

    Ok(Json(TimelineResponse {
        first_activity: timeline.first_activity.map(format_date),
        last_activity: timeline.last_activity.map(format_date),
        activity_count: timeline.activity_count,
    }))
}

#[derive(Deserialize)]
struct ActivityTypesQuery {
    /// First day (YYYY-MM-DD), inclusive
    start: Option<String>,
    /// Last day (YYYY-MM-DD), inclusive
    end: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityTypesResponse {
    pub types: Vec<String>,
}

/// Distinct activity types in a date range.
async fn get_activity_types(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActivityTypesQuery>,
) -> Result<Json<ActivityTypesResponse>> {
    let day = |name: &str, raw: Option<&str>| {
        raw.and_then(parse_date).ok_or_else(|| {
            AppError::BadRequest(format!("Invalid '{}' parameter: expected YYYY-MM-DD", name))
        })
    };

    let start = day("start", params.start.as_deref())?;
    let end = day("end", params.end.as_deref())?;

    let types = state.metrics.activity_types(start, end).await?;
    Ok(Json(ActivityTypesResponse { types }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RefreshResponse {
    pub activity_count: usize,
    /// When the sync finished (RFC3339)
    pub fetched_at: String,
}

/// Drop the cached dataset and sync from Strava again.
async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<RefreshResponse>> {
    tracing::info!("Manual dataset refresh requested");
    let summary = state.metrics.refresh().await?;

    Ok(Json(RefreshResponse {
        activity_count: summary.activity_count,
        fetched_at: format_utc_rfc3339(summary.fetched_at),
    }))
}
