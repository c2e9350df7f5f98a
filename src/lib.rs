// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava-Metrics: time-series aggregations over a Strava activity history
//!
//! This crate syncs an athlete's activities from Strava, lays them over a
//! gap-free calendar spine, and compiles metric selections (metric,
//! aggregate, slice, grain, window) into SQL run by an embedded engine.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::MetricsService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub metrics: MetricsService,
}
