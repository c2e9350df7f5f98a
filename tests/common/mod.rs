// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strava_metrics::config::Config;
use strava_metrics::error::{AppError, Result};
use strava_metrics::models::ActivityDataset;
use strava_metrics::routes::create_router;
use strava_metrics::services::{
    ActivitySource, CancelToken, DatasetCache, MetricQueryCompiler, MetricsService,
};
use strava_metrics::time_utils::FixedClock;
use strava_metrics::AppState;

/// "Today" for every test that needs a clock.
#[allow(dead_code)]
pub fn today() -> NaiveDate {
    ymd(2026, 10, 19)
}

#[allow(dead_code)]
pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Raw Strava-shaped activity payload.
#[allow(dead_code)]
pub fn activity(id: i64, activity_type: &str, start_date_local: &str, distance: f64) -> Value {
    json!({
        "id": id,
        "athlete": { "id": 12345 },
        "name": format!("{} {}", activity_type, id),
        "type": activity_type,
        "sport_type": activity_type,
        "start_date_local": start_date_local,
        "distance": distance,
        "moving_time": 1800,
        "elapsed_time": 2000,
        "total_elevation_gain": 25.0,
        "kudos_count": 3
    })
}

/// In-memory activity source that counts fetches.
#[allow(dead_code)]
pub struct FixtureSource {
    identity: String,
    payloads: Mutex<Vec<Value>>,
    failure: Mutex<Option<AppError>>,
    delay: Duration,
    fetches: AtomicUsize,
}

#[allow(dead_code)]
impl FixtureSource {
    pub fn new(payloads: Vec<Value>) -> Self {
        Self {
            identity: "strava:fixture:0000000000000000".to_string(),
            payloads: Mutex::new(payloads),
            failure: Mutex::new(None),
            delay: Duration::ZERO,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replace the payloads returned by later fetches.
    pub fn set_payloads(&self, payloads: Vec<Value>) {
        *self.payloads.lock().unwrap() = payloads;
    }

    /// Fail every later fetch with `error` (or stop failing with `None`).
    pub fn set_failure(&self, error: Option<AppError>) {
        *self.failure.lock().unwrap() = error;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActivitySource for FixtureSource {
    fn identity(&self) -> String {
        self.identity.clone()
    }

    async fn fetch_all(&self, cancel: &CancelToken) -> Result<ActivityDataset> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        let failure = self.failure.lock().unwrap().clone();
        if let Some(err) = failure {
            return Err(err);
        }

        let payloads = self.payloads.lock().unwrap().clone();
        Ok(ActivityDataset::from_raw(&payloads))
    }
}

/// Metrics service over a fixture source with a fixed clock.
#[allow(dead_code)]
pub fn metrics_service(source: Arc<FixtureSource>) -> MetricsService {
    let cache = DatasetCache::new(source, None);
    MetricsService::new(cache, MetricQueryCompiler::new(Arc::new(FixedClock(today()))))
}

/// Create a test app backed by a fixture source.
/// Returns the router and the source, for fetch assertions.
#[allow(dead_code)]
pub fn create_test_app(payloads: Vec<Value>) -> (axum::Router, Arc<FixtureSource>) {
    let source = Arc::new(FixtureSource::new(payloads));
    let state = Arc::new(AppState {
        config: Config::default(),
        metrics: metrics_service(source.clone()),
    });

    (create_router(state), source)
}
