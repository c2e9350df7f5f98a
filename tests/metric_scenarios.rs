// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end metric computations over fixture datasets.
//!
//! Each test loads raw activity payloads through the dataset cache, compiles
//! a selection with a fixed clock, and checks the rows the engine returns.

use serde_json::json;
use std::sync::Arc;
use strava_metrics::error::AppError;
use strava_metrics::models::{
    Aggregate, Cell, DateGrain, Metric, MetricSelection, QueryResult, Slice, TimeWindow,
};

mod common;
use common::{activity, metrics_service, ymd, FixtureSource};

const METERS_PER_MILE: f64 = 1609.0;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// `(date, value)` pairs for an unsliced result.
fn series(result: &QueryResult, value_column: &str) -> Vec<(String, f64)> {
    (0..result.len())
        .map(|row| {
            let date = result.value(row, "date").and_then(Cell::as_str).unwrap();
            let value = result.value(row, value_column).and_then(Cell::as_f64).unwrap();
            (date.to_string(), value)
        })
        .collect()
}

#[tokio::test]
async fn test_single_activity_daily_total() {
    let source = Arc::new(FixtureSource::new(vec![activity(
        1,
        "Run",
        "2024-01-01T07:30:00Z",
        METERS_PER_MILE,
    )]));
    let service = metrics_service(source);

    let report = service
        .compute(&MetricSelection::new(Metric::Miles, Aggregate::Sum))
        .await
        .unwrap();

    assert_eq!(report.result.columns, vec!["date", "sum_miles"]);
    assert_eq!(report.result.len(), 1);
    let rows = series(&report.result, "sum_miles");
    assert_eq!(rows[0].0, "2024-01-01");
    assert!(approx(rows[0].1, 1.0));
}

#[tokio::test]
async fn test_single_activity_monthly_total() {
    let source = Arc::new(FixtureSource::new(vec![activity(
        1,
        "Run",
        "2024-01-01T07:30:00Z",
        METERS_PER_MILE,
    )]));
    let service = metrics_service(source);

    let selection =
        MetricSelection::new(Metric::Miles, Aggregate::Sum).with_grain(DateGrain::Month);
    let report = service.compute(&selection).await.unwrap();

    let rows = series(&report.result, "sum_miles");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "2024-01-01");
    assert!(approx(rows[0].1, 1.0));
}

#[tokio::test]
async fn test_slice_by_activity_type() {
    let source = Arc::new(FixtureSource::new(vec![
        activity(1, "Run", "2024-01-01T07:30:00Z", METERS_PER_MILE),
        activity(2, "Ride", "2024-01-01T17:00:00Z", 10.0 * METERS_PER_MILE),
    ]));
    let service = metrics_service(source);

    let selection =
        MetricSelection::new(Metric::Miles, Aggregate::Sum).with_slice(Slice::ActivityType);
    let report = service.compute(&selection).await.unwrap();

    assert_eq!(report.result.columns, vec!["date", "type", "sum_miles"]);
    assert_eq!(report.query.slice_column, Some("type"));

    let mut rows: Vec<(String, String, f64)> = (0..report.result.len())
        .map(|row| {
            let cell = |col| report.result.value(row, col).unwrap().clone();
            (
                cell("date").as_str().unwrap().to_string(),
                cell("type").as_str().unwrap().to_string(),
                cell("sum_miles").as_f64().unwrap(),
            )
        })
        .collect();
    rows.sort_by(|a, b| a.1.cmp(&b.1));

    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].0.as_str(), rows[0].1.as_str()), ("2024-01-01", "Ride"));
    assert!(approx(rows[0].2, 10.0));
    assert_eq!((rows[1].0.as_str(), rows[1].1.as_str()), ("2024-01-01", "Run"));
    assert!(approx(rows[1].2, 1.0));
}

#[tokio::test]
async fn test_empty_dataset_yields_empty_result() {
    let service = metrics_service(Arc::new(FixtureSource::new(vec![])));

    for grain in DateGrain::ALL {
        let selection = MetricSelection::new(Metric::Minutes, Aggregate::Avg).with_grain(grain);
        let report = service.compute(&selection).await.unwrap();
        assert!(report.result.is_empty());
        assert_eq!(report.result.columns, vec!["date", "avg_minutes"]);
    }

    let timeline = service.timeline().await.unwrap();
    assert_eq!(timeline.first_activity, None);
    assert_eq!(timeline.activity_count, 0);
}

#[tokio::test]
async fn test_null_kudos_average_is_zero() {
    let mut payload = activity(1, "Run", "2024-01-01T07:30:00Z", METERS_PER_MILE);
    payload["kudos_count"] = json!(null);
    let service = metrics_service(Arc::new(FixtureSource::new(vec![payload])));

    let report = service
        .compute(&MetricSelection::new(Metric::Kudos, Aggregate::Avg))
        .await
        .unwrap();

    let cell = report.result.value(0, "avg_kudos").unwrap();
    assert!(!cell.is_null());
    assert!(approx(cell.as_f64().unwrap(), 0.0));
}

#[tokio::test]
async fn test_gap_days_are_zero_filled() {
    let service = metrics_service(Arc::new(FixtureSource::new(vec![
        activity(1, "Run", "2024-01-01T07:30:00Z", METERS_PER_MILE),
        activity(2, "Run", "2024-01-03T07:30:00Z", 2.0 * METERS_PER_MILE),
    ])));

    let report = service
        .compute(&MetricSelection::new(Metric::Miles, Aggregate::Sum))
        .await
        .unwrap();

    let rows = series(&report.result, "sum_miles");
    let dates: Vec<&str> = rows.iter().map(|(d, _)| d.as_str()).collect();
    assert_eq!(dates, vec!["2024-01-03", "2024-01-02", "2024-01-01"]);
    assert!(approx(rows[0].1, 2.0));
    assert!(approx(rows[1].1, 0.0));
    assert!(approx(rows[2].1, 1.0));
}

#[tokio::test]
async fn test_count_includes_empty_spine_days() {
    // COALESCE turns the missing activity into a 0, which count() still counts
    let service = metrics_service(Arc::new(FixtureSource::new(vec![
        activity(1, "Run", "2024-01-01T07:30:00Z", METERS_PER_MILE),
        activity(2, "Run", "2024-01-01T18:30:00Z", METERS_PER_MILE),
        activity(3, "Run", "2024-01-03T07:30:00Z", METERS_PER_MILE),
    ])));

    let report = service
        .compute(&MetricSelection::new(Metric::Activities, Aggregate::Count))
        .await
        .unwrap();

    let rows = series(&report.result, "count_activities");
    assert_eq!(rows.len(), 3);
    assert!(approx(rows[0].1, 1.0));
    assert!(approx(rows[1].1, 1.0));
    assert!(approx(rows[2].1, 2.0));
}

#[tokio::test]
async fn test_weekly_buckets_start_on_monday() {
    // 2024-01-01 is a Monday
    let service = metrics_service(Arc::new(FixtureSource::new(vec![
        activity(1, "Run", "2024-01-03T07:30:00Z", METERS_PER_MILE),
        activity(2, "Run", "2024-01-07T07:30:00Z", METERS_PER_MILE),
        activity(3, "Run", "2024-01-08T07:30:00Z", 4.0 * METERS_PER_MILE),
    ])));

    let selection =
        MetricSelection::new(Metric::Miles, Aggregate::Sum).with_grain(DateGrain::Week);
    let report = service.compute(&selection).await.unwrap();

    let rows = series(&report.result, "sum_miles");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, "2024-01-08");
    assert!(approx(rows[0].1, 4.0));
    assert_eq!(rows[1].0, "2024-01-01");
    assert!(approx(rows[1].1, 2.0));
}

#[tokio::test]
async fn test_trailing_month_window() {
    // Today is 2026-10-19, so the window keeps days after 2026-09-01
    let service = metrics_service(Arc::new(FixtureSource::new(vec![
        activity(1, "Run", "2026-08-15T07:30:00Z", 7.0 * METERS_PER_MILE),
        activity(2, "Run", "2026-09-10T07:30:00Z", 2.0 * METERS_PER_MILE),
        activity(3, "Run", "2026-10-01T07:30:00Z", 3.0 * METERS_PER_MILE),
    ])));

    let selection = MetricSelection::new(Metric::Miles, Aggregate::Sum)
        .with_grain(DateGrain::Month)
        .with_window(TimeWindow::Last1Month);
    let report = service.compute(&selection).await.unwrap();

    let rows = series(&report.result, "sum_miles");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, "2026-10-01");
    assert!(approx(rows[0].1, 3.0));
    assert_eq!(rows[1].0, "2026-09-01");
    assert!(approx(rows[1].1, 2.0));
}

#[tokio::test]
async fn test_year_to_date_window() {
    let service = metrics_service(Arc::new(FixtureSource::new(vec![
        activity(1, "Run", "2025-12-31T07:30:00Z", 5.0 * METERS_PER_MILE),
        activity(2, "Run", "2026-01-02T07:30:00Z", 1.0 * METERS_PER_MILE),
    ])));

    let selection = MetricSelection::new(Metric::Miles, Aggregate::Sum)
        .with_grain(DateGrain::Year)
        .with_window(TimeWindow::YearToDate);
    let report = service.compute(&selection).await.unwrap();

    let rows = series(&report.result, "sum_miles");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "2026-01-01");
    assert!(approx(rows[0].1, 1.0));
}

#[tokio::test]
async fn test_window_outside_data_is_empty() {
    let service = metrics_service(Arc::new(FixtureSource::new(vec![activity(
        1,
        "Run",
        "2020-06-01T07:30:00Z",
        METERS_PER_MILE,
    )])));

    for window in TimeWindow::ALL {
        let selection = MetricSelection::new(Metric::Miles, Aggregate::Max).with_window(window);
        let report = service.compute(&selection).await.unwrap();
        if window == TimeWindow::AllTime {
            assert_eq!(report.result.len(), 1);
        } else {
            assert!(report.result.is_empty(), "{} should be empty", window);
        }
    }
}

#[tokio::test]
async fn test_duplicate_ids_are_kept() {
    let service = metrics_service(Arc::new(FixtureSource::new(vec![
        activity(1, "Run", "2024-01-01T07:30:00Z", METERS_PER_MILE),
        activity(1, "Run", "2024-01-01T07:30:00Z", METERS_PER_MILE),
    ])));

    let report = service
        .compute(&MetricSelection::new(Metric::Miles, Aggregate::Sum))
        .await
        .unwrap();
    assert!(approx(series(&report.result, "sum_miles")[0].1, 2.0));
}

#[tokio::test]
async fn test_report_carries_compiled_query() {
    let service = metrics_service(Arc::new(FixtureSource::new(vec![activity(
        1,
        "Run",
        "2024-01-01T07:30:00Z",
        METERS_PER_MILE,
    )])));

    let selection = MetricSelection::new(Metric::Elevation, Aggregate::Min)
        .with_slice(Slice::ActivityType)
        .with_window(TimeWindow::Last12Months);
    let report = service.compute(&selection).await.unwrap();

    assert_eq!(report.selection, selection);
    assert_eq!(report.query, service.compile(&selection));
    assert_eq!(report.query.value_column, "min_elevation");
}

#[tokio::test]
async fn test_every_selection_executes() {
    let service = metrics_service(Arc::new(FixtureSource::new(vec![
        activity(1, "Run", "2026-01-01T07:30:00Z", METERS_PER_MILE),
        activity(2, "Ride", "2026-10-18T07:30:00Z", 3.0 * METERS_PER_MILE),
        activity(3, "Hike", "2026-10-18T09:30:00Z", 0.5 * METERS_PER_MILE),
    ])));

    for metric in Metric::ALL {
        for aggregate in Aggregate::ALL {
            for slice in Slice::ALL {
                for grain in DateGrain::ALL {
                    for window in TimeWindow::ALL {
                        let selection = MetricSelection::new(metric, aggregate)
                            .with_slice(slice)
                            .with_grain(grain)
                            .with_window(window);
                        let report = service.compute(&selection).await.unwrap();
                        assert!(report.result.column_index(&report.query.value_column).is_some());
                    }
                }
            }
        }
    }
}

#[tokio::test]
async fn test_timeline_and_activity_types() {
    let service = metrics_service(Arc::new(FixtureSource::new(vec![
        activity(1, "Run", "2024-01-01T07:30:00Z", METERS_PER_MILE),
        activity(2, "Ride", "2024-02-10T07:30:00Z", METERS_PER_MILE),
        activity(3, "Swim", "2024-03-05T07:30:00Z", METERS_PER_MILE),
    ])));

    let timeline = service.timeline().await.unwrap();
    assert_eq!(timeline.first_activity, Some(ymd(2024, 1, 1)));
    assert_eq!(timeline.last_activity, Some(ymd(2024, 3, 5)));
    assert_eq!(timeline.activity_count, 3);

    let types = service
        .activity_types(ymd(2024, 1, 1), ymd(2024, 2, 10))
        .await
        .unwrap();
    assert_eq!(types, vec!["Ride", "Run"]);

    let err = service
        .activity_types(ymd(2024, 3, 1), ymd(2024, 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}
