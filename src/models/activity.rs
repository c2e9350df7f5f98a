// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava activity model and payload normalization.

use crate::time_utils::parse_local_datetime;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One normalized activity.
///
/// Every field is optional: a payload missing a field (or carrying it with an
/// unexpected type) yields `None`, and aggregation treats it as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    /// Strava activity ID
    pub id: Option<i64>,
    /// Owning athlete (`athlete.id` in the payload)
    pub athlete_id: Option<i64>,
    /// Activity name/title
    pub name: Option<String>,
    /// Legacy activity type (Ride, Run, Hike, etc.), used for slicing
    pub activity_type: Option<String>,
    /// Finer-grained sport type (MountainBikeRide, TrailRun, etc.)
    pub sport_type: Option<String>,
    /// Start time as shown on the athlete's watch
    pub start_date_local: Option<NaiveDateTime>,
    /// Distance in meters
    pub distance: Option<f64>,
    /// Moving time in seconds
    pub moving_time: Option<i64>,
    /// Elapsed time in seconds
    pub elapsed_time: Option<i64>,
    /// Elevation gain in meters
    pub total_elevation_gain: Option<f64>,
    /// Kudos received
    pub kudos_count: Option<i64>,
}

impl ActivityRecord {
    /// Normalize a raw activity payload as returned by `/athlete/activities`.
    pub fn from_raw(raw: &Value) -> Self {
        let fields = flatten(raw);

        Self {
            id: get_i64(&fields, "id"),
            athlete_id: get_i64(&fields, "athlete.id"),
            name: get_string(&fields, "name"),
            activity_type: get_string(&fields, "type"),
            sport_type: get_string(&fields, "sport_type"),
            start_date_local: fields
                .get("start_date_local")
                .and_then(Value::as_str)
                .and_then(parse_local_datetime),
            distance: get_f64(&fields, "distance"),
            moving_time: get_i64(&fields, "moving_time"),
            elapsed_time: get_i64(&fields, "elapsed_time"),
            total_elevation_gain: get_f64(&fields, "total_elevation_gain"),
            kudos_count: get_i64(&fields, "kudos_count"),
        }
    }

    /// Calendar day the activity started on, in local time.
    pub fn start_day(&self) -> Option<NaiveDate> {
        self.start_date_local.map(|dt| dt.date())
    }
}

/// Flatten nested objects into a single-level map with dotted keys.
///
/// `{"athlete": {"id": 1}}` becomes `{"athlete.id": 1}`. Arrays and scalars are
/// kept as leaf values. A non-object payload flattens to an empty map.
pub fn flatten(raw: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    if let Value::Object(obj) = raw {
        flatten_into(obj, "", &mut out);
    }
    out
}

fn flatten_into(obj: &Map<String, Value>, prefix: &str, out: &mut Map<String, Value>) {
    for (key, value) in obj {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(inner, &path, out),
            _ => {
                out.insert(path, value.clone());
            }
        }
    }
}

fn get_i64(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = fields.get(key)?;
    value
        .as_i64()
        // Strava occasionally serializes counters as floats
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

fn get_f64(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields.get(key).and_then(Value::as_f64)
}

fn get_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

/// All activities for one identity, in fetch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityDataset {
    records: Vec<ActivityRecord>,
}

impl ActivityDataset {
    /// Wrap normalized records. Duplicated IDs are kept (the API is
    /// authoritative) but reported.
    pub fn new(records: Vec<ActivityRecord>) -> Self {
        let mut seen = HashSet::new();
        let duplicates = records
            .iter()
            .filter_map(|r| r.id)
            .filter(|id| !seen.insert(*id))
            .count();

        if duplicates > 0 {
            tracing::warn!(
                duplicates,
                total = records.len(),
                "Activity dataset contains duplicate IDs"
            );
        }

        Self { records }
    }

    /// Normalize a list of raw payloads.
    pub fn from_raw(raw: &[Value]) -> Self {
        Self::new(raw.iter().map(ActivityRecord::from_raw).collect())
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last local start dates, or `None` if no record is dated.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut days = self.records.iter().filter_map(ActivityRecord::start_day);
        let first = days.next()?;
        Some(days.fold((first, first), |(min, max), d| (min.min(d), max.max(d))))
    }
}
