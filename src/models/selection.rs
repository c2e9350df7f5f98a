// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The five user selections that parameterize a metric query.
//!
//! Each selection is a closed enum. Query fragments come from exhaustive
//! matches on these enums, so no caller-supplied text ever reaches SQL.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Error returned when a selection key is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} '{value}'")]
pub struct UnknownKey {
    pub field: &'static str,
    pub value: String,
}

impl UnknownKey {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// A selectable option as shown by a UI: stable key plus display label.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SelectOption {
    pub key: &'static str,
    pub label: &'static str,
}

// ─── Metric ──────────────────────────────────────────────────

/// Quantity to aggregate, derived from raw activity fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Distance converted to miles
    Miles,
    /// Moving time in minutes
    Minutes,
    /// Activity identifier, for counting activities
    Activities,
    /// Kudos received
    Kudos,
    /// Elevation gain in meters
    Elevation,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Miles,
        Metric::Minutes,
        Metric::Activities,
        Metric::Kudos,
        Metric::Elevation,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Metric::Miles => "miles",
            Metric::Minutes => "minutes",
            Metric::Activities => "activities",
            Metric::Kudos => "kudos",
            Metric::Elevation => "elevation",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Miles => "Miles",
            Metric::Minutes => "Time (Minutes)",
            Metric::Activities => "Activities",
            Metric::Kudos => "Kudos",
            Metric::Elevation => "Elevation",
        }
    }

    /// Expression over the `activities` relation (aliased `a`).
    pub fn expression(self) -> &'static str {
        match self {
            Metric::Miles => "a.distance / 1609.0",
            Metric::Minutes => "a.moving_time / 60.0",
            Metric::Activities => "a.id",
            Metric::Kudos => "a.kudos_count",
            Metric::Elevation => "a.total_elevation_gain",
        }
    }
}

// ─── Aggregate ───────────────────────────────────────────────

/// Aggregate function applied per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Sum,
    Avg,
    Max,
    Min,
    Count,
}

impl Aggregate {
    pub const ALL: [Aggregate; 5] = [
        Aggregate::Sum,
        Aggregate::Avg,
        Aggregate::Max,
        Aggregate::Min,
        Aggregate::Count,
    ];

    /// Key, which doubles as the SQL function name.
    pub fn key(self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Max => "max",
            Aggregate::Min => "min",
            Aggregate::Count => "count",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Aggregate::Sum => "Total",
            Aggregate::Avg => "Average",
            Aggregate::Max => "Max",
            Aggregate::Min => "Min",
            Aggregate::Count => "Count",
        }
    }
}

// ─── Slice ───────────────────────────────────────────────────

/// Optional secondary grouping dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slice {
    #[default]
    None,
    ActivityType,
}

impl Slice {
    pub const ALL: [Slice; 2] = [Slice::None, Slice::ActivityType];

    pub fn key(self) -> &'static str {
        match self {
            Slice::None => "none",
            Slice::ActivityType => "activity_type",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Slice::None => "None",
            Slice::ActivityType => "by Activity Type",
        }
    }

    /// Column on the `activities` relation, and the output column name.
    pub fn column(self) -> Option<&'static str> {
        match self {
            Slice::None => None,
            Slice::ActivityType => Some("type"),
        }
    }
}

// ─── Date Grain ──────────────────────────────────────────────

/// Calendar unit the spine date is truncated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateGrain {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl DateGrain {
    pub const ALL: [DateGrain; 4] = [
        DateGrain::Day,
        DateGrain::Week,
        DateGrain::Month,
        DateGrain::Year,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DateGrain::Day => "day",
            DateGrain::Week => "week",
            DateGrain::Month => "month",
            DateGrain::Year => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateGrain::Day => "Daily",
            DateGrain::Week => "Weekly",
            DateGrain::Month => "Monthly",
            DateGrain::Year => "Yearly",
        }
    }

    /// SQLite `date()` modifiers that truncate a day to this grain.
    /// Weeks start on Monday.
    pub fn modifiers(self) -> &'static [&'static str] {
        match self {
            DateGrain::Day => &[],
            DateGrain::Week => &["-6 days", "weekday 1"],
            DateGrain::Month => &["start of month"],
            DateGrain::Year => &["start of year"],
        }
    }
}

// ─── Time Window ─────────────────────────────────────────────

/// Relative date range applied to the spine before aggregation.
///
/// Unrecognized keys deserialize to `AllTime`: an unknown window means no
/// temporal filter, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum TimeWindow {
    #[serde(rename = "year_to_date")]
    YearToDate,
    #[serde(rename = "last_12_months")]
    Last12Months,
    #[serde(rename = "last_6_months")]
    Last6Months,
    #[serde(rename = "last_3_months")]
    Last3Months,
    #[serde(rename = "last_1_month")]
    Last1Month,
    #[default]
    #[serde(rename = "all_time")]
    AllTime,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 6] = [
        TimeWindow::YearToDate,
        TimeWindow::Last12Months,
        TimeWindow::Last6Months,
        TimeWindow::Last3Months,
        TimeWindow::Last1Month,
        TimeWindow::AllTime,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TimeWindow::YearToDate => "year_to_date",
            TimeWindow::Last12Months => "last_12_months",
            TimeWindow::Last6Months => "last_6_months",
            TimeWindow::Last3Months => "last_3_months",
            TimeWindow::Last1Month => "last_1_month",
            TimeWindow::AllTime => "all_time",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::YearToDate => "Year to Date",
            TimeWindow::Last12Months => "Last 12 Months",
            TimeWindow::Last6Months => "Last 6 Months",
            TimeWindow::Last3Months => "Last 3 Months",
            TimeWindow::Last1Month => "Last Month",
            TimeWindow::AllTime => "All Time",
        }
    }

    /// Number of whole months looked back, for the trailing windows.
    pub fn months_back(self) -> Option<u32> {
        match self {
            TimeWindow::Last12Months => Some(12),
            TimeWindow::Last6Months => Some(6),
            TimeWindow::Last3Months => Some(3),
            TimeWindow::Last1Month => Some(1),
            TimeWindow::YearToDate | TimeWindow::AllTime => None,
        }
    }

    /// Parse a window key, degrading anything unknown to `AllTime`.
    pub fn from_key(raw: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|w| w.key() == raw.trim())
            .unwrap_or(TimeWindow::AllTime)
    }
}

impl From<String> for TimeWindow {
    fn from(raw: String) -> Self {
        TimeWindow::from_key(&raw)
    }
}

// ─── Parsing ─────────────────────────────────────────────────

macro_rules! strict_key_parsing {
    ($ty:ident, $field:literal) => {
        impl FromStr for $ty {
            type Err = UnknownKey;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .into_iter()
                    .find(|v| v.key() == raw.trim())
                    .ok_or_else(|| UnknownKey::new($field, raw))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }
    };
}

strict_key_parsing!(Metric, "metric");
strict_key_parsing!(Aggregate, "aggregate");
strict_key_parsing!(DateGrain, "grain");

impl FromStr for Slice {
    type Err = UnknownKey;

    /// The empty string also means no slice.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "" => Ok(Slice::None),
            key => Slice::ALL
                .into_iter()
                .find(|v| v.key() == key)
                .ok_or_else(|| UnknownKey::new("slice", raw)),
        }
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TimeWindow {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(TimeWindow::from_key(raw))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ─── Selection ───────────────────────────────────────────────

/// The full set of choices for one metric query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricSelection {
    pub metric: Metric,
    pub aggregate: Aggregate,
    #[serde(default)]
    pub slice: Slice,
    #[serde(default)]
    pub grain: DateGrain,
    #[serde(default)]
    pub window: TimeWindow,
}

impl MetricSelection {
    /// Unsliced daily series over all time.
    pub fn new(metric: Metric, aggregate: Aggregate) -> Self {
        Self {
            metric,
            aggregate,
            slice: Slice::None,
            grain: DateGrain::Day,
            window: TimeWindow::AllTime,
        }
    }

    pub fn with_slice(mut self, slice: Slice) -> Self {
        self.slice = slice;
        self
    }

    pub fn with_grain(mut self, grain: DateGrain) -> Self {
        self.grain = grain;
        self
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Name of the aggregate output column, e.g. `sum_miles`.
    pub fn value_column(&self) -> String {
        format!("{}_{}", self.aggregate.key(), self.metric.key())
    }
}

/// Every selectable option, grouped by field.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SelectionOptions {
    pub metrics: Vec<SelectOption>,
    pub aggregates: Vec<SelectOption>,
    pub slices: Vec<SelectOption>,
    pub grains: Vec<SelectOption>,
    pub windows: Vec<SelectOption>,
}

impl SelectionOptions {
    pub fn all() -> Self {
        fn opts<T: Copy>(
            values: &[T],
            key: fn(T) -> &'static str,
            label: fn(T) -> &'static str,
        ) -> Vec<SelectOption> {
            values
                .iter()
                .map(|&v| SelectOption {
                    key: key(v),
                    label: label(v),
                })
                .collect()
        }

        Self {
            metrics: opts(&Metric::ALL, Metric::key, Metric::label),
            aggregates: opts(&Aggregate::ALL, Aggregate::key, Aggregate::label),
            slices: opts(&Slice::ALL, Slice::key, Slice::label),
            grains: opts(&DateGrain::ALL, DateGrain::key, DateGrain::label),
            windows: opts(&TimeWindow::ALL, TimeWindow::key, TimeWindow::label),
        }
    }
}
