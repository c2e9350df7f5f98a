// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metric query compiler.
//!
//! Turns a [`MetricSelection`] into SQL over two relations:
//! - `date_spine(date)`: one row per calendar day, the LEFT side of the join
//! - `activities(...)`: normalized activity records
//!
//! Compilation is pure. The only input besides the selection is "today",
//! which anchors the relative time windows.

use crate::db::engine::{ACTIVITIES_TABLE, DATE_SPINE_TABLE};
use crate::models::{MetricSelection, TimeWindow};
use crate::time_utils::{format_date, Clock};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

/// Output column holding the truncated spine date.
pub const DATE_COLUMN: &str = "date";

/// A compiled metric query plus the output column names it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub slice_column: Option<&'static str>,
    pub value_column: String,
}

/// Compile a selection against a fixed "today".
pub fn compile(selection: &MetricSelection, today: NaiveDate) -> CompiledQuery {
    let value_column = selection.value_column();
    let slice_column = selection.slice.column();

    let mut query = SelectBuilder::new(
        format!(
            "{} AS \"{}\"",
            truncate_date("ds.date", selection.grain.modifiers()),
            DATE_COLUMN
        ),
        format!(
            "{agg}(coalesce({expr}, 0)) AS \"{col}\"",
            agg = selection.aggregate.key(),
            expr = selection.metric.expression(),
            col = value_column,
        ),
    );

    if let Some(column) = slice_column {
        query.slice_by(format!("a.{column} AS \"{column}\""));
    }

    if let Some(filter) = window_filter(selection.window, today) {
        query.filter(filter);
    }

    CompiledQuery {
        sql: query.render(),
        slice_column,
        value_column,
    }
}

/// Compiler bound to a clock, for callers that don't manage "today" themselves.
#[derive(Clone)]
pub struct MetricQueryCompiler {
    clock: Arc<dyn Clock>,
}

impl MetricQueryCompiler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn compile(&self, selection: &MetricSelection) -> CompiledQuery {
        compile(selection, self.clock.today())
    }
}

/// `date(<column>, '<modifier>', ...)`. Modifiers are static fragments.
fn truncate_date(column: &str, modifiers: &[&'static str]) -> String {
    let mut out = format!("date({}", column);
    for m in modifiers {
        out.push_str(&format!(", '{}'", m));
    }
    out.push(')');
    out
}

/// WHERE predicate for a time window, or `None` for no filter.
fn window_filter(window: TimeWindow, today: NaiveDate) -> Option<String> {
    let today = format_date(today);

    if let Some(months) = window.months_back() {
        return Some(format!(
            "ds.date > date('{}', 'start of month', '-{} months')",
            today, months
        ));
    }

    match window {
        TimeWindow::YearToDate => Some(format!(
            "{} = date('{}', 'start of year')",
            truncate_date("ds.date", &["start of year"]),
            today
        )),
        _ => None,
    }
}

/// Fixed-shape SELECT: date projection, optional slice, one aggregate.
struct SelectBuilder {
    date_projection: String,
    slice_projection: Option<String>,
    value_projection: String,
    filter: Option<String>,
}

impl SelectBuilder {
    fn new(date_projection: String, value_projection: String) -> Self {
        Self {
            date_projection,
            slice_projection: None,
            value_projection,
            filter: None,
        }
    }

    fn slice_by(&mut self, projection: String) {
        self.slice_projection = Some(projection);
    }

    fn filter(&mut self, predicate: String) {
        self.filter = Some(predicate);
    }

    fn render(&self) -> String {
        let mut projections = vec![self.date_projection.as_str()];
        let mut group_by = vec!["1"];
        if let Some(slice) = &self.slice_projection {
            projections.push(slice);
            group_by.push("2");
        }
        projections.push(&self.value_projection);

        let mut sql = String::from("SELECT\n");
        sql.push_str(&format!("    {}\n", projections.join(",\n    ")));
        sql.push_str(&format!("FROM {} AS ds\n", DATE_SPINE_TABLE));
        sql.push_str(&format!(
            "LEFT JOIN {} AS a\n    ON ds.date = date(a.start_date_local)\n",
            ACTIVITIES_TABLE
        ));
        if let Some(predicate) = &self.filter {
            sql.push_str(&format!("WHERE {}\n", predicate));
        }
        sql.push_str(&format!("GROUP BY {}\n", group_by.join(", ")));
        sql.push_str("ORDER BY 1 DESC");
        sql
    }
}
