// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar spine: one row per day so empty days still show up in a series.

use crate::models::ActivityDataset;
use chrono::NaiveDate;
use serde::Serialize;

/// A single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DateSpineRow {
    pub date: NaiveDate,
}

/// Every day from `min` to `max`, inclusive and ascending.
///
/// Returns an empty spine when `min > max`.
pub fn build_spine(min: NaiveDate, max: NaiveDate) -> Vec<DateSpineRow> {
    if min > max {
        return Vec::new();
    }

    min.iter_days()
        .take_while(|d| *d <= max)
        .map(|date| DateSpineRow { date })
        .collect()
}

/// Spine covering the dataset's first to last activity day.
pub fn spine_for(dataset: &ActivityDataset) -> Vec<DateSpineRow> {
    match dataset.date_range() {
        Some((first, last)) => build_spine(first, last),
        None => Vec::new(),
    }
}
