// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod activity;
pub mod result;
pub mod selection;

pub use activity::{ActivityDataset, ActivityRecord};
pub use result::{Cell, QueryResult};
pub use selection::{
    Aggregate, DateGrain, Metric, MetricSelection, SelectionOptions, Slice, TimeWindow,
};
