// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod compiler;
pub mod credentials;
pub mod dataset_cache;
pub mod metrics;
pub mod spine;
pub mod strava;

pub use compiler::{compile, CompiledQuery, MetricQueryCompiler};
pub use credentials::{CredentialProvider, RefreshTokenProvider, StaticToken};
pub use dataset_cache::{ActivitySource, DatasetCache, DatasetSnapshot};
pub use metrics::{MetricReport, MetricsService, SyncSummary, Timeline};
pub use spine::{build_spine, spine_for, DateSpineRow};
pub use strava::{CancelToken, StravaClient, StravaService};
