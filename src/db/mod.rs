//! Database layer (embedded SQLite analytics).

pub mod engine;

pub use engine::AnalyticsEngine;
