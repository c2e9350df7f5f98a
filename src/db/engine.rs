// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory analytical engine (SQLite) over the activity dataset and spine.

use crate::error::{AppError, Result};
use crate::models::{ActivityDataset, Cell, QueryResult};
use crate::services::spine::DateSpineRow;
use crate::time_utils::{format_date, DATETIME_FORMAT};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Mutex, MutexGuard};

pub const DATE_SPINE_TABLE: &str = "date_spine";
pub const ACTIVITIES_TABLE: &str = "activities";

const SCHEMA: &str = r#"
CREATE TABLE date_spine (
    date TEXT NOT NULL PRIMARY KEY
);

CREATE TABLE activities (
    id INTEGER,
    athlete_id INTEGER,
    name TEXT,
    type TEXT,
    sport_type TEXT,
    start_date_local TEXT,
    distance REAL,
    moving_time INTEGER,
    elapsed_time INTEGER,
    total_elevation_gain REAL,
    kudos_count INTEGER
);
"#;

/// Read-only SQL engine loaded with one dataset snapshot.
///
/// The connection is serialized behind a mutex; queries are short.
pub struct AnalyticsEngine {
    conn: Mutex<Connection>,
}

impl AnalyticsEngine {
    /// Open an in-memory database and load the dataset and spine.
    pub fn load(dataset: &ActivityDataset, spine: &[DateSpineRow]) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction()?;
        {
            let mut insert_day = tx.prepare("INSERT INTO date_spine (date) VALUES (?1)")?;
            for row in spine {
                insert_day.execute(params![format_date(row.date)])?;
            }

            let mut insert_activity = tx.prepare(
                "INSERT INTO activities (
                    id, athlete_id, name, type, sport_type, start_date_local,
                    distance, moving_time, elapsed_time, total_elevation_gain, kudos_count
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for record in dataset.records() {
                insert_activity.execute(params![
                    record.id,
                    record.athlete_id,
                    record.name,
                    record.activity_type,
                    record.sport_type,
                    record
                        .start_date_local
                        .map(|dt| dt.format(DATETIME_FORMAT).to_string()),
                    record.distance,
                    record.moving_time,
                    record.elapsed_time,
                    record.total_elevation_gain,
                    record.kudos_count,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(
            activities = dataset.len(),
            spine_days = spine.len(),
            "Analytics engine loaded"
        );

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("analytics engine lock poisoned".to_string()))
    }

    /// Run query text and collect every row.
    ///
    /// Any prepare or step failure is a [`AppError::Query`].
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                let value: rusqlite::types::Value = row.get(idx)?;
                cells.push(Cell::from(value));
            }
            rows.push(cells);
        }

        Ok(QueryResult { columns, rows })
    }

    /// Distinct activity types that started between `start` and `end`
    /// (inclusive, by local day), sorted.
    pub fn activity_types_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT type
             FROM activities
             WHERE type IS NOT NULL
               AND date(start_date_local) BETWEEN ?1 AND ?2
             ORDER BY 1",
        )?;

        let types = stmt
            .query_map(params![format_date(start), format_date(end)], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(types)
    }
}
