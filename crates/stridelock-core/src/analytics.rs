//! Local block-event analytics.
//!
//! SQLite-backed log of "app blocked" events plus daily summaries. The
//! gate engine records through the [`Analytics`] trait fire-and-forget;
//! failures are reported as warnings and otherwise swallowed.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::config::GoalUnit;
use crate::error::DatabaseError;
use crate::gate::BlockReason;
use crate::store::data_dir;

/// One recorded block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEvent {
    pub package: String,
    pub reason: BlockReason,
    pub steps: u64,
    pub distance_km: f64,
    pub goal_value: f64,
    pub unit: GoalUnit,
    pub at: DateTime<Utc>,
}

/// Aggregates for one calendar day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailySummary {
    pub blocks: u64,
    pub distinct_packages: u64,
}

/// Analytics side channel consumed by the gate engine.
pub trait Analytics: Send + Sync {
    fn record_block(&self, event: &BlockEvent) -> Result<(), DatabaseError>;
}

/// SQLite block-event log.
pub struct EventLog {
    conn: Mutex<Connection>,
}

impl EventLog {
    /// Open the log at `~/.config/stridelock/events.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Self::open_at(dir.join("events.db"))
    }

    pub fn open_at(path: PathBuf) -> Result<Self, DatabaseError> {
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path,
            source,
        })?;
        let log = Self {
            conn: Mutex::new(conn),
        };
        log.migrate()?;
        Ok(log)
    }

    /// Open an in-memory log (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let log = Self {
            conn: Mutex::new(conn),
        };
        log.migrate()?;
        Ok(log)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.lock().unwrap().execute_batch(
            "CREATE TABLE IF NOT EXISTS block_events (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                package     TEXT NOT NULL,
                reason      TEXT NOT NULL,
                steps       INTEGER NOT NULL,
                distance_km REAL NOT NULL,
                goal_value  REAL NOT NULL,
                unit        TEXT NOT NULL,
                at          TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_block_events_at ON block_events(at);
            CREATE INDEX IF NOT EXISTS idx_block_events_package ON block_events(package);",
        )?;
        Ok(())
    }

    /// Most recent events, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<BlockEvent>, DatabaseError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT package, reason, steps, distance_km, goal_value, unit, at
             FROM block_events ORDER BY at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            let reason: String = row.get(1)?;
            let unit: String = row.get(5)?;
            let at: String = row.get(6)?;
            Ok(BlockEvent {
                package: row.get(0)?,
                reason: parse_reason(&reason),
                steps: row.get::<_, i64>(2)? as u64,
                distance_km: row.get(3)?,
                goal_value: row.get(4)?,
                unit: if unit == "distance" {
                    GoalUnit::Distance
                } else {
                    GoalUnit::Steps
                },
                at: DateTime::parse_from_rfc3339(&at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Block counts for one calendar day (UTC).
    pub fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary, DatabaseError> {
        let prefix = format!("{date}%");
        let conn = self.conn.lock().unwrap();
        let (blocks, distinct_packages) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT package)
             FROM block_events WHERE at LIKE ?1",
            params![prefix],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        Ok(DailySummary {
            blocks: blocks as u64,
            distinct_packages: distinct_packages as u64,
        })
    }
}

fn parse_reason(text: &str) -> BlockReason {
    match text {
        "tutorial-goal-not-met" => BlockReason::TutorialGoalNotMet,
        "emergency-expired" => BlockReason::EmergencyExpired,
        _ => BlockReason::GoalNotMet,
    }
}

impl Analytics for EventLog {
    fn record_block(&self, event: &BlockEvent) -> Result<(), DatabaseError> {
        let unit = match event.unit {
            GoalUnit::Steps => "steps",
            GoalUnit::Distance => "distance",
        };
        self.conn.lock().unwrap().execute(
            "INSERT INTO block_events (package, reason, steps, distance_km, goal_value, unit, at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.package,
                event.reason.to_string(),
                event.steps as i64,
                event.distance_km,
                event.goal_value,
                unit,
                event.at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(package: &str, at: DateTime<Utc>) -> BlockEvent {
        BlockEvent {
            package: package.to_string(),
            reason: BlockReason::GoalNotMet,
            steps: 4200,
            distance_km: 3.2,
            goal_value: 8000.0,
            unit: GoalUnit::Steps,
            at,
        }
    }

    #[test]
    fn record_and_read_back() {
        let log = EventLog::open_memory().unwrap();
        let now = Utc::now();
        log.record_block(&event("com.example.doom", now)).unwrap();

        let events = log.recent(10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].package, "com.example.doom");
        assert_eq!(events[0].reason, BlockReason::GoalNotMet);
        assert_eq!(events[0].steps, 4200);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let log = EventLog::open_memory().unwrap();
        let base = Utc::now();
        for i in 0..5 {
            log.record_block(&event(
                &format!("pkg.{i}"),
                base + chrono::Duration::seconds(i),
            ))
            .unwrap();
        }
        let events = log.recent(3).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].package, "pkg.4");
    }

    #[test]
    fn daily_summary_counts_distinct_packages() {
        let log = EventLog::open_memory().unwrap();
        let now = Utc::now();
        log.record_block(&event("a", now)).unwrap();
        log.record_block(&event("a", now)).unwrap();
        log.record_block(&event("b", now)).unwrap();

        let summary = log.daily_summary(now.date_naive()).unwrap();
        assert_eq!(summary.blocks, 3);
        assert_eq!(summary.distinct_packages, 2);
    }
}
