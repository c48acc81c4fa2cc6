//! SQLite adapter: Implementation of ProfileStore.
//!
//! Provides local persistence for demographics, the symptom log and
//! recovery-strategy feedback.
//!
//! # Mutex Behavior
//!
//! Database connection is protected by `Mutex`. A poisoned mutex (from panic
//! in another thread) will cause panic. This fail-fast behavior is intentional
//! for data integrity of the health log.
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{
    Demographics, NewFeedback, NewSymptom, RecoveryFeedback, SymptomLogEntry,
};
use crate::ports::{ProfileStore, SymptomPage};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

const SYMPTOM_COLUMNS: &str = "id, name, severity, notes, recorded_at";

/// SQLite profile store.
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl SqliteProfileStore {
    /// Open (or create) the profile database at `path`.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                onboarding_complete INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS demographics (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                age TEXT NOT NULL,
                gender TEXT NOT NULL,
                injury_date TEXT NOT NULL,
                injury_cause TEXT NOT NULL,
                previous_concussions TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS symptoms (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                severity INTEGER NOT NULL,
                notes TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_symptoms_recorded
                ON symptoms(recorded_at DESC);

            CREATE TABLE IF NOT EXISTS recovery_feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                strategy_id TEXT NOT NULL,
                helpful INTEGER NOT NULL,
                notes TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(())
    }

    /// Fixed-width UTC timestamps so text order matches time order.
    fn timestamp(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
        let raw: String = row.get(idx)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn symptom_from_row(row: &Row<'_>) -> rusqlite::Result<SymptomLogEntry> {
        Ok(SymptomLogEntry {
            id: row.get(0)?,
            name: row.get(1)?,
            severity: row.get(2)?,
            notes: row.get(3)?,
            recorded_at: Self::parse_timestamp(row, 4)?,
        })
    }

    fn query_symptoms(
        conn: &Connection,
        sql_tail: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<SymptomLogEntry>, StorageError> {
        let sql = format!("SELECT {SYMPTOM_COLUMNS} FROM symptoms {sql_tail}");
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params, Self::symptom_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

impl ProfileStore for SqliteProfileStore {
    type Error = StorageError;

    fn save_demographics(&self, demographics: &Demographics) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute(
            r"
            INSERT OR REPLACE INTO demographics (
                id, age, gender, injury_date, injury_cause,
                previous_concussions, updated_at
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                demographics.age,
                demographics.gender,
                demographics.injury_date,
                demographics.injury_cause,
                demographics.previous_concussions,
                Self::timestamp(&Utc::now()),
            ],
        )?;

        tracing::debug!("Saved demographics");
        Ok(())
    }

    fn load_demographics(&self) -> Result<Option<Demographics>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let demographics = conn
            .query_row(
                r"
                SELECT age, gender, injury_date, injury_cause, previous_concussions
                FROM demographics WHERE id = 1
                ",
                [],
                |row| {
                    Ok(Demographics {
                        age: row.get(0)?,
                        gender: row.get(1)?,
                        injury_date: row.get(2)?,
                        injury_cause: row.get(3)?,
                        previous_concussions: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(demographics)
    }

    fn append_symptom(&self, symptom: &NewSymptom) -> Result<SymptomLogEntry, Self::Error> {
        let entry = SymptomLogEntry::record(symptom);
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute(
            "INSERT INTO symptoms (id, name, severity, notes, recorded_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                entry.name,
                entry.severity,
                entry.notes,
                Self::timestamp(&entry.recorded_at),
            ],
        )?;

        tracing::debug!("Saved symptom {} to storage", entry.id);
        Ok(entry)
    }

    fn update_symptom(&self, entry: &SymptomLogEntry) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let changed = conn.execute(
            "UPDATE symptoms SET name = ?2, severity = ?3, notes = ?4, recorded_at = ?5 WHERE id = ?1",
            params![
                entry.id,
                entry.name,
                entry.severity,
                entry.notes,
                Self::timestamp(&entry.recorded_at),
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::NotFound(format!("symptom {}", entry.id)));
        }
        Ok(())
    }

    fn remove_symptom(&self, id: &str) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let changed = conn.execute("DELETE FROM symptoms WHERE id = ?1", params![id])?;

        if changed == 0 {
            return Err(StorageError::NotFound(format!("symptom {id}")));
        }
        Ok(())
    }

    fn list_symptoms(&self) -> Result<Vec<SymptomLogEntry>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        Self::query_symptoms(&conn, "ORDER BY recorded_at ASC, rowid ASC", [])
    }

    fn load_recent_symptoms(&self, limit: usize) -> Result<Vec<SymptomLogEntry>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        Self::query_symptoms(
            &conn,
            "ORDER BY recorded_at DESC, rowid DESC LIMIT ?1",
            params![limit as i64],
        )
    }

    fn load_symptoms_paginated(&self, offset: usize, limit: usize) -> Result<SymptomPage, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let total_count: i64 = conn.query_row("SELECT COUNT(*) FROM symptoms", [], |row| row.get(0))?;
        let items = Self::query_symptoms(
            &conn,
            "ORDER BY recorded_at DESC, rowid DESC LIMIT ?1 OFFSET ?2",
            params![limit as i64, offset as i64],
        )?;

        Ok(SymptomPage::new(items, total_count as usize, offset, limit))
    }

    fn count_symptoms(&self) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM symptoms", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn add_recovery_feedback(&self, feedback: &NewFeedback) -> Result<RecoveryFeedback, Self::Error> {
        let stored = RecoveryFeedback::record(feedback);
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute(
            "INSERT INTO recovery_feedback (strategy_id, helpful, notes, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                stored.strategy_id,
                stored.helpful,
                stored.notes,
                Self::timestamp(&stored.recorded_at),
            ],
        )?;

        tracing::debug!("Saved feedback for strategy {}", stored.strategy_id);
        Ok(stored)
    }

    fn list_recovery_feedback(&self) -> Result<Vec<RecoveryFeedback>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let mut stmt = conn.prepare(
            "SELECT strategy_id, helpful, notes, recorded_at FROM recovery_feedback ORDER BY id ASC",
        )?;
        let feedback = stmt
            .query_map([], |row| {
                Ok(RecoveryFeedback {
                    strategy_id: row.get(0)?,
                    helpful: row.get(1)?,
                    notes: row.get(2)?,
                    recorded_at: Self::parse_timestamp(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(feedback)
    }

    fn complete_onboarding(&self) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute(
            "INSERT OR REPLACE INTO profile (id, onboarding_complete) VALUES (1, 1)",
            [],
        )?;
        tracing::info!("Onboarding marked complete");
        Ok(())
    }

    fn is_onboarding_complete(&self) -> Result<bool, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let complete: Option<bool> = conn
            .query_row(
                "SELECT onboarding_complete FROM profile WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(complete.unwrap_or(false))
    }

    fn clear_all(&self) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute_batch(
            "DELETE FROM profile; DELETE FROM demographics; DELETE FROM symptoms; DELETE FROM recovery_feedback;",
        )?;
        tracing::warn!("Cleared all data from storage");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserProfile;

    fn store() -> SqliteProfileStore {
        SqliteProfileStore::in_memory().expect("Should create db")
    }

    #[test]
    fn test_symptom_crud() {
        let store = store();
        assert_eq!(store.count_symptoms().expect("Should count"), 0);

        let entry = store
            .append_symptom(&NewSymptom::new("Headache", 3, "Category: Physical"))
            .expect("Should save");
        assert_eq!(store.count_symptoms().expect("Should count"), 1);

        let loaded = store.list_symptoms().expect("Should load");
        assert_eq!(loaded, vec![entry.clone()]);

        let mut updated = entry.clone();
        updated.severity = 5;
        store.update_symptom(&updated).expect("Should update");
        assert_eq!(store.list_symptoms().expect("Should load")[0].severity, 5);

        store.remove_symptom(&entry.id).expect("Should delete");
        assert_eq!(store.count_symptoms().expect("Should count"), 0);
    }

    #[test]
    fn test_returned_entries_match_stored_rows() {
        let store = store();
        let returned: Vec<SymptomLogEntry> = (0..20)
            .map(|i| {
                store
                    .append_symptom(&NewSymptom::new("Fatigue", 1 + i % 5, ""))
                    .expect("Should save")
            })
            .collect();

        let stored = store.list_symptoms().expect("Should load");
        for entry in &returned {
            let row = stored
                .iter()
                .find(|row| row.id == entry.id)
                .expect("Should find stored row");
            assert_eq!(row, entry);
        }

        let feedback = store
            .add_recovery_feedback(&NewFeedback {
                strategy_id: "rest-periods".to_string(),
                helpful: false,
                notes: String::new(),
            })
            .expect("Should save");
        assert_eq!(store.list_recovery_feedback().expect("Should load"), vec![feedback]);
    }

    #[test]
    fn test_missing_symptom_is_not_found() {
        let store = store();
        let ghost = SymptomLogEntry::record(&NewSymptom::new("Nausea", 2, ""));

        assert!(matches!(store.update_symptom(&ghost), Err(StorageError::NotFound(_))));
        assert!(matches!(store.remove_symptom(&ghost.id), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_ordering_and_pagination() {
        let store = store();
        for (i, name) in ["Headache", "Nausea", "Insomnia"].iter().enumerate() {
            store
                .append_symptom(&NewSymptom::new(*name, (i + 2) as u8, ""))
                .expect("Should save");
        }

        let oldest_first: Vec<String> = store
            .list_symptoms()
            .expect("Should load")
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(oldest_first, ["Headache", "Nausea", "Insomnia"]);

        let recent = store.load_recent_symptoms(2).expect("Should load");
        assert_eq!(recent[0].name, "Insomnia");
        assert_eq!(recent.len(), 2);

        let page = store.load_symptoms_paginated(2, 2).expect("Should page");
        assert_eq!(page.total_count, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Headache");
        assert!(!page.has_more);
    }

    #[test]
    fn test_demographics_and_onboarding() {
        let store = store();
        assert!(store.load_demographics().expect("Should load").is_none());
        assert!(!store.is_onboarding_complete().expect("Should load"));

        let demographics = Demographics {
            age: "29".to_string(),
            injury_cause: "Cycling".to_string(),
            ..Default::default()
        };
        store.save_demographics(&demographics).expect("Should save");
        store.complete_onboarding().expect("Should save");

        let profile = store.load_profile().expect("Should load");
        assert_eq!(profile.demographics, demographics);
        assert!(profile.onboarding_complete);
    }

    #[test]
    fn test_feedback_and_reset() {
        let store = store();
        store
            .add_recovery_feedback(&NewFeedback {
                strategy_id: "hydration".to_string(),
                helpful: true,
                notes: "Fewer headaches".to_string(),
            })
            .expect("Should save");
        store
            .append_symptom(&NewSymptom::new("Headache", 2, ""))
            .expect("Should save");
        store.complete_onboarding().expect("Should save");

        let feedback = store.list_recovery_feedback().expect("Should load");
        assert_eq!(feedback.len(), 1);
        assert!(feedback[0].helpful);

        store.clear_all().expect("Should clear");
        assert_eq!(store.load_profile().expect("Should load"), UserProfile::default());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("profile.db");

        {
            let store = SqliteProfileStore::new(&path).expect("Should open");
            store
                .append_symptom(&NewSymptom::new("Fatigue or low energy", 4, ""))
                .expect("Should save");
        }

        let reopened = SqliteProfileStore::new(&path).expect("Should reopen");
        let entries = reopened.list_symptoms().expect("Should load");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, 4);
    }
}
