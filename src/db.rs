use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Show {
    pub name: String,
    pub added: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub name: String,
    pub season: u32,
    pub episode: u32,
    pub added: DateTime<Utc>,
}

impl HistoryEntry {
    /// Same season, following episode.
    pub fn next_episode(&self) -> (u32, u32) {
        (self.season, self.episode.saturating_add(1))
    }
}

/// Progressively narrower history filters, mirroring the positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryFilter {
    All,
    Show(String),
    Season(String, u32),
    Episode(String, u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyExists,
}

pub struct Database {
    conn: Connection,
}

struct RawHistoryRow {
    name: String,
    season: u32,
    episode: u32,
    added: String,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.migrate()?;
        Ok(db)
    }

    pub fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS shows (
                name TEXT NOT NULL UNIQUE,
                added TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS history (
                name TEXT NOT NULL,
                season INTEGER NOT NULL,
                episode INTEGER NOT NULL,
                added TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_shows_added ON shows(added DESC);
            CREATE INDEX IF NOT EXISTS idx_history_added ON history(added DESC);
            CREATE INDEX IF NOT EXISTS idx_history_name_added ON history(name, added DESC);
            "#,
        )?;
        Ok(())
    }

    pub fn show_exists(&self, name: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM shows WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn add_show(&self, name: &str) -> Result<AddOutcome, StoreError> {
        self.add_show_at(name, Utc::now())
    }

    pub fn add_show_at(&self, name: &str, added: DateTime<Utc>) -> Result<AddOutcome, StoreError> {
        if self.show_exists(name)? {
            return Ok(AddOutcome::AlreadyExists);
        }
        self.conn.execute(
            "INSERT INTO shows (name, added) VALUES (?1, ?2)",
            params![name, format_timestamp(added)],
        )?;
        Ok(AddOutcome::Added)
    }

    pub fn list_shows(&self) -> Result<Vec<Show>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, added FROM shows ORDER BY added DESC, rowid DESC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (name, raw) = row?;
            let added = parse_timestamp(&name, &raw)?;
            out.push(Show { name, added });
        }
        Ok(out)
    }

    /// Most recently added show whose name contains `pattern`, ignoring case.
    pub fn search(&self, pattern: &str) -> Result<Option<String>, StoreError> {
        let needle = pattern.to_lowercase();
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM shows ORDER BY added DESC, rowid DESC")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for name in names {
            let name = name?;
            if name.to_lowercase().contains(&needle) {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }

    pub fn record_history(
        &self,
        name: &str,
        season: u32,
        episode: u32,
        added: DateTime<Utc>,
    ) -> Result<HistoryEntry, StoreError> {
        let added = added.trunc_subsecs(6);
        self.conn.execute(
            "INSERT INTO history (name, season, episode, added) VALUES (?1, ?2, ?3, ?4)",
            params![name, season, episode, format_timestamp(added)],
        )?;
        Ok(HistoryEntry {
            name: name.to_string(),
            season,
            episode,
            added,
        })
    }

    pub fn query_history(
        &self,
        filter: &HistoryFilter,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut sql = String::from("SELECT name, season, episode, added FROM history");
        let mut values: Vec<Value> = Vec::new();
        match filter {
            HistoryFilter::All => {}
            HistoryFilter::Show(name) => {
                sql.push_str(" WHERE name = ?");
                values.push(Value::Text(name.clone()));
            }
            HistoryFilter::Season(name, season) => {
                sql.push_str(" WHERE name = ? AND season = ?");
                values.push(Value::Text(name.clone()));
                values.push(Value::Integer(i64::from(*season)));
            }
            HistoryFilter::Episode(name, season, episode) => {
                sql.push_str(" WHERE name = ? AND season = ? AND episode = ?");
                values.push(Value::Text(name.clone()));
                values.push(Value::Integer(i64::from(*season)));
                values.push(Value::Integer(i64::from(*episode)));
            }
        }
        sql.push_str(" ORDER BY added DESC, rowid DESC LIMIT ?");
        values.push(Value::Integer(i64::from(limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), raw_history_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_entry()?);
        }
        Ok(out)
    }

    pub fn most_recent_entry(&self, name: &str) -> Result<Option<HistoryEntry>, StoreError> {
        let raw = self
            .conn
            .query_row(
                "SELECT name, season, episode, added FROM history WHERE name = ?1
                 ORDER BY added DESC, rowid DESC LIMIT 1",
                params![name],
                raw_history_row,
            )
            .optional()?;
        raw.map(RawHistoryRow::into_entry).transpose()
    }

    pub fn next_episode(&self, name: &str) -> Result<Option<(u32, u32)>, StoreError> {
        Ok(self
            .most_recent_entry(name)?
            .map(|entry| entry.next_episode()))
    }
}

impl RawHistoryRow {
    fn into_entry(self) -> Result<HistoryEntry, StoreError> {
        let added = parse_timestamp(&self.name, &self.added)?;
        Ok(HistoryEntry {
            name: self.name,
            season: self.season,
            episode: self.episode,
            added,
        })
    }
}

fn raw_history_row(row: &Row<'_>) -> rusqlite::Result<RawHistoryRow> {
    Ok(RawHistoryRow {
        name: row.get(0)?,
        season: row.get(1)?,
        episode: row.get(2)?,
        added: row.get(3)?,
    })
}

// Fixed width so that text order equals time order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(name: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| StoreError::Timestamp {
            name: name.to_string(),
            raw: raw.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn at(offset_secs: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-19T12:00:00Z")
            .expect("fixed timestamp should parse")
            .with_timezone(&Utc)
            + TimeDelta::seconds(offset_secs)
    }

    #[test]
    fn adding_a_show_twice_keeps_one_row() {
        let db = Database::open_in_memory().expect("db should open");
        assert_eq!(db.add_show("Lost").expect("add should work"), AddOutcome::Added);
        assert_eq!(
            db.add_show("Lost").expect("add should work"),
            AddOutcome::AlreadyExists
        );
        assert_eq!(db.list_shows().expect("list should work").len(), 1);
    }

    #[test]
    fn show_names_are_case_sensitive() {
        let db = Database::open_in_memory().expect("db should open");
        db.add_show("Lost").expect("add should work");
        assert_eq!(db.add_show("lost").expect("add should work"), AddOutcome::Added);
        assert!(db.show_exists("Lost").expect("exists should work"));
        assert!(db.show_exists("lost").expect("exists should work"));
        assert!(!db.show_exists("LOST").expect("exists should work"));
    }

    #[test]
    fn exists_is_true_only_after_add() {
        let db = Database::open_in_memory().expect("db should open");
        assert!(!db.show_exists("Fringe").expect("exists should work"));
        db.add_show("Fringe").expect("add should work");
        assert!(db.show_exists("Fringe").expect("exists should work"));
        assert!(!db.show_exists("Firefly").expect("exists should work"));
    }

    #[test]
    fn shows_are_listed_newest_first() {
        let db = Database::open_in_memory().expect("db should open");
        db.add_show_at("Old", at(0)).expect("add should work");
        db.add_show_at("Newest", at(120)).expect("add should work");
        db.add_show_at("Middle", at(60)).expect("add should work");

        let names: Vec<String> = db
            .list_shows()
            .expect("list should work")
            .into_iter()
            .map(|show| show.name)
            .collect();
        assert_eq!(names, ["Newest", "Middle", "Old"]);
    }

    #[test]
    fn recorded_entry_round_trips_through_query() {
        let db = Database::open_in_memory().expect("db should open");
        let now = Utc::now();
        let written = db
            .record_history("Lost", 2, 5, now)
            .expect("record should work");

        let read = db
            .query_history(&HistoryFilter::Episode("Lost".to_string(), 2, 5), 10)
            .expect("query should work");
        assert_eq!(read, vec![written.clone()]);
        assert!((now - written.added).num_microseconds().unwrap_or(i64::MAX).abs() < 1);
    }

    #[test]
    fn history_is_limited_and_ordered_newest_first() {
        let db = Database::open_in_memory().expect("db should open");
        for i in 0..8 {
            db.record_history("Lost", 1, i, at(i64::from(i) * 60))
                .expect("record should work");
        }

        let rows = db
            .query_history(&HistoryFilter::All, 5)
            .expect("query should work");
        assert_eq!(rows.len(), 5);
        let episodes: Vec<u32> = rows.iter().map(|entry| entry.episode).collect();
        assert_eq!(episodes, [7, 6, 5, 4, 3]);
        assert!(rows.windows(2).all(|pair| pair[0].added > pair[1].added));
    }

    #[test]
    fn history_filters_narrow_progressively() {
        let db = Database::open_in_memory().expect("db should open");
        db.record_history("Lost", 1, 1, at(0)).expect("record should work");
        db.record_history("Lost", 1, 2, at(1)).expect("record should work");
        db.record_history("Lost", 2, 1, at(2)).expect("record should work");
        db.record_history("Fringe", 1, 1, at(3)).expect("record should work");

        let count = |filter: HistoryFilter| {
            db.query_history(&filter, 100)
                .expect("query should work")
                .len()
        };
        assert_eq!(count(HistoryFilter::All), 4);
        assert_eq!(count(HistoryFilter::Show("Lost".to_string())), 3);
        assert_eq!(count(HistoryFilter::Season("Lost".to_string(), 1)), 2);
        assert_eq!(count(HistoryFilter::Episode("Lost".to_string(), 1, 2)), 1);
        assert_eq!(count(HistoryFilter::Episode("Lost".to_string(), 3, 1)), 0);
    }

    #[test]
    fn same_timestamp_rows_fall_back_to_insertion_order() {
        let db = Database::open_in_memory().expect("db should open");
        db.record_history("Lost", 1, 1, at(0)).expect("record should work");
        db.record_history("Lost", 1, 2, at(0)).expect("record should work");

        let latest = db
            .most_recent_entry("Lost")
            .expect("lookup should work")
            .expect("entry should exist");
        assert_eq!(latest.episode, 2);
    }

    #[test]
    fn next_episode_increments_latest_entry() {
        let db = Database::open_in_memory().expect("db should open");
        db.record_history("Lost", 2, 4, at(0)).expect("record should work");
        db.record_history("Lost", 2, 5, at(10)).expect("record should work");
        db.record_history("Lost", 1, 9, at(-10)).expect("record should work");

        assert_eq!(db.next_episode("Lost").expect("lookup should work"), Some((2, 6)));
        assert_eq!(db.next_episode("Fringe").expect("lookup should work"), None);
    }

    #[test]
    fn history_for_unknown_show_is_accepted() {
        let db = Database::open_in_memory().expect("db should open");
        db.record_history("Not In Catalog", 1, 1, at(0))
            .expect("record should work without a catalog entry");
        assert!(!db.show_exists("Not In Catalog").expect("exists should work"));
    }

    #[test]
    fn search_matches_fragment_ignoring_case() {
        let db = Database::open_in_memory().expect("db should open");
        db.add_show_at("Breaking Bad", at(0)).expect("add should work");
        db.add_show_at("Better Call Saul", at(10)).expect("add should work");

        assert_eq!(
            db.search("bad").expect("search should work"),
            Some("Breaking Bad".to_string())
        );
        assert_eq!(
            db.search("B").expect("search should work"),
            Some("Better Call Saul".to_string())
        );
        assert_eq!(db.search("lost").expect("search should work"), None);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let db = Database::open_in_memory().expect("db should open");
        db.add_show("Lost").expect("add should work");
        assert_eq!(db.search("%").expect("search should work"), None);
        assert_eq!(db.search("L_st").expect("search should work"), None);
    }

    #[test]
    fn search_ignores_case_beyond_ascii() {
        let db = Database::open_in_memory().expect("db should open");
        db.add_show("Ödland").expect("add should work");
        assert_eq!(
            db.search("ödland").expect("search should work"),
            Some("Ödland".to_string())
        );
        assert_eq!(
            db.search("ÖDL").expect("search should work"),
            Some("Ödland".to_string())
        );
    }

    #[test]
    fn malformed_stored_timestamp_is_a_store_error() {
        let db = Database::open_in_memory().expect("db should open");
        db.conn
            .execute(
                "INSERT INTO history (name, season, episode, added) VALUES ('Lost', 1, 1, 'yesterday')",
                [],
            )
            .expect("raw insert should work");

        let err = db
            .most_recent_entry("Lost")
            .expect_err("bad timestamp must not decode");
        assert!(matches!(err, StoreError::Timestamp { .. }));
    }

    #[test]
    fn open_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("nested").join("seen.db");
        let db = Database::open(&path).expect("db should open");
        db.migrate().expect("migrate should work");
        assert!(path.exists());
    }
}
