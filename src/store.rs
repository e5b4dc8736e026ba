use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::history::Attempt;
use crate::stats::PerformanceTier;

/// Capability the ledger uses to round-trip history.
///
/// `load` returns `Ok(None)` when nothing was ever saved. Attempts are always
/// exchanged newest first.
pub trait HistoryStore {
    fn load(&self) -> Result<Option<Vec<Attempt>>, StoreError>;
    fn save(&mut self, attempts: &[Attempt]) -> Result<(), StoreError>;
}

impl<S: HistoryStore + ?Sized> HistoryStore for Box<S> {
    fn load(&self) -> Result<Option<Vec<Attempt>>, StoreError> {
        (**self).load()
    }

    fn save(&mut self, attempts: &[Attempt]) -> Result<(), StoreError> {
        (**self).save(attempts)
    }
}

/// In-process store for tests and sessions that should leave no trace
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<Vec<Attempt>>,
    saves: usize,
    unreadable: bool,
}

impl MemoryStore {
    pub fn with_attempts(attempts: Vec<Attempt>) -> Self {
        Self {
            saved: Some(attempts),
            ..Self::default()
        }
    }

    /// A store whose initial contents cannot be parsed
    pub fn unreadable() -> Self {
        Self {
            unreadable: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Option<&[Attempt]> {
        self.saved.as_deref()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<Attempt>>, StoreError> {
        if self.unreadable {
            return Err(StoreError::Malformed("unreadable memory store".into()));
        }
        Ok(self.saved.clone())
    }

    fn save(&mut self, attempts: &[Attempt]) -> Result<(), StoreError> {
        self.unreadable = false;
        self.saved = Some(attempts.to_vec());
        self.saves += 1;
        Ok(())
    }
}

/// History kept as a JSON array of attempts in a single file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::history_json_path().unwrap_or_else(|| PathBuf::from("lightsout_history.json")),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<Attempt>>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice::<Vec<Attempt>>(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Malformed(format!("{}: {}", self.path.display(), e)))
    }

    fn save(&mut self, attempts: &[Attempt]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(attempts)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// History kept in a SQLite table, one row per attempt
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens the database at the default state location
    pub fn open_default() -> Result<Self, StoreError> {
        let path = AppDirs::history_db_path().unwrap_or_else(|| PathBuf::from("lightsout_history.db"));
        Self::open(path)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS attempts (
                position INTEGER NOT NULL,
                id TEXT PRIMARY KEY,
                reaction_time REAL NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_attempts_position ON attempts(position)",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl HistoryStore for SqliteStore {
    fn load(&self) -> Result<Option<Vec<Attempt>>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, reaction_time, created_at FROM attempts ORDER BY position ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut attempts = Vec::new();
        for row in rows {
            let (id, reaction_time, created_at) = row?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| StoreError::Malformed(format!("attempt {}: {}", id, e)))?
                .with_timezone(&Utc);
            attempts.push(Attempt {
                id,
                reaction_time,
                created_at,
            });
        }

        if attempts.is_empty() {
            Ok(None)
        } else {
            Ok(Some(attempts))
        }
    }

    fn save(&mut self, attempts: &[Attempt]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM attempts", [])?;
        for (position, attempt) in attempts.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO attempts (position, id, reaction_time, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    position as i64,
                    attempt.id,
                    attempt.reaction_time,
                    attempt.created_at.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    date: String,
    reaction_time: String,
    rating: &'a str,
}

/// Writes attempts as `date,reaction_time,rating` rows
pub fn write_csv<W: Write>(attempts: &[Attempt], out: W) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_writer(out);
    for attempt in attempts {
        wtr.serialize(CsvRow {
            date: attempt.created_at.to_rfc3339(),
            reaction_time: format!("{:.3}", attempt.reaction_time),
            rating: PerformanceTier::from_reaction(attempt.reaction_time).label(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}
