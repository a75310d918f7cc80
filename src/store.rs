//! Quiz record storage backed by SQLite.
//!
//! Records are addressed by their position in enumeration order (rowid
//! ascending), not by rowid. Deleting a record therefore shifts every later
//! index down by one.
use crate::error::{QuizError, Result};
use crate::quiz::QuizRecord;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Default path of the SQLite database file
pub const DB_PATH: &str = "quizzes.sqlite";

/// Records written into an empty store on first start
pub const DEFAULT_QUIZZES: [(&str, &str); 4] = [
    ("Capital of Italy", "Rome"),
    ("Capital of France", "Paris"),
    ("Capital of Spain", "Madrid"),
    ("Capital of Portugal", "Lisbon"),
];

/// Ordered, index-addressed collection of quiz records.
pub trait QuizStore {
    /// All records with their current index, in enumeration order.
    fn list(&self) -> Result<Vec<(usize, QuizRecord)>>;

    /// Fails with `QuizError::NotFound` when `index` is out of range.
    fn get(&self, index: usize) -> Result<QuizRecord>;

    /// Appends a record and returns its index.
    fn add(&mut self, record: QuizRecord) -> Result<usize>;

    fn update(&mut self, index: usize, record: QuizRecord) -> Result<()>;

    /// Removes the record at `index` and returns it.
    fn delete(&mut self, index: usize) -> Result<QuizRecord>;

    fn count(&self) -> Result<usize>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened quiz database");
        Self::with_connection(conn)
    }

    /// A store that lives only as long as the process.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS quizzes (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                answer   TEXT NOT NULL
            )",
        )?;
        Ok(Self { conn })
    }

    /// Rowid of the record currently at `index`.
    fn row_id(&self, index: usize) -> Result<i64> {
        let offset = i64::try_from(index).map_err(|_| QuizError::NotFound(index))?;
        self.conn
            .query_row(
                "SELECT id FROM quizzes ORDER BY id LIMIT 1 OFFSET ?1",
                params![offset],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(QuizError::NotFound(index))
    }
}

impl QuizStore for SqliteStore {
    fn list(&self) -> Result<Vec<(usize, QuizRecord)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT question, answer FROM quizzes ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(QuizRecord {
                question: row.get(0)?,
                answer: row.get(1)?,
            })
        })?;

        let mut records = Vec::new();
        for (index, row) in rows.enumerate() {
            records.push((index, row?));
        }
        Ok(records)
    }

    fn get(&self, index: usize) -> Result<QuizRecord> {
        let id = self.row_id(index)?;
        let record = self.conn.query_row(
            "SELECT question, answer FROM quizzes WHERE id = ?1",
            params![id],
            |row| {
                Ok(QuizRecord {
                    question: row.get(0)?,
                    answer: row.get(1)?,
                })
            },
        )?;
        Ok(record)
    }

    fn add(&mut self, record: QuizRecord) -> Result<usize> {
        self.conn.execute(
            "INSERT INTO quizzes (question, answer) VALUES (?1, ?2)",
            params![record.question, record.answer],
        )?;
        let index = self.count()? - 1;
        debug!(index, "added quiz");
        Ok(index)
    }

    fn update(&mut self, index: usize, record: QuizRecord) -> Result<()> {
        let id = self.row_id(index)?;
        self.conn.execute(
            "UPDATE quizzes SET question = ?1, answer = ?2 WHERE id = ?3",
            params![record.question, record.answer, id],
        )?;
        debug!(index, "updated quiz");
        Ok(())
    }

    fn delete(&mut self, index: usize) -> Result<QuizRecord> {
        let record = self.get(index)?;
        let id = self.row_id(index)?;
        self.conn
            .execute("DELETE FROM quizzes WHERE id = ?1", params![id])?;
        debug!(index, "deleted quiz");
        Ok(record)
    }

    fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM quizzes", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

/// Writes `DEFAULT_QUIZZES` into the store if it holds no records.
///
/// Returns how many records were added.
pub fn seed_defaults<S: QuizStore + ?Sized>(store: &mut S) -> Result<usize> {
    if store.count()? > 0 {
        return Ok(0);
    }
    for (question, answer) in DEFAULT_QUIZZES {
        store.add(QuizRecord::new(question, answer))?;
    }
    info!(count = DEFAULT_QUIZZES.len(), "seeded default quizzes");
    Ok(DEFAULT_QUIZZES.len())
}

/// Appends every record of a JSON array file (`[{"question": .., "answer": ..}]`).
pub fn import_json<S, P>(store: &mut S, path: P) -> Result<usize>
where
    S: QuizStore + ?Sized,
    P: AsRef<Path>,
{
    let raw = fs::read_to_string(path.as_ref())?;
    let records: Vec<QuizRecord> = serde_json::from_str(&raw)?;
    let count = records.len();
    for record in records {
        store.add(record)?;
    }
    info!(count, path = %path.as_ref().display(), "imported quizzes");
    Ok(count)
}
