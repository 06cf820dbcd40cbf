//! Database connection management.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Database wrapper for coachlink.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at the default location
    /// (`~/.coachlink/coachlink.db`).
    pub fn open() -> Result<Self> {
        let db_path = Self::default_path()?;
        Self::open_at(&db_path)
    }

    /// Get the default database path.
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::home_dir()
            .context("Could not find home directory")?
            .join(".coachlink");
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create directory: {}", data_dir.display()))?;
        Ok(data_dir.join("coachlink.db"))
    }

    /// Open or create the database at a specific path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Open an in-memory database (tests).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS participants (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'student',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS assignments (
                id TEXT PRIMARY KEY,
                coach_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                FOREIGN KEY (coach_id) REFERENCES participants(id),
                FOREIGN KEY (student_id) REFERENCES participants(id),
                UNIQUE (coach_id, student_id)
            );

            CREATE TABLE IF NOT EXISTS activities (
                id TEXT PRIMARY KEY,
                participant_id TEXT NOT NULL,
                title TEXT NOT NULL,
                starts_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (participant_id) REFERENCES participants(id)
            );

            CREATE INDEX IF NOT EXISTS idx_participants_role ON participants(role);
            CREATE INDEX IF NOT EXISTS idx_assignments_coach_id ON assignments(coach_id);
            CREATE INDEX IF NOT EXISTS idx_assignments_student_id ON assignments(student_id);
            CREATE INDEX IF NOT EXISTS idx_activities_participant_id ON activities(participant_id);
            ",
        )?;
        Ok(())
    }

    /// Get a reference to the connection.
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }
}
