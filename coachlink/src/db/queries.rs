//! Database query implementations.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Activity, Assignment, Participant, Role};

/// Parse a timestamp string flexibly from various formats.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    // Try RFC3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try common SQLite datetime format: "YYYY-MM-DD HH:MM:SS"
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    // Try with fractional seconds: "YYYY-MM-DD HH:MM:SS.SSS"
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    anyhow::bail!("Invalid timestamp format: {s}")
}

/// Queries for the participants table.
pub struct ParticipantQueries;

impl ParticipantQueries {
    /// Insert a new participant. Returns whether a row was inserted;
    /// an already-present id is ignored and reports `false`.
    pub fn insert(conn: &Connection, participant: &Participant) -> Result<bool> {
        let inserted = conn.execute(
            r"INSERT OR IGNORE INTO participants (id, display_name, role, created_at)
              VALUES (?1, ?2, ?3, ?4)",
            params![
                participant.id,
                participant.display_name,
                participant.role.as_str(),
                participant.created_at.to_rfc3339(),
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Get a participant by ID.
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Participant>> {
        let mut stmt = conn.prepare(
            "SELECT id, display_name, role, created_at FROM participants WHERE id = ?1",
        )?;

        let result = stmt.query_row(params![id], |row| Ok(Self::row_to_participant(row)));

        match result {
            Ok(participant) => Ok(Some(participant?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all participants.
    pub fn list(conn: &Connection) -> Result<Vec<Participant>> {
        let mut stmt = conn.prepare(
            "SELECT id, display_name, role, created_at FROM participants ORDER BY display_name ASC",
        )?;
        let rows = stmt.query_map([], |row| Ok(Self::row_to_participant(row)))?;

        let mut participants = Vec::new();
        for row in rows {
            participants.push(row??);
        }
        Ok(participants)
    }

    /// Convert a row to a Participant.
    fn row_to_participant(row: &rusqlite::Row<'_>) -> Result<Participant> {
        let role_str: String = row.get(2)?;
        let role =
            Role::from_str(&role_str).context(format!("Invalid participant role: {role_str}"))?;

        let created_at_str: String = row.get(3)?;
        let created_at = parse_timestamp(&created_at_str)?;

        Ok(Participant {
            id: row.get(0)?,
            display_name: row.get(1)?,
            role,
            created_at,
        })
    }
}

/// Queries for the assignments table.
pub struct AssignmentQueries;

impl AssignmentQueries {
    /// Insert a new assignment. Returns whether a row was inserted;
    /// an already-assigned pair is ignored and reports `false`.
    pub fn insert(conn: &Connection, assignment: &Assignment) -> Result<bool> {
        let inserted = conn.execute(
            r"INSERT OR IGNORE INTO assignments (id, coach_id, student_id, active, created_at)
              VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                assignment.id,
                assignment.coach_id,
                assignment.student_id,
                assignment.active,
                assignment.created_at.to_rfc3339(),
            ],
        )?;
        Ok(inserted > 0)
    }

    /// List all assignments.
    pub fn list(conn: &Connection) -> Result<Vec<Assignment>> {
        let mut stmt = conn.prepare(
            r"SELECT id, coach_id, student_id, active, created_at
              FROM assignments ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], |row| Ok(Self::row_to_assignment(row)))?;

        let mut assignments = Vec::new();
        for row in rows {
            assignments.push(row??);
        }
        Ok(assignments)
    }

    /// Students actively assigned to a coach (the partner-selection list).
    pub fn students_for_coach(conn: &Connection, coach_id: &str) -> Result<Vec<Participant>> {
        let mut stmt = conn.prepare(
            r"SELECT p.id, p.display_name, p.role, p.created_at
              FROM assignments a
              JOIN participants p ON p.id = a.student_id
              WHERE a.coach_id = ?1 AND a.active = 1
              ORDER BY p.display_name ASC",
        )?;
        let rows = stmt.query_map(params![coach_id], |row| {
            Ok(ParticipantQueries::row_to_participant(row))
        })?;

        let mut students = Vec::new();
        for row in rows {
            students.push(row??);
        }
        Ok(students)
    }

    /// The coach actively assigned to a student, if any.
    ///
    /// The UI assumes at most one; if the store holds several, the earliest
    /// assignment wins deterministically.
    pub fn coach_for_student(conn: &Connection, student_id: &str) -> Result<Option<Participant>> {
        let mut stmt = conn.prepare(
            r"SELECT p.id, p.display_name, p.role, p.created_at
              FROM assignments a
              JOIN participants p ON p.id = a.coach_id
              WHERE a.student_id = ?1 AND a.active = 1
              ORDER BY a.created_at ASC LIMIT 1",
        )?;

        let result = stmt.query_row(params![student_id], |row| {
            Ok(ParticipantQueries::row_to_participant(row))
        });

        match result {
            Ok(coach) => Ok(Some(coach?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Convert a row to an Assignment.
    fn row_to_assignment(row: &rusqlite::Row<'_>) -> Result<Assignment> {
        let created_at_str: String = row.get(4)?;
        let created_at = parse_timestamp(&created_at_str)?;

        Ok(Assignment {
            id: row.get(0)?,
            coach_id: row.get(1)?,
            student_id: row.get(2)?,
            active: row.get(3)?,
            created_at,
        })
    }
}

/// Queries for the activities table.
pub struct ActivityQueries;

impl ActivityQueries {
    /// Insert a new activity. Returns whether a row was inserted;
    /// an already-present id is ignored and reports `false`.
    pub fn insert(conn: &Connection, activity: &Activity) -> Result<bool> {
        let inserted = conn.execute(
            r"INSERT OR IGNORE INTO activities (id, participant_id, title, starts_at, created_at)
              VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                activity.id,
                activity.participant_id,
                activity.title,
                activity.starts_at.to_rfc3339(),
                activity.created_at.to_rfc3339(),
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Get an activity by ID.
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Activity>> {
        let mut stmt = conn.prepare(
            r"SELECT id, participant_id, title, starts_at, created_at
              FROM activities WHERE id = ?1",
        )?;

        let result = stmt.query_row(params![id], |row| Ok(Self::row_to_activity(row)));

        match result {
            Ok(activity) => Ok(Some(activity?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List activities, optionally filtered by participant.
    pub fn list(conn: &Connection, participant_id: Option<&str>) -> Result<Vec<Activity>> {
        let mut activities = Vec::new();

        if let Some(pid) = participant_id {
            let mut stmt = conn.prepare(
                r"SELECT id, participant_id, title, starts_at, created_at
                  FROM activities WHERE participant_id = ?1 ORDER BY starts_at ASC",
            )?;
            let rows = stmt.query_map(params![pid], |row| Ok(Self::row_to_activity(row)))?;
            for row in rows {
                activities.push(row??);
            }
        } else {
            let mut stmt = conn.prepare(
                r"SELECT id, participant_id, title, starts_at, created_at
                  FROM activities ORDER BY starts_at ASC",
            )?;
            let rows = stmt.query_map([], |row| Ok(Self::row_to_activity(row)))?;
            for row in rows {
                activities.push(row??);
            }
        }

        Ok(activities)
    }

    /// Convert a row to an Activity.
    fn row_to_activity(row: &rusqlite::Row<'_>) -> Result<Activity> {
        let starts_at_str: String = row.get(3)?;
        let starts_at = parse_timestamp(&starts_at_str)?;

        let created_at_str: String = row.get(4)?;
        let created_at = parse_timestamp(&created_at_str)?;

        Ok(Activity {
            id: row.get(0)?,
            participant_id: row.get(1)?,
            title: row.get(2)?,
            starts_at,
            created_at,
        })
    }
}
