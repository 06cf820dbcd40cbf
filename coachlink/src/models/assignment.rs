//! Assignment model linking a coach to a student.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An active relation between one coach and one student.
///
/// The UI assumes at most one active assignment per student; that invariant
/// is the backing store's to enforce, not this layer's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique identifier for the assignment.
    pub id: String,
    /// Coach (responder-role) participant id.
    pub coach_id: String,
    /// Student (initiator-role) participant id.
    pub student_id: String,
    /// Whether the assignment is currently active.
    pub active: bool,
    /// When the assignment was created.
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// Create a new active assignment.
    pub fn new(id: String, coach_id: String, student_id: String) -> Self {
        Self {
            id,
            coach_id,
            student_id,
            active: true,
            created_at: Utc::now(),
        }
    }
}
