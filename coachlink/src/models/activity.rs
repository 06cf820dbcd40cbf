//! Scheduled activity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled activity (e.g. a coaching session slot) that reminders are
/// computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier for the activity.
    pub id: String,
    /// Participant the activity belongs to.
    pub participant_id: String,
    /// Short human-readable title.
    pub title: String,
    /// When the activity starts.
    pub starts_at: DateTime<Utc>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// Create a new activity.
    pub fn new(id: String, participant_id: String, title: String, starts_at: DateTime<Utc>) -> Self {
        Self {
            id,
            participant_id,
            title,
            starts_at,
            created_at: Utc::now(),
        }
    }
}
