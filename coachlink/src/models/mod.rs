//! Data models for participants, assignments, and scheduled activities.

mod activity;
mod assignment;
mod participant;

pub use activity::Activity;
pub use assignment::Assignment;
pub use participant::{EntryFlow, Participant, Role};
