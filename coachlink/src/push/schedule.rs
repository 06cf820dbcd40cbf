//! Reminder time computation for scheduled activities.

use chrono::{DateTime, Duration, Utc};

/// Reminder offsets before an activity start, in minutes.
/// 0 means a notification at the start itself.
const OFFSETS_MINUTES: &[(i64, &str)] = &[
    (24 * 60, "Tomorrow"),
    (60, "In one hour"),
    (0, "Starting now"),
];

/// One planned reminder for an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// When the reminder fires.
    pub fires_at: DateTime<Utc>,
    /// Short lead-in used as the notification title prefix.
    pub label: &'static str,
}

/// Compute reminder instants for an activity starting at `starts_at`.
///
/// Pure offset arithmetic: instants already in the past at `now` are
/// dropped, so a reminder is never scheduled behind the clock.
pub fn reminder_times(starts_at: DateTime<Utc>, now: DateTime<Utc>) -> Vec<Reminder> {
    OFFSETS_MINUTES
        .iter()
        .filter_map(|&(minutes, label)| {
            let fires_at = starts_at - Duration::minutes(minutes);
            (fires_at >= now).then_some(Reminder { fires_at, label })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_all_reminders_for_far_future_activity() {
        let starts = Utc.with_ymd_and_hms(2024, 6, 12, 9, 0, 0).unwrap();
        let reminders = reminder_times(starts, at(9));
        assert_eq!(reminders.len(), 3);
        assert_eq!(
            reminders[0].fires_at,
            Utc.with_ymd_and_hms(2024, 6, 11, 9, 0, 0).unwrap()
        );
        assert_eq!(reminders[2].fires_at, starts);
    }

    #[test]
    fn test_past_offsets_are_dropped() {
        // Activity in 30 minutes: the day-before and hour-before instants
        // have already passed.
        let starts = Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap();
        let reminders = reminder_times(starts, at(9));
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].label, "Starting now");
    }

    #[test]
    fn test_activity_in_the_past_yields_nothing() {
        let starts = at(8);
        assert!(reminder_times(starts, at(9)).is_empty());
    }

    #[test]
    fn test_boundary_instant_is_kept() {
        // A reminder firing exactly at `now` is still scheduled.
        let starts = at(10);
        let reminders = reminder_times(starts, at(9));
        assert!(reminders.iter().any(|r| r.fires_at == at(9)));
    }
}
