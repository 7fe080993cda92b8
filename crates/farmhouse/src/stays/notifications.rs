use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use super::domain::{Booking, Family, Notification, NotificationId};

static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_notification_id() -> NotificationId {
    let id = NOTIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NotificationId(format!("ntf-{id:06}"))
}

/// Notice for the household whose pending request was out-bid and cancelled.
pub fn challenge_notice(
    cancelled: &Booking,
    challenger: &Family,
    challenger_score: i64,
    defender_score: i64,
    now: DateTime<Utc>,
) -> Notification {
    Notification {
        id: next_notification_id(),
        family_id: cancelled.family_id,
        message: format!(
            "Your booking for {} was CHALLENGED and CANCELLED by {} because they had a higher \
             Priority Score ({} vs {}).",
            cancelled.range, challenger.name, challenger_score, defender_score
        ),
        is_read: false,
        created_at: now,
    }
}
