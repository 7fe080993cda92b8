use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::domain::{Booking, BookingStatus};
use super::error::StayError;
use super::pricing::StayCost;
use super::repository::{Changeset, RepositoryError, StayRepository};
use crate::config::{EconomyConfig, RateCard};

/// Challenge window after which an unchallenged PENDING request confirms itself.
///
/// There is no scheduler: maturation runs whenever a household's booking list
/// is read. A request also matures once its check-in day has arrived, so a
/// stay booked for tomorrow cannot sit out the window unchallenged and unpaid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWindow {
    window: Duration,
    rates: RateCard,
}

impl PendingWindow {
    pub fn new(window: Duration, rates: RateCard) -> Self {
        Self { window, rates }
    }

    pub fn from_config(config: &EconomyConfig) -> Self {
        Self::new(config.pending_window(), config.rates)
    }

    /// Earliest instant the booking may mature.
    pub fn matures_at(&self, booking: &Booking) -> DateTime<Utc> {
        (booking.created_at + self.window).min(booking.starts_at())
    }

    pub fn is_due(&self, booking: &Booking, now: DateTime<Utc>) -> bool {
        booking.status == BookingStatus::Pending
            && (now - booking.created_at >= self.window || now >= booking.starts_at())
    }

    /// Confirms every due booking in `bookings`, charging its owner at today's
    /// score. Returns the list with statuses as they stand after the pass;
    /// bookings cancelled underneath us are dropped.
    pub fn mature<S>(
        &self,
        store: &S,
        bookings: Vec<Booking>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StayError>
    where
        S: StayRepository + ?Sized,
    {
        let mut settled = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let current = if self.is_due(&booking, now) {
                self.confirm(store, booking)?
            } else {
                Some(booking)
            };
            settled.extend(current.filter(|booking| booking.status.is_live()));
        }
        Ok(settled)
    }

    fn confirm<S>(&self, store: &S, mut booking: Booking) -> Result<Option<Booking>, StayError>
    where
        S: StayRepository + ?Sized,
    {
        let cost = StayCost::of_booking(&booking, &self.rates);
        let mut changeset = Changeset::new();
        changeset
            .expect_status(&booking.id, BookingStatus::Pending)
            .set_status(&booking.id, BookingStatus::Confirmed)
            .adjust_score(booking.family_id, -cost.total);

        match store.commit(changeset) {
            Ok(receipt) => {
                info!(
                    booking = %booking.id,
                    family = %booking.family_id,
                    cost = cost.total,
                    score = ?receipt
                        .family(booking.family_id)
                        .map(|family| family.priority_score),
                    "pending booking matured"
                );
                booking.status = BookingStatus::Confirmed;
                Ok(Some(booking))
            }
            Err(RepositoryError::Conflict(reason)) => {
                debug!(booking = %booking.id, %reason, "booking settled by another reader");
                Ok(store.booking(&booking.id)?)
            }
            Err(err) => Err(err.into()),
        }
    }
}
