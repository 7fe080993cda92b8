use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::clock::{Clock, SystemClock};
use super::domain::{
    Booking, BookingId, BookingStatus, BookingType, Family, FamilyId, Notification,
    NotificationId, StayRange,
};
use super::error::StayError;
use super::inspection::{ConditionReport, ConditionResolver, InspectionOutcome};
use super::ledger::{ScoreLedger, Standing};
use super::lifecycle::PendingWindow;
use super::penalty::{CancellationCharge, CancellationPolicy};
use super::pricing::{StayCost, StayQuote};
use super::repository::{BookingFilter, Changeset, Mutation, StayRepository};
use super::resolver::{Admission, BookingRequest, ConflictResolver};
use crate::config::EconomyConfig;

/// A booking as shown to its household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub cost: StayCost,
    /// A condition report has been filed on check-in.
    pub inspected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyBookings {
    pub family: Family,
    pub bookings: Vec<BookingView>,
}

/// Row of the shared upcoming-trips board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripCard {
    #[serde(flatten)]
    pub booking: Booking,
    pub family_name: String,
    pub is_mine: bool,
    pub challengeable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub date: NaiveDate,
    pub booking: Option<Booking>,
    pub family_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancellationOutcome {
    pub booking: Booking,
    pub charge: CancellationCharge,
    pub score_after: i64,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub family_id: FamilyId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub booking_type: BookingType,
}

/// Service composing the score ledger, the pending window, the conflict
/// resolver, the cancellation schedule and the condition-report resolver over
/// one store.
pub struct StayService<S> {
    store: Arc<S>,
    ledger: ScoreLedger<S>,
    window: PendingWindow,
    resolver: ConflictResolver,
    cancellation: CancellationPolicy,
    conditions: ConditionResolver,
    economy: EconomyConfig,
    clock: Arc<dyn Clock>,
}

impl<S> StayService<S>
where
    S: StayRepository + 'static,
{
    pub fn new(store: Arc<S>, economy: EconomyConfig) -> Self {
        Self::with_clock(store, economy, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, economy: EconomyConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: ScoreLedger::new(Arc::clone(&store)),
            window: PendingWindow::from_config(&economy),
            resolver: ConflictResolver::from_config(&economy),
            cancellation: CancellationPolicy::from_config(&economy),
            conditions: ConditionResolver::new(economy.condition_penalty),
            store,
            economy,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn economy(&self) -> &EconomyConfig {
        &self.economy
    }

    /// Cost of a prospective stay against the household's current score.
    pub fn quote(&self, request: QuoteRequest) -> Result<StayQuote, StayError> {
        let range = StayRange::new(request.start_date, request.end_date)?;
        let score = self.ledger.balance(request.family_id)?;
        Ok(StayQuote::new(
            &range,
            request.booking_type,
            &self.economy.rates,
            score,
        ))
    }

    /// What cancelling a stay starting on `start_date` would cost at `now`
    /// once the grace period has run out.
    pub fn late_cancellation_preview(
        &self,
        start_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> CancellationCharge {
        let booked_at = now - self.cancellation.grace_period() - Duration::seconds(1);
        self.cancellation.assess(booked_at, start_date, now)
    }

    pub fn request_booking(
        &self,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Admission, StayError> {
        self.resolver.resolve(self.store.as_ref(), request, now)
    }

    /// Upcoming and current bookings of a household. Every live booking whose
    /// window has passed is matured first, finished stays included.
    pub fn family_bookings(
        &self,
        family: FamilyId,
        now: DateTime<Utc>,
    ) -> Result<FamilyBookings, StayError> {
        self.ledger.family(family)?;
        let listed = self
            .store
            .bookings(&BookingFilter::live().for_family(family))?;
        let settled = self.window.mature(self.store.as_ref(), listed, now)?;

        let today = now.date_naive();
        let mut bookings = Vec::with_capacity(settled.len());
        for booking in settled.into_iter().filter(|booking| booking.end_date() >= today) {
            let inspected = !self.store.inspections(&booking.id)?.is_empty();
            bookings.push(BookingView {
                cost: StayCost::of_booking(&booking, &self.economy.rates),
                booking,
                inspected,
            });
        }

        Ok(FamilyBookings {
            family: self.ledger.family(family)?,
            bookings,
        })
    }

    /// Cancels a household's own booking, charging any late-cancellation penalty.
    pub fn cancel_booking(
        &self,
        family: FamilyId,
        booking: &BookingId,
        now: DateTime<Utc>,
    ) -> Result<CancellationOutcome, StayError> {
        let mut stored = self
            .store
            .booking(booking)?
            .filter(|candidate| candidate.family_id == family)
            .ok_or_else(|| StayError::not_found("booking", booking))?;
        if stored.status == BookingStatus::Cancelled {
            return Err(StayError::AlreadyCancelled(stored.id));
        }
        if stored.end_date() < now.date_naive() {
            return Err(StayError::StayEnded(stored.id));
        }

        let charge = self.cancellation.assess_booking(&stored, now);
        let mut changeset = Changeset::new();
        changeset
            .expect_status(&stored.id, stored.status)
            .set_status(&stored.id, BookingStatus::Cancelled)
            .adjust_score(family, -charge.penalty);

        let receipt = self.store.commit(changeset).map_err(|err| {
            warn!(booking = %stored.id, error = %err, "cancellation commit failed");
            err
        })?;
        let score_after = match receipt.family(family) {
            Some(updated) => updated.priority_score,
            None => self.ledger.balance(family)?,
        };

        info!(
            booking = %stored.id,
            family = %family,
            penalty = charge.penalty,
            terms = %charge.label(),
            score_after,
            "booking cancelled"
        );

        stored.status = BookingStatus::Cancelled;
        let message = if charge.penalty > 0 {
            format!("Cancelled. Penalty: -{} pts ({}).", charge.penalty, charge.label())
        } else {
            format!("Cancelled (No Penalty). {}.", charge.label())
        };
        Ok(CancellationOutcome {
            booking: stored,
            charge,
            score_after,
            message,
        })
    }

    pub fn file_inspection(
        &self,
        report: ConditionReport,
        now: DateTime<Utc>,
    ) -> Result<InspectionOutcome, StayError> {
        self.conditions.file(self.store.as_ref(), report, now)
    }

    pub fn unread_notifications(&self, family: FamilyId) -> Result<Vec<Notification>, StayError> {
        self.ledger.family(family)?;
        Ok(self.store.notifications(family, true)?)
    }

    /// Marks a notice read. Dismissing twice is a no-op.
    pub fn dismiss_notification(&self, id: &NotificationId) -> Result<Notification, StayError> {
        let mut notice = self
            .store
            .notification(id)?
            .ok_or_else(|| StayError::not_found("notification", &id.0))?;
        if notice.is_read {
            return Ok(notice);
        }

        let mut changeset = Changeset::new();
        changeset.apply(Mutation::MarkNotificationRead {
            notification: id.clone(),
        });
        self.store.commit(changeset)?;
        notice.is_read = true;
        Ok(notice)
    }

    pub fn leaderboard(&self) -> Result<Vec<Standing>, StayError> {
        self.ledger.standings()
    }

    /// Every active booking, soonest first, from the viewing household's side.
    pub fn trip_board(
        &self,
        viewer: Option<FamilyId>,
        today: NaiveDate,
    ) -> Result<Vec<TripCard>, StayError> {
        let families = self.store.families()?;
        let bookings = self.store.bookings(&BookingFilter::active(today))?;
        Ok(bookings
            .into_iter()
            .map(|booking| {
                let family_name = families
                    .iter()
                    .find(|family| family.id == booking.family_id)
                    .map(|family| family.name.clone())
                    .unwrap_or_default();
                let is_mine = viewer == Some(booking.family_id);
                TripCard {
                    challengeable: booking.status == BookingStatus::Pending && !is_mine,
                    is_mine,
                    family_name,
                    booking,
                }
            })
            .collect())
    }

    /// Live booking covering `date`, check-in and check-out days included.
    pub fn occupancy(&self, date: NaiveDate) -> Result<Occupancy, StayError> {
        let booking = self
            .store
            .bookings(&BookingFilter::live())?
            .into_iter()
            .find(|booking| booking.range.contains(date));
        let family_name = match &booking {
            Some(found) => self.store.family(found.family_id)?.map(|family| family.name),
            None => None,
        };
        Ok(Occupancy {
            date,
            booking,
            family_name,
        })
    }

    /// Opens a new season at the configured score. Privileged.
    pub fn reset_scores(&self) -> Result<Vec<Family>, StayError> {
        self.ledger.reset_all(self.economy.season_score)
    }

    /// Manual bonus or fine. Privileged.
    pub fn adjust_score(&self, family: FamilyId, delta: i64) -> Result<Family, StayError> {
        self.ledger.adjust(family, delta)
    }
}
