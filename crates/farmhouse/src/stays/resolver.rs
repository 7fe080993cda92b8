use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    Booking, BookingId, BookingStatus, BookingType, Family, FamilyId, RangeError, StayRange,
    UserId,
};
use super::error::StayError;
use super::notifications::challenge_notice;
use super::pricing::StayCost;
use super::repository::{BookingFilter, Changeset, Mutation, Precondition, StayRepository};
use crate::config::{EconomyConfig, RateCard};

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_booking_id() -> BookingId {
    let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BookingId(format!("bkg-{id:06}"))
}

/// A household's claim on a date range. Identity is supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub family_id: FamilyId,
    pub user_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub booking_type: BookingType,
}

/// A pending claim that lost to the new request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Defeat {
    pub booking_id: BookingId,
    pub family_id: FamilyId,
    pub family_name: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdmissionOutcome {
    /// No competing claim; the request waits out the challenge window unpaid.
    Pending,
    /// Out-scored every overlapping pending claim and confirmed on the spot.
    BattleWon {
        challenger_score: i64,
        defeated: Vec<Defeat>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Admission {
    pub booking: Booking,
    pub cost: StayCost,
    #[serde(flatten)]
    pub outcome: AdmissionOutcome,
    pub score_after: i64,
}

impl Admission {
    pub fn message(&self) -> String {
        match &self.outcome {
            AdmissionOutcome::Pending => format!(
                "Booking requested! Status: PENDING. Cost: {} pts (deducted only if confirmed).",
                self.cost.total
            ),
            AdmissionOutcome::BattleWon {
                challenger_score,
                defeated,
            } => {
                let strongest = defeated
                    .iter()
                    .map(|defeat| defeat.score)
                    .max()
                    .unwrap_or_default();
                format!("PRIORITY BATTLE WON! ({challenger_score} vs {strongest}).")
            }
        }
    }
}

/// Admits, arbitrates or rejects booking requests.
///
/// Rejections happen before any write. An admission, together with any
/// cancelled opponents, their notices and the challenger's charge, is
/// committed as one changeset guarded by the claims and scores it was decided
/// on, so a racing writer turns the request into a persistence failure rather
/// than a double booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictResolver {
    rates: RateCard,
    max_active: usize,
}

impl ConflictResolver {
    pub fn new(rates: RateCard, max_active: usize) -> Self {
        Self { rates, max_active }
    }

    pub fn from_config(config: &EconomyConfig) -> Self {
        Self::new(config.rates, config.max_active_bookings)
    }

    pub fn resolve<S>(
        &self,
        store: &S,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Admission, StayError>
    where
        S: StayRepository + ?Sized,
    {
        let today = now.date_naive();
        let range = StayRange::new(request.start_date, request.end_date)?;
        if range.start() < today {
            return Err(RangeError::StartsInPast {
                start: range.start(),
                today,
            }
            .into());
        }

        let requester = store
            .family(request.family_id)?
            .ok_or_else(|| StayError::not_found("family", request.family_id))?;

        let active = store
            .bookings(&BookingFilter::active(today).for_family(requester.id))?
            .len();
        if active >= self.max_active {
            info!(family = %requester.id, active, "booking rejected: quota reached");
            return Err(StayError::QuotaExceeded {
                active,
                limit: self.max_active,
            });
        }

        let conflicts = store.bookings(&BookingFilter::live().overlapping(range))?;
        if let Some(locked) = conflicts
            .iter()
            .find(|booking| booking.status == BookingStatus::Confirmed)
        {
            let holder = store
                .family(locked.family_id)?
                .map(|family| family.name)
                .unwrap_or_else(|| "someone".to_string());
            info!(family = %requester.id, %range, holder = %holder, "booking rejected: dates locked");
            return Err(StayError::DatesLocked {
                holder,
                booking: locked.id.clone(),
            });
        }

        let mut opponents: Vec<(Booking, Family)> = Vec::with_capacity(conflicts.len());
        for booking in &conflicts {
            let owner = store
                .family(booking.family_id)?
                .ok_or_else(|| StayError::not_found("family", booking.family_id))?;
            opponents.push((booking.clone(), owner));
        }

        if let Some(theirs) = opponents.iter().map(|(_, owner)| owner.priority_score).max() {
            if requester.priority_score <= theirs {
                info!(
                    family = %requester.id,
                    yours = requester.priority_score,
                    theirs,
                    "priority battle lost"
                );
                return Err(StayError::PriorityTooLow {
                    yours: requester.priority_score,
                    theirs,
                });
            }
        }

        let battle = !opponents.is_empty();
        let cost = StayCost::of(&range, request.booking_type, &self.rates);
        let booking = Booking {
            id: next_booking_id(),
            family_id: requester.id,
            user_id: request.user_id,
            range,
            booking_type: request.booking_type,
            status: if battle {
                BookingStatus::Confirmed
            } else {
                BookingStatus::Pending
            },
            created_at: now,
        };

        let mut changeset = Changeset::new();
        changeset
            .expect(Precondition::RangeClaims {
                range,
                bookings: conflicts.iter().map(|booking| booking.id.clone()).collect(),
            })
            .expect(Precondition::ActiveBelow {
                family: requester.id,
                today,
                limit: self.max_active,
            });

        let mut defeated = Vec::with_capacity(opponents.len());
        if battle {
            changeset.expect_family(&requester);
            for (lost, owner) in &opponents {
                changeset
                    .expect_family(owner)
                    .expect_status(&lost.id, BookingStatus::Pending)
                    .set_status(&lost.id, BookingStatus::Cancelled)
                    .apply(Mutation::InsertNotification(challenge_notice(
                        lost,
                        &requester,
                        requester.priority_score,
                        owner.priority_score,
                        now,
                    )));
                defeated.push(Defeat {
                    booking_id: lost.id.clone(),
                    family_id: owner.id,
                    family_name: owner.name.clone(),
                    score: owner.priority_score,
                });
            }
        }

        changeset.apply(Mutation::InsertBooking(booking.clone()));
        if battle {
            changeset.adjust_score(requester.id, -cost.total);
        }

        let receipt = store.commit(changeset).map_err(|err| {
            warn!(family = %requester.id, %range, error = %err, "booking commit failed");
            err
        })?;
        let score_after = receipt
            .family(requester.id)
            .map(|family| family.priority_score)
            .unwrap_or(requester.priority_score);

        let outcome = if battle {
            info!(
                booking = %booking.id,
                family = %requester.id,
                defeated = defeated.len(),
                cost = cost.total,
                score_after,
                "priority battle won; booking confirmed"
            );
            AdmissionOutcome::BattleWon {
                challenger_score: requester.priority_score,
                defeated,
            }
        } else {
            info!(booking = %booking.id, family = %requester.id, %range, "booking admitted as pending");
            AdmissionOutcome::Pending
        };

        Ok(Admission {
            booking,
            cost,
            outcome,
            score_after,
        })
    }
}
