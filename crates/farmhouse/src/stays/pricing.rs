use serde::Serialize;

use super::domain::{Booking, BookingType, StayRange};
use crate::config::RateCard;

/// Score cost of a stay: nights times the nightly rate for its booking type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StayCost {
    pub nights: i64,
    pub rate: i64,
    pub total: i64,
}

impl StayCost {
    pub fn of(range: &StayRange, booking_type: BookingType, rates: &RateCard) -> Self {
        let nights = range.nights();
        let rate = booking_type.rate(rates);
        Self {
            nights,
            rate,
            total: nights * rate,
        }
    }

    pub fn of_booking(booking: &Booking, rates: &RateCard) -> Self {
        Self::of(&booking.range, booking.booking_type, rates)
    }
}

/// Preview shown before a request is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StayQuote {
    pub booking_type: BookingType,
    pub cost: StayCost,
    pub current_score: i64,
    pub remaining_score: i64,
}

impl StayQuote {
    pub fn new(
        range: &StayRange,
        booking_type: BookingType,
        rates: &RateCard,
        current_score: i64,
    ) -> Self {
        let cost = StayCost::of(range, booking_type, rates);
        Self {
            booking_type,
            cost,
            current_score,
            remaining_score: current_score - cost.total,
        }
    }

    pub fn overdrawn(&self) -> bool {
        self.remaining_score < 0
    }
}
