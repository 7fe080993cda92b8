//! Booking admission, priority battles, the pending window and the score
//! ledger for the shared property.
//!
//! Every write is expressed as a [`Changeset`] and committed atomically by a
//! [`StayRepository`]; the components here only decide what to write.

pub mod clock;
pub mod domain;
pub mod error;
pub mod inspection;
pub mod ledger;
pub mod lifecycle;
pub mod memory;
pub(crate) mod notifications;
pub mod penalty;
pub mod pricing;
pub mod repository;
pub mod resolver;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    Booking, BookingId, BookingStatus, BookingType, Family, FamilyId, InspectionId,
    InspectionReport, Notification, NotificationId, RangeError, StayRange, UserId,
};
pub use error::StayError;
pub use inspection::{ConditionPenalty, ConditionReport, ConditionResolver, InspectionOutcome};
pub use ledger::{ScoreLedger, Standing};
pub use lifecycle::PendingWindow;
pub use memory::InMemoryStore;
pub use penalty::{CancellationCharge, CancellationPolicy, CancellationTerms, PenaltyTier};
pub use pricing::{StayCost, StayQuote};
pub use repository::{
    BookingFilter, Changeset, CommitReceipt, Mutation, Precondition, RepositoryError,
    StayRepository,
};
pub use resolver::{Admission, AdmissionOutcome, BookingRequest, ConflictResolver, Defeat};
pub use router::stay_router;
pub use service::{
    BookingView, CancellationOutcome, FamilyBookings, Occupancy, QuoteRequest, StayService,
    TripCard,
};
