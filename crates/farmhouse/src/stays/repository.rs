use chrono::NaiveDate;

use super::domain::{
    Booking, BookingId, BookingStatus, Family, FamilyId, InspectionReport, Notification,
    NotificationId, StayRange,
};

/// Query over the booking table. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub family: Option<FamilyId>,
    pub overlapping: Option<StayRange>,
    pub ending_on_or_after: Option<NaiveDate>,
    pub ending_before: Option<NaiveDate>,
    pub include_cancelled: bool,
}

impl BookingFilter {
    /// Every non-cancelled booking.
    pub fn live() -> Self {
        Self::default()
    }

    /// Non-cancelled bookings that have not ended before `today`.
    pub fn active(today: NaiveDate) -> Self {
        Self {
            ending_on_or_after: Some(today),
            ..Self::default()
        }
    }

    pub fn for_family(mut self, family: FamilyId) -> Self {
        self.family = Some(family);
        self
    }

    pub fn overlapping(mut self, range: StayRange) -> Self {
        self.overlapping = Some(range);
        self
    }

    pub fn ending_before(mut self, date: NaiveDate) -> Self {
        self.ending_before = Some(date);
        self
    }

    pub fn with_cancelled(mut self) -> Self {
        self.include_cancelled = true;
        self
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        if !self.include_cancelled && !booking.status.is_live() {
            return false;
        }
        if self.family.is_some_and(|family| family != booking.family_id) {
            return false;
        }
        if self
            .overlapping
            .is_some_and(|range| !range.overlaps(&booking.range))
        {
            return false;
        }
        if self
            .ending_on_or_after
            .is_some_and(|date| booking.end_date() < date)
        {
            return false;
        }
        if self
            .ending_before
            .is_some_and(|date| booking.end_date() >= date)
        {
            return false;
        }
        true
    }
}

/// Condition that must still hold when a changeset is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The household's score has not been written since it was read.
    FamilyVersion { family: FamilyId, version: u64 },
    BookingStatus {
        booking: BookingId,
        status: BookingStatus,
    },
    /// The live bookings overlapping `range` are exactly `bookings`.
    RangeClaims {
        range: StayRange,
        bookings: Vec<BookingId>,
    },
    /// No condition report has been filed for the booking.
    NotInspected { booking: BookingId },
    /// The household holds fewer than `limit` bookings active on `today`.
    ActiveBelow {
        family: FamilyId,
        today: NaiveDate,
        limit: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    InsertBooking(Booking),
    SetBookingStatus {
        booking: BookingId,
        status: BookingStatus,
    },
    /// Signed delta applied to the stored score, never a stale absolute value.
    AdjustScore { family: FamilyId, delta: i64 },
    ResetScores { score: i64 },
    InsertNotification(Notification),
    MarkNotificationRead { notification: NotificationId },
    InsertInspection(InspectionReport),
}

/// Unit of work applied all-or-nothing by [`StayRepository::commit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    pub preconditions: Vec<Precondition>,
    pub mutations: Vec<Mutation>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(&mut self, precondition: Precondition) -> &mut Self {
        self.preconditions.push(precondition);
        self
    }

    pub fn expect_family(&mut self, family: &Family) -> &mut Self {
        self.expect(Precondition::FamilyVersion {
            family: family.id,
            version: family.version,
        })
    }

    pub fn expect_status(&mut self, booking: &BookingId, status: BookingStatus) -> &mut Self {
        self.expect(Precondition::BookingStatus {
            booking: booking.clone(),
            status,
        })
    }

    pub fn apply(&mut self, mutation: Mutation) -> &mut Self {
        self.mutations.push(mutation);
        self
    }

    pub fn adjust_score(&mut self, family: FamilyId, delta: i64) -> &mut Self {
        if delta != 0 {
            self.apply(Mutation::AdjustScore { family, delta });
        }
        self
    }

    pub fn set_status(&mut self, booking: &BookingId, status: BookingStatus) -> &mut Self {
        self.apply(Mutation::SetBookingStatus {
            booking: booking.clone(),
            status,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// State of every household touched by a committed changeset, after the commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    pub families: Vec<Family>,
}

impl CommitReceipt {
    pub fn family(&self, id: FamilyId) -> Option<&Family> {
        self.families.iter().find(|family| family.id == id)
    }
}

/// Durable store for households, bookings, notices and inspection reports.
///
/// Reads may be stale by the time a decision is written; every write goes
/// through [`StayRepository::commit`], which re-checks the changeset's
/// preconditions and applies its mutations atomically.
pub trait StayRepository: Send + Sync {
    fn family(&self, id: FamilyId) -> Result<Option<Family>, RepositoryError>;
    fn families(&self) -> Result<Vec<Family>, RepositoryError>;
    fn booking(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError>;
    /// Matching bookings ordered by check-in date, then creation time.
    fn bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, RepositoryError>;
    /// Notices for a household, newest first.
    fn notifications(
        &self,
        family: FamilyId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, RepositoryError>;
    fn notification(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError>;
    fn inspections(&self, booking: &BookingId) -> Result<Vec<InspectionReport>, RepositoryError>;
    fn commit(&self, changeset: Changeset) -> Result<CommitReceipt, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Duplicate,
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("score of family {0} is out of range")]
    ScoreOverflow(FamilyId),
    #[error("concurrent modification: {0}")]
    Conflict(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
