use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RateCard;

/// Identifier of a household sharing the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyId(pub u32);

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the person who placed a request. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub String);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InspectionId(pub String);

/// Household record. The core only ever writes `priority_score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub id: FamilyId,
    pub name: String,
    pub priority_score: i64,
    #[serde(skip_serializing)]
    pub pin_code: Option<String>,
    /// Bumped by the store on every score write.
    pub version: u64,
}

/// Who is travelling decides the nightly rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingType {
    Family,
    Friends,
}

impl BookingType {
    pub const fn rate(self, rates: &RateCard) -> i64 {
        match self {
            BookingType::Family => rates.family,
            BookingType::Friends => rates.friends,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            BookingType::Family => "family",
            BookingType::Friends => "friends",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub const fn is_live(self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

/// Reasons a pair of dates cannot describe a stay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("check-out {end} must fall after check-in {start}")]
    NotAfterStart { start: NaiveDate, end: NaiveDate },
    #[error("check-in {start} is in the past (today is {today})")]
    StartsInPast { start: NaiveDate, today: NaiveDate },
}

/// Check-in and check-out dates of a stay, with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStayRange")]
pub struct StayRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl StayRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start >= end {
            return Err(RangeError::NotAfterStart { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whole calendar days between check-in and check-out.
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Inclusive on both ends: a check-out day collides with a check-in on the same day.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Deserialize)]
struct RawStayRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawStayRange> for StayRange {
    type Error = RangeError;

    fn try_from(raw: RawStayRange) -> Result<Self, Self::Error> {
        StayRange::new(raw.start, raw.end)
    }
}

impl fmt::Display for StayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub family_id: FamilyId,
    pub user_id: UserId,
    pub range: StayRange,
    pub booking_type: BookingType,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn start_date(&self) -> NaiveDate {
        self.range.start()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.range.end()
    }

    /// Midnight (UTC) of the check-in day.
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.start_date()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or(self.created_at)
    }
}

/// Durable notice for a household, written when it loses a priority battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub family_id: FamilyId,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Post check-in condition report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionReport {
    pub id: InspectionId,
    pub booking_id: BookingId,
    pub inspector_id: UserId,
    pub is_clean: bool,
    pub evidence_photo_url: Option<String>,
    pub comments: String,
    pub filed_at: DateTime<Utc>,
}
