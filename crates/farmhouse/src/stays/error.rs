use super::domain::{BookingId, RangeError};
use super::repository::RepositoryError;

/// Why a stay operation was refused or failed. Rejections perform no writes.
#[derive(Debug, thiserror::Error)]
pub enum StayError {
    #[error("invalid dates: {0}")]
    InvalidRange(#[from] RangeError),
    #[error("limit reached: {active} active bookings (max {limit})")]
    QuotaExceeded { active: usize, limit: usize },
    #[error("dates locked: already confirmed by {holder}")]
    DatesLocked { holder: String, booking: BookingId },
    #[error("priority too low: pending request has score {theirs} (you: {yours})")]
    PriorityTooLow { yours: i64, theirs: i64 },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("booking {0} is already cancelled")]
    AlreadyCancelled(BookingId),
    #[error("booking {0} has already ended")]
    StayEnded(BookingId),
    #[error("a dirty condition report needs an evidence photo")]
    MissingEvidence,
    #[error("booking {0} already has a condition report")]
    AlreadyInspected(BookingId),
    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

impl StayError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StayError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code for API payloads.
    pub const fn code(&self) -> &'static str {
        match self {
            StayError::InvalidRange(_) => "invalid_range",
            StayError::QuotaExceeded { .. } => "quota_exceeded",
            StayError::DatesLocked { .. } => "dates_locked",
            StayError::PriorityTooLow { .. } => "priority_too_low",
            StayError::NotFound { .. } => "not_found",
            StayError::AlreadyCancelled(_) => "already_cancelled",
            StayError::StayEnded(_) => "stay_ended",
            StayError::MissingEvidence => "missing_evidence",
            StayError::AlreadyInspected(_) => "already_inspected",
            StayError::Persistence(RepositoryError::ScoreOverflow(_)) => "score_out_of_range",
            StayError::Persistence(_) => "persistence_failure",
        }
    }
}
