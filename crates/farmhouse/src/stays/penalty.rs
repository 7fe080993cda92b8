use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::domain::Booking;
use crate::config::EconomyConfig;

/// One step of the late-cancellation schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PenaltyTier {
    /// Applies when the stay starts this many days from today, or fewer.
    pub days_before: i64,
    pub penalty: i64,
}

/// Which rule priced a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CancellationTerms {
    GracePeriod,
    Late { days_before: i64 },
    Free,
}

impl CancellationTerms {
    pub fn label(self) -> String {
        match self {
            CancellationTerms::GracePeriod => "Free (Grace Period)".to_string(),
            CancellationTerms::Late { days_before: 1 } => {
                "Late Cancellation (1 day before)".to_string()
            }
            CancellationTerms::Late { days_before } => {
                format!("Late Cancellation ({days_before} days before)")
            }
            CancellationTerms::Free => "Free Cancellation".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CancellationCharge {
    pub penalty: i64,
    pub terms: CancellationTerms,
}

impl CancellationCharge {
    pub fn label(&self) -> String {
        self.terms.label()
    }
}

/// Grace period plus a tiered schedule, tightest tier first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationPolicy {
    grace_period: Duration,
    tiers: Vec<PenaltyTier>,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self::new(
            Duration::hours(1),
            vec![
                PenaltyTier {
                    days_before: 1,
                    penalty: 15,
                },
                PenaltyTier {
                    days_before: 2,
                    penalty: 8,
                },
                PenaltyTier {
                    days_before: 3,
                    penalty: 5,
                },
            ],
        )
    }
}

impl CancellationPolicy {
    pub fn new(grace_period: Duration, mut tiers: Vec<PenaltyTier>) -> Self {
        tiers.sort_by_key(|tier| tier.days_before);
        Self {
            grace_period,
            tiers,
        }
    }

    pub fn from_config(config: &EconomyConfig) -> Self {
        Self {
            grace_period: config.grace_period(),
            ..Self::default()
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Prices cancelling a stay booked at `created_at` that starts on `start_date`.
    pub fn assess(
        &self,
        created_at: DateTime<Utc>,
        start_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> CancellationCharge {
        if now - created_at <= self.grace_period {
            return CancellationCharge {
                penalty: 0,
                terms: CancellationTerms::GracePeriod,
            };
        }

        let days_before = (start_date - now.date_naive()).num_days();
        self.tiers
            .iter()
            .find(|tier| days_before <= tier.days_before)
            .map(|tier| CancellationCharge {
                penalty: tier.penalty,
                terms: CancellationTerms::Late {
                    days_before: tier.days_before,
                },
            })
            .unwrap_or(CancellationCharge {
                penalty: 0,
                terms: CancellationTerms::Free,
            })
    }

    pub fn assess_booking(&self, booking: &Booking, now: DateTime<Utc>) -> CancellationCharge {
        self.assess(booking.created_at, booking.start_date(), now)
    }
}
