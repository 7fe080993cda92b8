use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{BookingId, FamilyId, InspectionId, InspectionReport, UserId};
use super::error::StayError;
use super::repository::{BookingFilter, Changeset, Mutation, Precondition, StayRepository};

static INSPECTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_inspection_id() -> InspectionId {
    let id = INSPECTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InspectionId(format!("insp-{id:06}"))
}

/// Report filed by the arriving household on check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionReport {
    pub booking_id: BookingId,
    pub inspector_id: UserId,
    pub is_clean: bool,
    #[serde(default)]
    pub evidence_photo_url: Option<String>,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionPenalty {
    pub family_id: FamilyId,
    pub family_name: String,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectionOutcome {
    pub report: InspectionReport,
    pub penalty: Option<ConditionPenalty>,
    pub message: String,
}

/// Files condition reports and fines the previous occupant of a dirty house.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionResolver {
    penalty: i64,
}

impl ConditionResolver {
    pub fn new(penalty: i64) -> Self {
        Self { penalty }
    }

    pub fn file<S>(
        &self,
        store: &S,
        report: ConditionReport,
        now: DateTime<Utc>,
    ) -> Result<InspectionOutcome, StayError>
    where
        S: StayRepository + ?Sized,
    {
        let evidence = report
            .evidence_photo_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if !report.is_clean && evidence.is_none() {
            return Err(StayError::MissingEvidence);
        }

        let booking = store
            .booking(&report.booking_id)?
            .ok_or_else(|| StayError::not_found("booking", &report.booking_id))?;
        if !store.inspections(&booking.id)?.is_empty() {
            return Err(StayError::AlreadyInspected(booking.id));
        }

        let filed = InspectionReport {
            id: next_inspection_id(),
            booking_id: booking.id.clone(),
            inspector_id: report.inspector_id,
            is_clean: report.is_clean,
            evidence_photo_url: evidence,
            comments: report.comments,
            filed_at: now,
        };

        let mut changeset = Changeset::new();
        changeset
            .expect(Precondition::NotInspected {
                booking: booking.id.clone(),
            })
            .apply(Mutation::InsertInspection(filed.clone()));

        if filed.is_clean {
            store.commit(changeset)?;
            info!(booking = %booking.id, "clean condition report filed");
            return Ok(InspectionOutcome {
                report: filed,
                penalty: None,
                message: "Report filed. Thanks for checking in!".to_string(),
            });
        }

        // Most recent stay that checked out before today, cancelled stays excluded.
        let today = now.date_naive();
        let culprit = store
            .bookings(&BookingFilter::live().ending_before(today))?
            .into_iter()
            .max_by(|a, b| {
                a.end_date()
                    .cmp(&b.end_date())
                    .then(a.created_at.cmp(&b.created_at))
            });

        let penalty = match culprit {
            Some(previous) => {
                let family = store
                    .family(previous.family_id)?
                    .ok_or_else(|| StayError::not_found("family", previous.family_id))?;
                changeset.adjust_score(family.id, -self.penalty);
                Some(ConditionPenalty {
                    family_id: family.id,
                    family_name: family.name,
                    points: self.penalty,
                })
            }
            None => None,
        };

        store.commit(changeset)?;

        let message = match &penalty {
            Some(fine) => {
                info!(
                    booking = %booking.id,
                    culprit = %fine.family_id,
                    points = fine.points,
                    "dirty condition report filed; previous guest fined"
                );
                format!(
                    "REPORT FILED! The {} family was fined {} points.",
                    fine.family_name, fine.points
                )
            }
            None => {
                info!(booking = %booking.id, "dirty condition report filed; no previous guest");
                "Report filed, but no previous recent guest found to penalize.".to_string()
            }
        };

        Ok(InspectionOutcome {
            report: filed,
            penalty,
            message,
        })
    }
}
