use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Booking, BookingId, Family, FamilyId, InspectionReport, Notification, NotificationId,
};
use super::repository::{
    BookingFilter, Changeset, CommitReceipt, Mutation, Precondition, RepositoryError,
    StayRepository,
};

#[derive(Debug, Clone, Default)]
struct StoreState {
    families: BTreeMap<FamilyId, Family>,
    bookings: Vec<Booking>,
    notifications: Vec<Notification>,
    inspections: Vec<InspectionReport>,
}

impl StoreState {
    fn booking_mut(&mut self, id: &BookingId) -> Result<&mut Booking, RepositoryError> {
        self.bookings
            .iter_mut()
            .find(|booking| &booking.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("booking {id}")))
    }

    fn family_mut(&mut self, id: FamilyId) -> Result<&mut Family, RepositoryError> {
        self.families
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("family {id}")))
    }

    fn check(&self, precondition: &Precondition) -> Result<(), RepositoryError> {
        match precondition {
            Precondition::FamilyVersion { family, version } => {
                let stored = self
                    .families
                    .get(family)
                    .ok_or_else(|| RepositoryError::NotFound(format!("family {family}")))?;
                if stored.version != *version {
                    return Err(RepositoryError::Conflict(format!(
                        "score of family {family} changed since it was read"
                    )));
                }
            }
            Precondition::BookingStatus { booking, status } => {
                let stored = self
                    .bookings
                    .iter()
                    .find(|candidate| &candidate.id == booking)
                    .ok_or_else(|| RepositoryError::NotFound(format!("booking {booking}")))?;
                if stored.status != *status {
                    return Err(RepositoryError::Conflict(format!(
                        "booking {booking} is now {}",
                        stored.status.label()
                    )));
                }
            }
            Precondition::RangeClaims { range, bookings } => {
                let expected: BTreeSet<&str> =
                    bookings.iter().map(|id| id.0.as_str()).collect();
                let filter = BookingFilter::live().overlapping(*range);
                let current: BTreeSet<&str> = self
                    .bookings
                    .iter()
                    .filter(|booking| filter.matches(booking))
                    .map(|booking| booking.id.0.as_str())
                    .collect();
                if current != expected {
                    return Err(RepositoryError::Conflict(format!(
                        "claims on {range} changed since they were read"
                    )));
                }
            }
            Precondition::NotInspected { booking } => {
                if self
                    .inspections
                    .iter()
                    .any(|report| &report.booking_id == booking)
                {
                    return Err(RepositoryError::Conflict(format!(
                        "booking {booking} was inspected concurrently"
                    )));
                }
            }
            Precondition::ActiveBelow {
                family,
                today,
                limit,
            } => {
                let filter = BookingFilter::active(*today).for_family(*family);
                let active = self
                    .bookings
                    .iter()
                    .filter(|booking| filter.matches(booking))
                    .count();
                if active >= *limit {
                    return Err(RepositoryError::Conflict(format!(
                        "family {family} now holds {active} active bookings"
                    )));
                }
            }
        }
        Ok(())
    }

    fn apply(
        &mut self,
        mutation: Mutation,
        touched: &mut BTreeSet<FamilyId>,
    ) -> Result<(), RepositoryError> {
        match mutation {
            Mutation::InsertBooking(booking) => {
                if self.bookings.iter().any(|existing| existing.id == booking.id) {
                    return Err(RepositoryError::Duplicate);
                }
                self.bookings.push(booking);
            }
            Mutation::SetBookingStatus { booking, status } => {
                self.booking_mut(&booking)?.status = status;
            }
            Mutation::AdjustScore { family, delta } => {
                let stored = self.family_mut(family)?;
                stored.priority_score = stored
                    .priority_score
                    .checked_add(delta)
                    .ok_or(RepositoryError::ScoreOverflow(family))?;
                stored.version += 1;
                touched.insert(family);
            }
            Mutation::ResetScores { score } => {
                for family in self.families.values_mut() {
                    family.priority_score = score;
                    family.version += 1;
                    touched.insert(family.id);
                }
            }
            Mutation::InsertNotification(notification) => {
                self.notifications.push(notification);
            }
            Mutation::MarkNotificationRead { notification } => {
                let stored = self
                    .notifications
                    .iter_mut()
                    .find(|candidate| candidate.id == notification)
                    .ok_or_else(|| {
                        RepositoryError::NotFound(format!("notification {}", notification.0))
                    })?;
                stored.is_read = true;
            }
            Mutation::InsertInspection(report) => {
                if self.inspections.iter().any(|existing| existing.id == report.id) {
                    return Err(RepositoryError::Duplicate);
                }
                self.inspections.push(report);
            }
        }
        Ok(())
    }
}

/// Process-local store guarded by a single mutex.
///
/// A commit validates and applies against a copy of the state and swaps it in
/// only when every precondition and mutation succeeded.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    /// Registers a household with the next free id.
    pub fn register_family(
        &self,
        name: impl Into<String>,
        priority_score: i64,
    ) -> Result<Family, RepositoryError> {
        let mut state = self.lock()?;
        let id = state
            .families
            .keys()
            .next_back()
            .map(|last| FamilyId(last.0 + 1))
            .unwrap_or(FamilyId(1));
        let family = Family {
            id,
            name: name.into(),
            priority_score,
            pin_code: None,
            version: 0,
        };
        state.families.insert(id, family.clone());
        Ok(family)
    }
}

impl StayRepository for InMemoryStore {
    fn family(&self, id: FamilyId) -> Result<Option<Family>, RepositoryError> {
        Ok(self.lock()?.families.get(&id).cloned())
    }

    fn families(&self) -> Result<Vec<Family>, RepositoryError> {
        Ok(self.lock()?.families.values().cloned().collect())
    }

    fn booking(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        Ok(self
            .lock()?
            .bookings
            .iter()
            .find(|booking| &booking.id == id)
            .cloned())
    }

    fn bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, RepositoryError> {
        let state = self.lock()?;
        let mut matches: Vec<Booking> = state
            .bookings
            .iter()
            .filter(|booking| filter.matches(booking))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            a.start_date()
                .cmp(&b.start_date())
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(matches)
    }

    fn notifications(
        &self,
        family: FamilyId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let state = self.lock()?;
        let mut notices: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|notice| notice.family_id == family && !(unread_only && notice.is_read))
            .cloned()
            .collect();
        notices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notices)
    }

    fn notification(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError> {
        Ok(self
            .lock()?
            .notifications
            .iter()
            .find(|notice| &notice.id == id)
            .cloned())
    }

    fn inspections(&self, booking: &BookingId) -> Result<Vec<InspectionReport>, RepositoryError> {
        Ok(self
            .lock()?
            .inspections
            .iter()
            .filter(|report| &report.booking_id == booking)
            .cloned()
            .collect())
    }

    fn commit(&self, changeset: Changeset) -> Result<CommitReceipt, RepositoryError> {
        let mut state = self.lock()?;
        for precondition in &changeset.preconditions {
            state.check(precondition)?;
        }

        let mut staged = (*state).clone();
        let mut touched = BTreeSet::new();
        for mutation in changeset.mutations {
            staged.apply(mutation, &mut touched)?;
        }

        let families = touched
            .iter()
            .filter_map(|id| staged.families.get(id).cloned())
            .collect();
        *state = staged;
        Ok(CommitReceipt { families })
    }
}
