use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::EconomyConfig;
use crate::stays::clock::FixedClock;
use crate::stays::domain::{
    Booking, BookingId, BookingType, Family, FamilyId, InspectionReport, Notification,
    NotificationId, UserId,
};
use crate::stays::memory::InMemoryStore;
use crate::stays::repository::{
    BookingFilter, Changeset, CommitReceipt, RepositoryError, StayRepository,
};
use crate::stays::resolver::BookingRequest;
use crate::stays::service::StayService;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid instant")
}

/// 2030-12-20 09:00 UTC, comfortably before the January stays used below.
pub(super) fn december_morning() -> DateTime<Utc> {
    at(2030, 12, 20, 9, 0)
}

pub(super) fn store_with(families: &[(&str, i64)]) -> (Arc<InMemoryStore>, Vec<Family>) {
    let store = InMemoryStore::new();
    let registered = families
        .iter()
        .map(|(name, score)| store.register_family(*name, *score).expect("registers"))
        .collect();
    (Arc::new(store), registered)
}

pub(super) fn request(
    family: &Family,
    start: NaiveDate,
    end: NaiveDate,
    booking_type: BookingType,
) -> BookingRequest {
    BookingRequest {
        family_id: family.id,
        user_id: UserId(format!("usr-{}", family.name.to_lowercase())),
        start_date: start,
        end_date: end,
        booking_type,
    }
}

pub(super) fn service_at(
    store: Arc<InMemoryStore>,
    now: DateTime<Utc>,
) -> (StayService<InMemoryStore>, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(now));
    let service = StayService::with_clock(store, EconomyConfig::default(), clock.clone());
    (service, clock)
}

pub(super) fn score(store: &InMemoryStore, family: FamilyId) -> i64 {
    store
        .family(family)
        .expect("reads")
        .expect("family present")
        .priority_score
}

pub(super) fn stored(store: &InMemoryStore, booking: &BookingId) -> Booking {
    store
        .booking(booking)
        .expect("reads")
        .expect("booking present")
}

pub(super) fn all_bookings(store: &InMemoryStore) -> Vec<Booking> {
    store
        .bookings(&BookingFilter::live().with_cancelled())
        .expect("reads")
}

/// Store whose every call fails as if the backing database were offline.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl StayRepository for UnavailableStore {
    fn family(&self, _id: FamilyId) -> Result<Option<Family>, RepositoryError> {
        offline()
    }

    fn families(&self) -> Result<Vec<Family>, RepositoryError> {
        offline()
    }

    fn booking(&self, _id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        offline()
    }

    fn bookings(&self, _filter: &BookingFilter) -> Result<Vec<Booking>, RepositoryError> {
        offline()
    }

    fn notifications(
        &self,
        _family: FamilyId,
        _unread_only: bool,
    ) -> Result<Vec<Notification>, RepositoryError> {
        offline()
    }

    fn notification(&self, _id: &NotificationId) -> Result<Option<Notification>, RepositoryError> {
        offline()
    }

    fn inspections(&self, _booking: &BookingId) -> Result<Vec<InspectionReport>, RepositoryError> {
        offline()
    }

    fn commit(&self, _changeset: Changeset) -> Result<CommitReceipt, RepositoryError> {
        offline()
    }
}

/// In-memory store that lands a competing changeset just before the next
/// commit, simulating another writer racing between read and write.
#[derive(Default)]
pub(super) struct RacingStore {
    pub(super) inner: InMemoryStore,
    interloper: Mutex<Option<Changeset>>,
}

impl RacingStore {
    pub(super) fn race_next_commit_with(&self, changeset: Changeset) {
        *self.interloper.lock().expect("interloper mutex poisoned") = Some(changeset);
    }
}

impl StayRepository for RacingStore {
    fn family(&self, id: FamilyId) -> Result<Option<Family>, RepositoryError> {
        self.inner.family(id)
    }

    fn families(&self) -> Result<Vec<Family>, RepositoryError> {
        self.inner.families()
    }

    fn booking(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        self.inner.booking(id)
    }

    fn bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, RepositoryError> {
        self.inner.bookings(filter)
    }

    fn notifications(
        &self,
        family: FamilyId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, RepositoryError> {
        self.inner.notifications(family, unread_only)
    }

    fn notification(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError> {
        self.inner.notification(id)
    }

    fn inspections(&self, booking: &BookingId) -> Result<Vec<InspectionReport>, RepositoryError> {
        self.inner.inspections(booking)
    }

    fn commit(&self, changeset: Changeset) -> Result<CommitReceipt, RepositoryError> {
        let interloper = self
            .interloper
            .lock()
            .expect("interloper mutex poisoned")
            .take();
        if let Some(competing) = interloper {
            self.inner.commit(competing)?;
        }
        self.inner.commit(changeset)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
