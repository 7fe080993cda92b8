use super::common::*;
use chrono::Duration;
use std::sync::Arc;

use crate::config::{EconomyConfig, RateCard};
use crate::stays::domain::{BookingStatus, BookingType};
use crate::stays::lifecycle::PendingWindow;
use crate::stays::repository::{BookingFilter, Changeset, StayRepository};
use crate::stays::resolver::ConflictResolver;

fn window() -> PendingWindow {
    PendingWindow::from_config(&EconomyConfig::default())
}

fn admit<S: StayRepository + ?Sized>(
    store: &S,
    family: &crate::stays::Family,
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
    now: chrono::DateTime<chrono::Utc>,
) -> crate::stays::Booking {
    ConflictResolver::new(RateCard::default(), 2)
        .resolve(store, request(family, start, end, BookingType::Family), now)
        .expect("admitted")
        .booking
}

#[test]
fn matures_after_the_full_window_when_the_stay_is_far_off() {
    let (store, families) = store_with(&[("Okafor", 100)]);
    let created = december_morning();
    let booking = admit(store.as_ref(), &families[0], date(2031, 1, 10), date(2031, 1, 12), created);

    assert_eq!(window().matures_at(&booking), created + Duration::hours(48));
    assert!(!window().is_due(&booking, created + Duration::hours(48) - Duration::minutes(1)));
    assert!(window().is_due(&booking, created + Duration::hours(48)));
}

#[test]
fn matures_at_check_in_when_that_comes_first() {
    let (store, families) = store_with(&[("Okafor", 100)]);
    let created = at(2030, 12, 31, 9, 0);
    let booking = admit(store.as_ref(), &families[0], date(2031, 1, 1), date(2031, 1, 3), created);

    assert_eq!(window().matures_at(&booking), at(2031, 1, 1, 0, 0));
    assert!(!window().is_due(&booking, at(2030, 12, 31, 23, 59)));
    assert!(window().is_due(&booking, at(2031, 1, 1, 0, 0)));
}

#[test]
fn maturation_charges_the_score_held_at_that_moment() {
    let (store, families) = store_with(&[("Okafor", 100)]);
    let okafor = &families[0];
    let created = december_morning();
    let booking = admit(store.as_ref(), okafor, date(2031, 1, 10), date(2031, 1, 13), created);

    let mut fine = Changeset::new();
    fine.adjust_score(okafor.id, -20);
    store.commit(fine).expect("fine lands");

    let listed = store
        .bookings(&BookingFilter::live().for_family(okafor.id))
        .expect("reads");
    let settled = window()
        .mature(store.as_ref(), listed, created + Duration::hours(49))
        .expect("matures");

    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].status, BookingStatus::Confirmed);
    assert_eq!(stored(&store, &booking.id).status, BookingStatus::Confirmed);
    assert_eq!(score(&store, okafor.id), 100 - 20 - 15);
}

#[test]
fn bookings_inside_the_window_stay_pending() {
    let (store, families) = store_with(&[("Okafor", 100)]);
    let created = december_morning();
    admit(store.as_ref(), &families[0], date(2031, 1, 10), date(2031, 1, 12), created);

    let listed = store.bookings(&BookingFilter::live()).expect("reads");
    let settled = window()
        .mature(store.as_ref(), listed, created + Duration::hours(12))
        .expect("nothing due");

    assert_eq!(settled[0].status, BookingStatus::Pending);
    assert_eq!(score(&store, families[0].id), 100);
}

#[test]
fn repeated_reads_charge_once() {
    let (store, families) = store_with(&[("Okafor", 100)]);
    let created = december_morning();
    admit(store.as_ref(), &families[0], date(2031, 1, 10), date(2031, 1, 12), created);
    let later = created + Duration::hours(50);

    for _ in 0..3 {
        let listed = store.bookings(&BookingFilter::live()).expect("reads");
        window()
            .mature(store.as_ref(), listed, later)
            .expect("matures");
    }

    assert_eq!(score(&store, families[0].id), 90);
}

#[test]
fn concurrent_reader_maturing_first_is_not_charged_twice() {
    let store = Arc::new(RacingStore::default());
    let okafor = store.inner.register_family("Okafor", 100).expect("registers");
    let created = december_morning();
    let booking = admit(store.as_ref(), &okafor, date(2031, 1, 10), date(2031, 1, 12), created);

    let mut other_reader = Changeset::new();
    other_reader
        .expect_status(&booking.id, BookingStatus::Pending)
        .set_status(&booking.id, BookingStatus::Confirmed)
        .adjust_score(okafor.id, -10);
    store.race_next_commit_with(other_reader);

    let settled = window()
        .mature(store.as_ref(), vec![booking.clone()], created + Duration::hours(48))
        .expect("conflict resolved by re-reading");

    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].status, BookingStatus::Confirmed);
    assert_eq!(score(&store.inner, okafor.id), 90);
}

#[test]
fn booking_cancelled_underneath_is_dropped_from_the_listing() {
    let store = Arc::new(RacingStore::default());
    let okafor = store.inner.register_family("Okafor", 100).expect("registers");
    let created = december_morning();
    let booking = admit(store.as_ref(), &okafor, date(2031, 1, 10), date(2031, 1, 12), created);

    let mut challenger = Changeset::new();
    challenger.set_status(&booking.id, BookingStatus::Cancelled);
    store.race_next_commit_with(challenger);

    let settled = window()
        .mature(store.as_ref(), vec![booking], created + Duration::hours(48))
        .expect("conflict resolved by re-reading");

    assert!(settled.is_empty());
    assert_eq!(score(&store.inner, okafor.id), 100);
}
