use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use farmhouse::config::EconomyConfig;
use farmhouse::stays::{
    AdmissionOutcome, BookingRequest, BookingStatus, BookingType, Clock, ConditionReport,
    FixedClock, InMemoryStore, StayError, StayRepository, StayService, UserId,
};

fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2031, month, day).expect("valid date")
}

fn instant(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2031, month, day, hour, 0, 0)
        .single()
        .expect("valid instant")
}

fn booking(family: u32, user: &str, start: NaiveDate, end: NaiveDate) -> BookingRequest {
    BookingRequest {
        family_id: farmhouse::stays::FamilyId(family),
        user_id: UserId(user.to_string()),
        start_date: start,
        end_date: end,
        booking_type: BookingType::Family,
    }
}

#[test]
fn a_season_at_the_farmhouse() {
    let store = Arc::new(InMemoryStore::new());
    let okafor = store.register_family("Okafor", 100).expect("registers");
    let lindqvist = store.register_family("Lindqvist", 90).expect("registers");
    let baptiste = store.register_family("Baptiste", 150).expect("registers");

    let clock = Arc::new(FixedClock::new(instant(1, 5, 9)));
    let service = StayService::with_clock(store.clone(), EconomyConfig::default(), clock.clone());

    // Okafor claims the first weekend of February unopposed.
    let okafor_claim = service
        .request_booking(booking(okafor.id.0, "usr-ada", day(2, 1), day(2, 3)), clock.now())
        .expect("admitted");
    assert_eq!(okafor_claim.outcome, AdmissionOutcome::Pending);

    // Lindqvist cannot out-bid a higher score.
    let lindqvist_try = service.request_booking(
        booking(lindqvist.id.0, "usr-linn", day(2, 2), day(2, 4)),
        clock.now(),
    );
    assert!(matches!(lindqvist_try, Err(StayError::PriorityTooLow { .. })));

    // Baptiste can, and is charged on the spot.
    clock.advance(Duration::hours(3));
    let baptiste_claim = service
        .request_booking(booking(baptiste.id.0, "usr-bea", day(2, 2), day(2, 4)), clock.now())
        .expect("battle won");
    assert_eq!(baptiste_claim.booking.status, BookingStatus::Confirmed);
    assert_eq!(baptiste_claim.score_after, 140);

    let okafor_view = service
        .family_bookings(okafor.id, clock.now())
        .expect("lists");
    assert!(okafor_view.bookings.is_empty());
    let inbox = service.unread_notifications(okafor.id).expect("reads");
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].message.contains("Baptiste"));
    assert!(inbox[0].message.contains("(150 vs 100)"));

    // Lindqvist books later in the month; the window passes quietly.
    let lindqvist_claim = service
        .request_booking(booking(lindqvist.id.0, "usr-linn", day(2, 10), day(2, 13)), clock.now())
        .expect("admitted");
    clock.advance(Duration::hours(48));
    let lindqvist_view = service
        .family_bookings(lindqvist.id, clock.now())
        .expect("lists");
    assert_eq!(lindqvist_view.bookings[0].booking.id, lindqvist_claim.booking.id);
    assert_eq!(lindqvist_view.bookings[0].booking.status, BookingStatus::Confirmed);
    assert_eq!(lindqvist_view.family.priority_score, 75);
    assert!(service
        .unread_notifications(lindqvist.id)
        .expect("reads")
        .is_empty());

    // Lindqvist arrives to a mess left by Baptiste.
    clock.set(instant(2, 10, 15));
    let outcome = service
        .file_inspection(
            ConditionReport {
                booking_id: lindqvist_claim.booking.id.clone(),
                inspector_id: UserId("usr-linn".to_string()),
                is_clean: false,
                evidence_photo_url: Some("https://photos.example/porch.jpg".to_string()),
                comments: "Muddy boots everywhere".to_string(),
            },
            clock.now(),
        )
        .expect("report filed");
    assert_eq!(
        outcome.message,
        "REPORT FILED! The Baptiste family was fined 5 points."
    );
    assert_eq!(
        store
            .family(baptiste.id)
            .expect("reads")
            .expect("present")
            .priority_score,
        135
    );

    let standings = service.leaderboard().expect("ranks");
    let names: Vec<&str> = standings.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, vec!["Baptiste", "Okafor", "Lindqvist"]);

    service.reset_scores().expect("new season");
    assert!(service
        .leaderboard()
        .expect("ranks")
        .iter()
        .all(|row| row.priority_score == 250));
}

#[test]
fn confirmed_stays_never_overlap() {
    let store = Arc::new(InMemoryStore::new());
    let scores = [100, 140, 90, 180, 60, 120];
    let families: Vec<_> = scores
        .iter()
        .enumerate()
        .map(|(index, score)| {
            store
                .register_family(format!("Household {index}"), *score)
                .expect("registers")
        })
        .collect();
    let clock = Arc::new(FixedClock::new(instant(1, 1, 8)));
    let service = StayService::with_clock(store.clone(), EconomyConfig::default(), clock.clone());

    let ranges = [(3, 6), (5, 8), (1, 4), (7, 9), (2, 5), (4, 10)];
    for (family, (start, end)) in families.iter().zip(ranges) {
        let _ = service.request_booking(
            booking(family.id.0, "usr", day(3, start), day(3, end)),
            clock.now(),
        );
        clock.advance(Duration::hours(20));
        for family in &families {
            service
                .family_bookings(family.id, clock.now())
                .expect("lists");
        }
    }

    let confirmed: Vec<_> = store
        .bookings(&farmhouse::stays::BookingFilter::live())
        .expect("reads")
        .into_iter()
        .filter(|booking| booking.status == BookingStatus::Confirmed)
        .collect();
    assert!(!confirmed.is_empty());
    for (index, first) in confirmed.iter().enumerate() {
        for second in &confirmed[index + 1..] {
            assert!(
                !first.range.overlaps(&second.range),
                "{} and {} overlap",
                first.range,
                second.range
            );
        }
    }
}
