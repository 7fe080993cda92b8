use crate::infra::parse_date;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Args, ValueEnum};
use farmhouse::config::{AppConfig, EconomyConfig};
use farmhouse::error::AppError;
use farmhouse::stays::{
    AdmissionOutcome, BookingRequest, BookingType, CancellationPolicy, Clock,
    ConditionReport, Family, FixedClock, InMemoryStore, StayError, StayQuote, StayRange,
    StayService, UserId,
};
use std::sync::Arc;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum StayKind {
    /// Household members only
    #[default]
    Family,
    /// Guests of the household
    Friends,
}

impl From<StayKind> for BookingType {
    fn from(kind: StayKind) -> Self {
        match kind {
            StayKind::Family => BookingType::Family,
            StayKind::Friends => BookingType::Friends,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Check-in date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: NaiveDate,
    /// Check-out date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) end: NaiveDate,
    /// Who is travelling
    #[arg(long, value_enum, default_value_t = StayKind::Family)]
    pub(crate) kind: StayKind,
    /// Priority score to quote against (defaults to the season score)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) score: Option<i64>,
    /// Date the cancellation preview is computed for (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the scripted season starts on (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let economy = &config.economy;
    let range = StayRange::new(args.start, args.end).map_err(StayError::from)?;
    let score = args.score.unwrap_or(economy.season_score);
    let quote = StayQuote::new(&range, args.kind.into(), &economy.rates, score);

    println!("Stay quote for {range}");
    println!(
        "- {} nights x {} pts ({}) = {} pts",
        quote.cost.nights,
        quote.cost.rate,
        quote.booking_type.label(),
        quote.cost.total
    );
    println!(
        "- Score {} -> {} if confirmed{}",
        quote.current_score,
        quote.remaining_score,
        if quote.overdrawn() { " (overdrawn)" } else { "" }
    );

    let now = noon(args.today.unwrap_or_else(|| Utc::now().date_naive()));
    let policy = CancellationPolicy::from_config(economy);
    let booked_long_ago = now - policy.grace_period() - Duration::seconds(1);
    let charge = policy.assess(booked_long_ago, range.start(), now);
    println!(
        "- Cancelling on {} after the {} min grace period: -{} pts ({})",
        now.date_naive(),
        policy.grace_period().num_minutes(),
        charge.penalty,
        charge.label()
    );
    Ok(())
}

fn noon(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(12, 0, 0)
        .map(|instant| instant.and_utc())
        .unwrap_or_else(Utc::now)
}

fn request(family: &Family, start: NaiveDate, nights: i64, kind: BookingType) -> BookingRequest {
    BookingRequest {
        family_id: family.id,
        user_id: UserId(format!("usr-{}", family.name.to_lowercase())),
        start_date: start,
        end_date: start + Duration::days(nights),
        booking_type: kind,
    }
}

fn show_scores(service: &StayService<InMemoryStore>) -> Result<(), AppError> {
    for standing in service.leaderboard()? {
        println!(
            "    #{} {:<10} {:>4} pts",
            standing.rank, standing.name, standing.priority_score
        );
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let clock = Arc::new(FixedClock::new(noon(today)));
    let store = Arc::new(InMemoryStore::new());
    let service = StayService::with_clock(store.clone(), EconomyConfig::default(), clock.clone());

    let register = |name: &str, score: i64| {
        store
            .register_family(name, score)
            .map_err(StayError::from)
    };
    let okafor = register("Okafor", 100)?;
    let lindqvist = register("Lindqvist", 90)?;
    let baptiste = register("Baptiste", 150)?;
    let moreau = register("Moreau", 120)?;
    let tanaka = register("Tanaka", 80)?;

    println!("Farmhouse booking demo starting {today}");
    show_scores(&service)?;

    let weekend = today + Duration::days(30);
    println!("\n1. Okafor requests {weekend} for 2 nights");
    let first = service.request_booking(
        request(&okafor, weekend, 2, BookingType::Family),
        clock.now(),
    )?;
    println!("   {}", first.message());

    println!("\n2. Lindqvist tries to overlap with a lower score");
    match service.request_booking(
        request(&lindqvist, weekend + Duration::days(1), 2, BookingType::Family),
        clock.now(),
    ) {
        Ok(admission) => println!("   unexpected admission: {}", admission.message()),
        Err(err) => println!("   rejected: {err}"),
    }

    println!("\n3. Baptiste challenges the same dates");
    clock.advance(Duration::hours(2));
    let battle = service.request_booking(
        request(&baptiste, weekend + Duration::days(1), 2, BookingType::Family),
        clock.now(),
    )?;
    println!("   {}", battle.message());
    if let AdmissionOutcome::BattleWon { defeated, .. } = &battle.outcome {
        for loser in defeated {
            println!("   {} lost booking {}", loser.family_name, loser.booking_id);
        }
    }
    for notice in service.unread_notifications(okafor.id)? {
        println!("   Okafor inbox: {}", notice.message);
    }

    println!("\n4. Tanaka books the week before; Moreau the week after");
    let tanaka_stay = service.request_booking(
        request(&tanaka, weekend - Duration::days(7), 3, BookingType::Friends),
        clock.now(),
    )?;
    let moreau_stay = service.request_booking(
        request(&moreau, weekend + Duration::days(7), 2, BookingType::Family),
        clock.now(),
    )?;
    println!("   {}", tanaka_stay.message());
    println!("   {}", moreau_stay.message());

    println!("\n5. Two days pass; reading the bookings matures them");
    clock.advance(Duration::hours(48));
    for family in [&tanaka, &moreau] {
        let listing = service.family_bookings(family.id, clock.now())?;
        for view in &listing.bookings {
            println!(
                "   {} {} {} ({} pts) -> score {}",
                family.name,
                view.booking.range,
                view.booking.status.label(),
                view.cost.total,
                listing.family.priority_score
            );
        }
    }

    println!("\n6. Baptiste arrives and finds the house dirty");
    clock.set(noon(battle.booking.start_date()));
    let report = service.file_inspection(
        ConditionReport {
            booking_id: battle.booking.id.clone(),
            inspector_id: UserId("usr-baptiste".to_string()),
            is_clean: false,
            evidence_photo_url: Some("https://photos.example/kitchen.jpg".to_string()),
            comments: "Dishes left in the sink".to_string(),
        },
        clock.now(),
    )?;
    println!("   {}", report.message);

    println!("\n7. Moreau cancels the day before check-in");
    clock.set(noon(moreau_stay.booking.start_date() - Duration::days(1)));
    let cancelled = service.cancel_booking(moreau.id, &moreau_stay.booking.id, clock.now())?;
    println!("   {} -> score {}", cancelled.message, cancelled.score_after);

    println!("\nFinal standings");
    show_scores(&service)?;
    Ok(())
}
