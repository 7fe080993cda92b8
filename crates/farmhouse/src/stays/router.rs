use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::{BookingId, FamilyId, NotificationId};
use super::error::StayError;
use super::inspection::ConditionReport;
use super::repository::{RepositoryError, StayRepository};
use super::resolver::BookingRequest;
use super::service::{QuoteRequest, StayService};

/// Router builder exposing the stay engine as JSON endpoints.
pub fn stay_router<S>(service: Arc<StayService<S>>) -> Router
where
    S: StayRepository + 'static,
{
    Router::new()
        .route("/api/v1/stays/quote", post(quote_handler::<S>))
        .route("/api/v1/stays/bookings", post(request_handler::<S>))
        .route(
            "/api/v1/stays/bookings/:booking_id/cancel",
            post(cancel_handler::<S>),
        )
        .route(
            "/api/v1/stays/families/:family_id/bookings",
            get(family_bookings_handler::<S>),
        )
        .route(
            "/api/v1/stays/families/:family_id/notifications",
            get(notifications_handler::<S>),
        )
        .route(
            "/api/v1/stays/notifications/:notification_id/dismiss",
            post(dismiss_handler::<S>),
        )
        .route("/api/v1/stays/inspections", post(inspection_handler::<S>))
        .route("/api/v1/stays/leaderboard", get(leaderboard_handler::<S>))
        .route("/api/v1/stays/trips", get(trips_handler::<S>))
        .route("/api/v1/stays/calendar/:date", get(calendar_handler::<S>))
        .route(
            "/api/v1/stays/admin/scores/reset",
            post(reset_handler::<S>),
        )
        .route(
            "/api/v1/stays/admin/families/:family_id/adjust",
            post(adjust_handler::<S>),
        )
        .with_state(service)
}

/// Maps a stay error onto a status code and a `{"error", "code"}` body.
pub(crate) fn error_response(error: &StayError) -> Response {
    let status = match error {
        StayError::InvalidRange(_)
        | StayError::MissingEvidence
        | StayError::Persistence(RepositoryError::ScoreOverflow(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        StayError::QuotaExceeded { .. }
        | StayError::DatesLocked { .. }
        | StayError::PriorityTooLow { .. }
        | StayError::AlreadyCancelled(_)
        | StayError::StayEnded(_)
        | StayError::AlreadyInspected(_) => StatusCode::CONFLICT,
        StayError::NotFound { .. } => StatusCode::NOT_FOUND,
        StayError::Persistence(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
        StayError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
        "code": error.code(),
    });
    (status, axum::Json(payload)).into_response()
}

fn ok<T: serde::Serialize>(status: StatusCode, body: T) -> Response {
    (status, axum::Json(body)).into_response()
}

pub(crate) async fn quote_handler<S>(
    State(service): State<Arc<StayService<S>>>,
    axum::Json(request): axum::Json<QuoteRequest>,
) -> Response
where
    S: StayRepository + 'static,
{
    let now = service.now();
    match service.quote(request) {
        Ok(quote) => {
            let cancellation = service.late_cancellation_preview(request.start_date, now);
            let payload = json!({
                "quote": quote,
                "overdrawn": quote.overdrawn(),
                "cancellation_after_grace": {
                    "penalty": cancellation.penalty,
                    "label": cancellation.label(),
                },
            });
            ok(StatusCode::OK, payload)
        }
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn request_handler<S>(
    State(service): State<Arc<StayService<S>>>,
    axum::Json(request): axum::Json<BookingRequest>,
) -> Response
where
    S: StayRepository + 'static,
{
    let now = service.now();
    match service.request_booking(request, now) {
        Ok(admission) => {
            let payload = json!({
                "message": admission.message(),
                "admission": admission,
            });
            ok(StatusCode::CREATED, payload)
        }
        Err(error) => error_response(&error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CancelBody {
    pub family_id: FamilyId,
}

pub(crate) async fn cancel_handler<S>(
    State(service): State<Arc<StayService<S>>>,
    Path(booking_id): Path<String>,
    axum::Json(body): axum::Json<CancelBody>,
) -> Response
where
    S: StayRepository + 'static,
{
    let now = service.now();
    match service.cancel_booking(body.family_id, &BookingId(booking_id), now) {
        Ok(outcome) => ok(StatusCode::OK, outcome),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn family_bookings_handler<S>(
    State(service): State<Arc<StayService<S>>>,
    Path(family_id): Path<u32>,
) -> Response
where
    S: StayRepository + 'static,
{
    let now = service.now();
    match service.family_bookings(FamilyId(family_id), now) {
        Ok(listing) => ok(StatusCode::OK, listing),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn notifications_handler<S>(
    State(service): State<Arc<StayService<S>>>,
    Path(family_id): Path<u32>,
) -> Response
where
    S: StayRepository + 'static,
{
    match service.unread_notifications(FamilyId(family_id)) {
        Ok(notices) => ok(StatusCode::OK, notices),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn dismiss_handler<S>(
    State(service): State<Arc<StayService<S>>>,
    Path(notification_id): Path<String>,
) -> Response
where
    S: StayRepository + 'static,
{
    match service.dismiss_notification(&NotificationId(notification_id)) {
        Ok(notice) => ok(StatusCode::OK, notice),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn inspection_handler<S>(
    State(service): State<Arc<StayService<S>>>,
    axum::Json(report): axum::Json<ConditionReport>,
) -> Response
where
    S: StayRepository + 'static,
{
    let now = service.now();
    match service.file_inspection(report, now) {
        Ok(outcome) => ok(StatusCode::CREATED, outcome),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn leaderboard_handler<S>(State(service): State<Arc<StayService<S>>>) -> Response
where
    S: StayRepository + 'static,
{
    match service.leaderboard() {
        Ok(standings) => ok(StatusCode::OK, standings),
        Err(error) => error_response(&error),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TripsQuery {
    pub family_id: Option<u32>,
}

pub(crate) async fn trips_handler<S>(
    State(service): State<Arc<StayService<S>>>,
    Query(query): Query<TripsQuery>,
) -> Response
where
    S: StayRepository + 'static,
{
    let today = service.now().date_naive();
    match service.trip_board(query.family_id.map(FamilyId), today) {
        Ok(cards) => ok(StatusCode::OK, cards),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn calendar_handler<S>(
    State(service): State<Arc<StayService<S>>>,
    Path(date): Path<String>,
) -> Response
where
    S: StayRepository + 'static,
{
    let date = match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            let payload = json!({
                "error": format!("'{date}' is not a YYYY-MM-DD date"),
                "code": "invalid_date",
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };
    match service.occupancy(date) {
        Ok(occupancy) => ok(StatusCode::OK, occupancy),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn reset_handler<S>(State(service): State<Arc<StayService<S>>>) -> Response
where
    S: StayRepository + 'static,
{
    match service.reset_scores() {
        Ok(families) => {
            let payload = json!({
                "message": "Success! New Year, New Scores.",
                "score": service.economy().season_score,
                "families": families,
            });
            ok(StatusCode::OK, payload)
        }
        Err(error) => error_response(&error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdjustBody {
    pub delta: i64,
}

pub(crate) async fn adjust_handler<S>(
    State(service): State<Arc<StayService<S>>>,
    Path(family_id): Path<u32>,
    axum::Json(body): axum::Json<AdjustBody>,
) -> Response
where
    S: StayRepository + 'static,
{
    match service.adjust_score(FamilyId(family_id), body.delta) {
        Ok(family) => ok(StatusCode::OK, family),
        Err(error) => error_response(&error),
    }
}
