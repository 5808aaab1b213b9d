use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};
use crate::services::booking::{
    self, BookingPatch, BookingUpdate, NewBooking, SlotRequest,
};
use crate::services::revenue;
use crate::state::AppState;

fn current_login(headers: &HeaderMap) -> Result<String, AppError> {
    let login = headers
        .get("x-user-login")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim();

    if login.is_empty() {
        return Err(AppError::Validation(
            "current user login not found".to_string(),
        ));
    }
    Ok(login.to_string())
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub id: Option<i64>,
    pub user_id: i64,
    pub time_slot: TimeSlotRequest,
    pub payment_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct TimeSlotRequest {
    pub court_id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Response, AppError> {
    if body.id.is_some() {
        return Err(AppError::Conflict(
            "a new booking cannot already have an id".to_string(),
        ));
    }

    let booking = booking::create_booking(
        &state,
        NewBooking {
            user_id: body.user_id,
            slot: SlotRequest {
                court_id: body.time_slot.court_id,
                start_time: body.time_slot.start_time,
                end_time: body.time_slot.end_time,
            },
            payment_id: body.payment_id,
        },
    )?;

    let location = format!("/api/bookings/{}", booking.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(booking),
    )
        .into_response())
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_bookings(&db)?))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let db = state.db.lock().unwrap();
    match queries::get_booking(&db, id)? {
        Some(booking) => Ok(Json(booking)),
        None => Err(AppError::NotFound(format!("booking {id}"))),
    }
}

// PUT /api/bookings/:id
#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub id: Option<i64>,
    pub status: BookingStatus,
    pub user_id: Option<i64>,
    pub time_slot_id: Option<i64>,
    pub payment_id: Option<i64>,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    match body.id {
        None => {
            return Err(AppError::Validation(
                "missing id in request body".to_string(),
            ))
        }
        Some(body_id) if body_id != id => {
            return Err(AppError::Validation(
                "id in path and body do not match".to_string(),
            ))
        }
        Some(_) => {}
    }

    let booking = booking::replace_booking(
        &state,
        id,
        BookingUpdate {
            status: body.status,
            user_id: body.user_id,
            time_slot_id: body.time_slot_id,
            payment_id: body.payment_id,
        },
    )
    .await?;
    Ok(Json(booking))
}

// PATCH /api/bookings/:id
#[derive(Deserialize)]
pub struct PatchBookingRequest {
    pub status: Option<BookingStatus>,
    pub user_id: Option<i64>,
    pub time_slot_id: Option<i64>,
    pub payment_id: Option<i64>,
}

pub async fn patch_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<PatchBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = booking::patch_booking(
        &state,
        id,
        BookingPatch {
            status: body.status,
            user_id: body.user_id,
            time_slot_id: body.time_slot_id,
            payment_id: body.payment_id,
        },
    )?;
    Ok(Json(booking))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    booking::delete_booking(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/bookings/:id/approve
pub async fn approve_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let booking = booking::approve_booking(&state, id).await?;
    Ok(Json(booking))
}

// PUT /api/bookings/:id/reject
pub async fn reject_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let booking = booking::reject_booking(&state, id).await?;
    Ok(Json(booking))
}

// GET /api/bookings/my-bookings
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, AppError> {
    let login = current_login(&headers)?;

    let db = state.db.lock().unwrap();
    let Some(user) = queries::get_user_by_login(&db, &login)? else {
        return Err(AppError::NotFound(format!("user {login}")));
    };
    Ok(Json(queries::bookings_for_user(&db, user.id)?))
}

// GET /api/bookings/by-court/:court_id?date=
#[derive(Deserialize)]
pub struct ByCourtQuery {
    pub date: NaiveDate,
}

pub async fn bookings_by_court(
    State(state): State<Arc<AppState>>,
    Path(court_id): Path<i64>,
    Query(query): Query<ByCourtQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let db = state.db.lock().unwrap();
    if queries::get_court(&db, court_id)?.is_none() {
        return Err(AppError::NotFound(format!("court {court_id}")));
    }

    let start = query.date.and_time(NaiveTime::MIN);
    let end = (query.date + chrono::Duration::days(1)).and_time(NaiveTime::MIN);
    Ok(Json(queries::bookings_for_court_between(
        &db, court_id, &start, &end,
    )?))
}

// GET /api/bookings/total-approved-revenue-for-date?date=
#[derive(Deserialize)]
pub struct RevenueDateQuery {
    pub date: Option<NaiveDate>,
}

pub async fn revenue_for_date(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RevenueDateQuery>,
) -> Result<Json<Decimal>, AppError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let db = state.db.lock().unwrap();
    Ok(Json(revenue::total_for_date(&db, date)?))
}
