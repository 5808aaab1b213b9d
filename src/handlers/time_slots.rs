use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::TimeSlot;
use crate::state::AppState;

fn ensure_court_exists(conn: &Connection, court_id: Option<i64>) -> Result<(), AppError> {
    if let Some(id) = court_id {
        if queries::get_court(conn, id)?.is_none() {
            return Err(AppError::NotFound(format!("court {id}")));
        }
    }
    Ok(())
}

fn ensure_ordered(start: &NaiveDateTime, end: &NaiveDateTime) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::Validation(
            "start_time must be before end_time".to_string(),
        ));
    }
    Ok(())
}

// POST /api/time-slots
#[derive(Deserialize)]
pub struct CreateTimeSlotRequest {
    pub id: Option<i64>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub court_id: Option<i64>,
}

pub async fn create_time_slot(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTimeSlotRequest>,
) -> Result<Response, AppError> {
    if body.id.is_some() {
        return Err(AppError::Conflict(
            "a new time slot cannot already have an id".to_string(),
        ));
    }
    ensure_ordered(&body.start_time, &body.end_time)?;

    let db = state.db.lock().unwrap();
    ensure_court_exists(&db, body.court_id)?;
    let slot = queries::create_time_slot(&db, &body.start_time, &body.end_time, body.court_id)?;

    let location = format!("/api/time-slots/{}", slot.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(slot),
    )
        .into_response())
}

// GET /api/time-slots
pub async fn list_time_slots(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_time_slots(&db)?))
}

// GET /api/time-slots/:id
pub async fn get_time_slot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TimeSlot>, AppError> {
    let db = state.db.lock().unwrap();
    match queries::get_time_slot(&db, id)? {
        Some(slot) => Ok(Json(slot)),
        None => Err(AppError::NotFound(format!("time slot {id}"))),
    }
}

// PUT /api/time-slots/:id
#[derive(Deserialize)]
pub struct UpdateTimeSlotRequest {
    pub id: Option<i64>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub court_id: Option<i64>,
}

pub async fn update_time_slot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTimeSlotRequest>,
) -> Result<Json<TimeSlot>, AppError> {
    if body.id != Some(id) {
        return Err(AppError::Validation(
            "id in path and body do not match".to_string(),
        ));
    }
    ensure_ordered(&body.start_time, &body.end_time)?;

    let db = state.db.lock().unwrap();
    ensure_court_exists(&db, body.court_id)?;

    let slot = TimeSlot {
        id,
        start_time: body.start_time,
        end_time: body.end_time,
        court_id: body.court_id,
    };
    if !queries::update_time_slot(&db, &slot)? {
        return Err(AppError::NotFound(format!("time slot {id}")));
    }
    Ok(Json(slot))
}

// PATCH /api/time-slots/:id
#[derive(Deserialize)]
pub struct PatchTimeSlotRequest {
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub court_id: Option<i64>,
}

pub async fn patch_time_slot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<PatchTimeSlotRequest>,
) -> Result<Json<TimeSlot>, AppError> {
    let db = state.db.lock().unwrap();
    let Some(mut slot) = queries::get_time_slot(&db, id)? else {
        return Err(AppError::NotFound(format!("time slot {id}")));
    };

    if let Some(start) = body.start_time {
        slot.start_time = start;
    }
    if let Some(end) = body.end_time {
        slot.end_time = end;
    }
    ensure_ordered(&slot.start_time, &slot.end_time)?;

    if body.court_id.is_some() {
        ensure_court_exists(&db, body.court_id)?;
        slot.court_id = body.court_id;
    }

    queries::update_time_slot(&db, &slot)?;
    Ok(Json(slot))
}

// DELETE /api/time-slots/:id
pub async fn delete_time_slot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let db = state.db.lock().unwrap();
    queries::delete_time_slot(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}
