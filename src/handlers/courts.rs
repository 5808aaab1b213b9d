use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Court;
use crate::state::AppState;

fn ensure_sport_exists(conn: &Connection, sport_id: Option<i64>) -> Result<(), AppError> {
    if let Some(id) = sport_id {
        if queries::get_sport(conn, id)?.is_none() {
            return Err(AppError::NotFound(format!("sport {id}")));
        }
    }
    Ok(())
}

// POST /api/courts
#[derive(Deserialize)]
pub struct CreateCourtRequest {
    pub id: Option<i64>,
    pub name: String,
    pub sport_id: Option<i64>,
}

pub async fn create_court(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateCourtRequest>,
) -> Result<Response, AppError> {
    if body.id.is_some() {
        return Err(AppError::Conflict(
            "a new court cannot already have an id".to_string(),
        ));
    }
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }

    let db = state.db.lock().unwrap();
    ensure_sport_exists(&db, body.sport_id)?;
    let court = queries::create_court(&db, body.name.trim(), body.sport_id)?;

    let location = format!("/api/courts/{}", court.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(court),
    )
        .into_response())
}

// GET /api/courts
pub async fn list_courts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Court>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_courts(&db)?))
}

// GET /api/courts/:id
pub async fn get_court(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Court>, AppError> {
    let db = state.db.lock().unwrap();
    match queries::get_court(&db, id)? {
        Some(court) => Ok(Json(court)),
        None => Err(AppError::NotFound(format!("court {id}"))),
    }
}

// PUT /api/courts/:id
#[derive(Deserialize)]
pub struct UpdateCourtRequest {
    pub id: Option<i64>,
    pub name: String,
    pub sport_id: Option<i64>,
}

pub async fn update_court(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCourtRequest>,
) -> Result<Json<Court>, AppError> {
    if body.id != Some(id) {
        return Err(AppError::Validation(
            "id in path and body do not match".to_string(),
        ));
    }
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }

    let db = state.db.lock().unwrap();
    ensure_sport_exists(&db, body.sport_id)?;

    let court = Court {
        id,
        name: body.name.trim().to_string(),
        sport_id: body.sport_id,
    };
    if !queries::update_court(&db, &court)? {
        return Err(AppError::NotFound(format!("court {id}")));
    }
    Ok(Json(court))
}

// PATCH /api/courts/:id
#[derive(Deserialize)]
pub struct PatchCourtRequest {
    pub name: Option<String>,
    pub sport_id: Option<i64>,
}

pub async fn patch_court(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<PatchCourtRequest>,
) -> Result<Json<Court>, AppError> {
    let db = state.db.lock().unwrap();
    let Some(mut court) = queries::get_court(&db, id)? else {
        return Err(AppError::NotFound(format!("court {id}")));
    };

    if let Some(name) = body.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        court.name = name.trim().to_string();
    }
    if body.sport_id.is_some() {
        ensure_sport_exists(&db, body.sport_id)?;
        court.sport_id = body.sport_id;
    }

    queries::update_court(&db, &court)?;
    Ok(Json(court))
}

// DELETE /api/courts/:id
pub async fn delete_court(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let db = state.db.lock().unwrap();
    queries::delete_court(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}
