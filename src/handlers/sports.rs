use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Sport;
use crate::state::AppState;

// POST /api/sports
#[derive(Deserialize)]
pub struct CreateSportRequest {
    pub id: Option<i64>,
    pub name: String,
}

pub async fn create_sport(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSportRequest>,
) -> Result<Response, AppError> {
    if body.id.is_some() {
        return Err(AppError::Conflict(
            "a new sport cannot already have an id".to_string(),
        ));
    }
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }

    let db = state.db.lock().unwrap();
    let sport = queries::create_sport(&db, body.name.trim())?;

    let location = format!("/api/sports/{}", sport.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(sport),
    )
        .into_response())
}

// GET /api/sports
pub async fn list_sports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Sport>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_sports(&db)?))
}

// GET /api/sports/:id
pub async fn get_sport(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Sport>, AppError> {
    let db = state.db.lock().unwrap();
    match queries::get_sport(&db, id)? {
        Some(sport) => Ok(Json(sport)),
        None => Err(AppError::NotFound(format!("sport {id}"))),
    }
}

// PUT /api/sports/:id
#[derive(Deserialize)]
pub struct UpdateSportRequest {
    pub id: Option<i64>,
    pub name: String,
}

pub async fn update_sport(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSportRequest>,
) -> Result<Json<Sport>, AppError> {
    if body.id != Some(id) {
        return Err(AppError::Validation(
            "id in path and body do not match".to_string(),
        ));
    }
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }

    let sport = Sport {
        id,
        name: body.name.trim().to_string(),
    };

    let db = state.db.lock().unwrap();
    if !queries::update_sport(&db, &sport)? {
        return Err(AppError::NotFound(format!("sport {id}")));
    }
    Ok(Json(sport))
}

// PATCH /api/sports/:id
#[derive(Deserialize)]
pub struct PatchSportRequest {
    pub name: Option<String>,
}

pub async fn patch_sport(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<PatchSportRequest>,
) -> Result<Json<Sport>, AppError> {
    let db = state.db.lock().unwrap();
    let Some(mut sport) = queries::get_sport(&db, id)? else {
        return Err(AppError::NotFound(format!("sport {id}")));
    };

    if let Some(name) = body.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        sport.name = name.trim().to_string();
    }

    queries::update_sport(&db, &sport)?;
    Ok(Json(sport))
}

// DELETE /api/sports/:id
pub async fn delete_sport(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let db = state.db.lock().unwrap();
    queries::delete_sport(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}
