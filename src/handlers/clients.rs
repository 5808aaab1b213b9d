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
use crate::models::Client;
use crate::state::AppState;

fn ensure_refs_exist(
    conn: &Connection,
    tier_id: Option<i64>,
    user_id: Option<i64>,
) -> Result<(), AppError> {
    if let Some(id) = tier_id {
        if queries::get_client_tier(conn, id)?.is_none() {
            return Err(AppError::NotFound(format!("client tier {id}")));
        }
    }
    if let Some(id) = user_id {
        if queries::get_user(conn, id)?.is_none() {
            return Err(AppError::NotFound(format!("user {id}")));
        }
    }
    Ok(())
}

// POST /api/clients
#[derive(Deserialize)]
pub struct CreateClientRequest {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub age: Option<i64>,
    pub dob: Option<NaiveDateTime>,
    pub tier_id: Option<i64>,
    pub user_id: Option<i64>,
}

pub async fn create_client(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateClientRequest>,
) -> Result<Response, AppError> {
    if body.id.is_some() {
        return Err(AppError::Conflict(
            "a new client cannot already have an id".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    ensure_refs_exist(&db, body.tier_id, body.user_id)?;

    if let Some(user_id) = body.user_id {
        if queries::get_client_by_user(&db, user_id)?.is_some() {
            return Err(AppError::Conflict(format!(
                "user {user_id} already has a client profile"
            )));
        }
    }

    let mut client = Client {
        id: 0,
        name: body.name,
        description: body.description,
        age: body.age,
        dob: body.dob,
        tier_id: body.tier_id,
        user_id: body.user_id,
    };
    client.id = queries::create_client(&db, &client)?;

    let location = format!("/api/clients/{}", client.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(client),
    )
        .into_response())
}

// GET /api/clients
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Client>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_clients(&db)?))
}

// GET /api/clients/:id
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Client>, AppError> {
    let db = state.db.lock().unwrap();
    match queries::get_client(&db, id)? {
        Some(client) => Ok(Json(client)),
        None => Err(AppError::NotFound(format!("client {id}"))),
    }
}

// PUT /api/clients/:id
#[derive(Deserialize)]
pub struct UpdateClientRequest {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub age: Option<i64>,
    pub dob: Option<NaiveDateTime>,
    pub tier_id: Option<i64>,
    pub user_id: Option<i64>,
}

pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateClientRequest>,
) -> Result<Json<Client>, AppError> {
    if body.id != Some(id) {
        return Err(AppError::Validation(
            "id in path and body do not match".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    if queries::get_client(&db, id)?.is_none() {
        return Err(AppError::NotFound(format!("client {id}")));
    }
    ensure_refs_exist(&db, body.tier_id, body.user_id)?;

    let client = Client {
        id,
        name: body.name,
        description: body.description,
        age: body.age,
        dob: body.dob,
        tier_id: body.tier_id,
        user_id: body.user_id,
    };
    queries::update_client(&db, &client)?;
    Ok(Json(client))
}

// PATCH /api/clients/:id
#[derive(Deserialize)]
pub struct PatchClientRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub age: Option<i64>,
    pub dob: Option<NaiveDateTime>,
    pub tier_id: Option<i64>,
    pub user_id: Option<i64>,
}

pub async fn patch_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<PatchClientRequest>,
) -> Result<Json<Client>, AppError> {
    let db = state.db.lock().unwrap();
    let Some(mut client) = queries::get_client(&db, id)? else {
        return Err(AppError::NotFound(format!("client {id}")));
    };

    ensure_refs_exist(&db, body.tier_id, body.user_id)?;

    if body.name.is_some() {
        client.name = body.name;
    }
    if body.description.is_some() {
        client.description = body.description;
    }
    if body.age.is_some() {
        client.age = body.age;
    }
    if body.dob.is_some() {
        client.dob = body.dob;
    }
    if body.tier_id.is_some() {
        client.tier_id = body.tier_id;
    }
    if body.user_id.is_some() {
        client.user_id = body.user_id;
    }

    queries::update_client(&db, &client)?;
    Ok(Json(client))
}

// DELETE /api/clients/:id
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let db = state.db.lock().unwrap();
    queries::delete_client(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}
