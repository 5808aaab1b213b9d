use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::ClientTier;
use crate::state::AppState;

// POST /api/client-tiers
#[derive(Deserialize)]
pub struct CreateClientTierRequest {
    pub id: Option<i64>,
    pub tier_name: String,
    pub discount_percentage: Option<Decimal>,
}

pub async fn create_client_tier(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateClientTierRequest>,
) -> Result<Response, AppError> {
    if body.id.is_some() {
        return Err(AppError::Conflict(
            "a new client tier cannot already have an id".to_string(),
        ));
    }
    if body.tier_name.trim().is_empty() {
        return Err(AppError::Validation(
            "tier_name must not be empty".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    if queries::get_client_tier_by_name(&db, body.tier_name.trim())?.is_some() {
        return Err(AppError::Conflict(format!(
            "client tier {} already exists",
            body.tier_name.trim()
        )));
    }

    let tier = queries::create_client_tier(&db, body.tier_name.trim(), body.discount_percentage)?;

    let location = format!("/api/client-tiers/{}", tier.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(tier),
    )
        .into_response())
}

// GET /api/client-tiers
pub async fn list_client_tiers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ClientTier>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_client_tiers(&db)?))
}

// GET /api/client-tiers/:id
pub async fn get_client_tier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ClientTier>, AppError> {
    let db = state.db.lock().unwrap();
    match queries::get_client_tier(&db, id)? {
        Some(tier) => Ok(Json(tier)),
        None => Err(AppError::NotFound(format!("client tier {id}"))),
    }
}

// PUT /api/client-tiers/:id
#[derive(Deserialize)]
pub struct UpdateClientTierRequest {
    pub id: Option<i64>,
    pub tier_name: String,
    pub discount_percentage: Option<Decimal>,
}

pub async fn update_client_tier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateClientTierRequest>,
) -> Result<Json<ClientTier>, AppError> {
    if body.id != Some(id) {
        return Err(AppError::Validation(
            "id in path and body do not match".to_string(),
        ));
    }
    if body.tier_name.trim().is_empty() {
        return Err(AppError::Validation(
            "tier_name must not be empty".to_string(),
        ));
    }

    let tier = ClientTier {
        id,
        tier_name: body.tier_name.trim().to_string(),
        discount_percentage: body.discount_percentage,
    };

    let db = state.db.lock().unwrap();
    if !queries::update_client_tier(&db, &tier)? {
        return Err(AppError::NotFound(format!("client tier {id}")));
    }
    Ok(Json(tier))
}

// PATCH /api/client-tiers/:id
#[derive(Deserialize)]
pub struct PatchClientTierRequest {
    pub tier_name: Option<String>,
    pub discount_percentage: Option<Decimal>,
}

pub async fn patch_client_tier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<PatchClientTierRequest>,
) -> Result<Json<ClientTier>, AppError> {
    let db = state.db.lock().unwrap();
    let Some(mut tier) = queries::get_client_tier(&db, id)? else {
        return Err(AppError::NotFound(format!("client tier {id}")));
    };

    if let Some(name) = body.tier_name {
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "tier_name must not be empty".to_string(),
            ));
        }
        tier.tier_name = name.trim().to_string();
    }
    if body.discount_percentage.is_some() {
        tier.discount_percentage = body.discount_percentage;
    }

    queries::update_client_tier(&db, &tier)?;
    Ok(Json(tier))
}

// DELETE /api/client-tiers/:id
pub async fn delete_client_tier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let db = state.db.lock().unwrap();
    queries::delete_client_tier(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}
