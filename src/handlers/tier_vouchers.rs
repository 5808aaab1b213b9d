use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{TierLevel, TierVoucher};
use crate::services::tier;
use crate::state::AppState;

fn parse_tier(raw: &str) -> Result<TierLevel, AppError> {
    TierLevel::from_str(raw)
        .ok_or_else(|| AppError::Validation(format!("unknown tier: {raw}")))
}

// POST /api/tier-vouchers
#[derive(Deserialize)]
pub struct CreateTierVoucherRequest {
    pub id: Option<i64>,
    pub tier: String,
    pub voucher_type: String,
}

pub async fn create_tier_voucher(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTierVoucherRequest>,
) -> Result<Response, AppError> {
    if body.id.is_some() {
        return Err(AppError::Conflict(
            "a new tier voucher cannot already have an id".to_string(),
        ));
    }
    let tier = parse_tier(&body.tier)?;
    if body.voucher_type.trim().is_empty() {
        return Err(AppError::Validation(
            "voucher_type must not be empty".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    if queries::get_voucher_by_tier(&db, tier)?.is_some() {
        return Err(AppError::Conflict(format!(
            "a voucher already exists for tier {}",
            tier.as_str()
        )));
    }

    let voucher = queries::create_tier_voucher(&db, tier, body.voucher_type.trim())?;

    let location = format!("/api/tier-vouchers/{}", voucher.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(voucher),
    )
        .into_response())
}

// GET /api/tier-vouchers
pub async fn list_tier_vouchers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TierVoucher>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_tier_vouchers(&db)?))
}

// GET /api/tier-vouchers/:id
pub async fn get_tier_voucher(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TierVoucher>, AppError> {
    let db = state.db.lock().unwrap();
    match queries::get_tier_voucher(&db, id)? {
        Some(voucher) => Ok(Json(voucher)),
        None => Err(AppError::NotFound(format!("tier voucher {id}"))),
    }
}

// GET /api/tier-vouchers/by-tier/:tier
pub async fn get_voucher_by_tier(
    State(state): State<Arc<AppState>>,
    Path(raw_tier): Path<String>,
) -> Result<Json<TierVoucher>, AppError> {
    let tier = parse_tier(&raw_tier)?;

    let db = state.db.lock().unwrap();
    match queries::get_voucher_by_tier(&db, tier)? {
        Some(voucher) => Ok(Json(voucher)),
        None => Err(AppError::NotFound(format!(
            "voucher for tier {}",
            tier.as_str()
        ))),
    }
}

// PUT /api/tier-vouchers/tier/:tier?voucherType=
#[derive(Deserialize)]
pub struct VoucherTypeQuery {
    #[serde(rename = "voucherType")]
    pub voucher_type: String,
}

pub async fn upsert_voucher_for_tier(
    State(state): State<Arc<AppState>>,
    Path(raw_tier): Path<String>,
    Query(query): Query<VoucherTypeQuery>,
) -> Result<Json<TierVoucher>, AppError> {
    let tier = parse_tier(&raw_tier)?;
    if query.voucher_type.trim().is_empty() {
        return Err(AppError::Validation(
            "voucherType must not be empty".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    let voucher = tier::assign_voucher(&db, tier, query.voucher_type.trim())?;
    Ok(Json(voucher))
}

// PUT /api/tier-vouchers/:id
#[derive(Deserialize)]
pub struct UpdateTierVoucherRequest {
    pub id: Option<i64>,
    pub tier: String,
    pub voucher_type: String,
}

pub async fn update_tier_voucher(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTierVoucherRequest>,
) -> Result<Json<TierVoucher>, AppError> {
    if body.id != Some(id) {
        return Err(AppError::Validation(
            "id in path and body do not match".to_string(),
        ));
    }
    let tier = parse_tier(&body.tier)?;
    if body.voucher_type.trim().is_empty() {
        return Err(AppError::Validation(
            "voucher_type must not be empty".to_string(),
        ));
    }

    let voucher = TierVoucher {
        id,
        tier,
        voucher_type: body.voucher_type.trim().to_string(),
    };

    let db = state.db.lock().unwrap();
    if !queries::update_tier_voucher(&db, &voucher)? {
        return Err(AppError::NotFound(format!("tier voucher {id}")));
    }
    Ok(Json(voucher))
}

// PATCH /api/tier-vouchers/:id
#[derive(Deserialize, Default)]
pub struct PatchTierVoucherRequest {
    pub tier: Option<String>,
    pub voucher_type: Option<String>,
}

pub async fn patch_tier_voucher(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<PatchTierVoucherRequest>,
) -> Result<Json<TierVoucher>, AppError> {
    let db = state.db.lock().unwrap();
    let mut voucher = queries::get_tier_voucher(&db, id)?
        .ok_or_else(|| AppError::NotFound(format!("tier voucher {id}")))?;

    if let Some(raw) = body.tier {
        voucher.tier = parse_tier(&raw)?;
    }
    if let Some(voucher_type) = body.voucher_type {
        if voucher_type.trim().is_empty() {
            return Err(AppError::Validation(
                "voucher_type must not be empty".to_string(),
            ));
        }
        voucher.voucher_type = voucher_type.trim().to_string();
    }

    if !queries::update_tier_voucher(&db, &voucher)? {
        return Err(AppError::NotFound(format!("tier voucher {id}")));
    }
    Ok(Json(voucher))
}

// DELETE /api/tier-vouchers/:id
pub async fn delete_tier_voucher(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let db = state.db.lock().unwrap();
    queries::delete_tier_voucher(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}
