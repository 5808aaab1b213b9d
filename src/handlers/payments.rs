use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Payment;
use crate::state::AppState;

fn ensure_user_exists(conn: &Connection, user_id: Option<i64>) -> Result<(), AppError> {
    if let Some(id) = user_id {
        if queries::get_user(conn, id)?.is_none() {
            return Err(AppError::NotFound(format!("user {id}")));
        }
    }
    Ok(())
}

fn ensure_positive(amount: Decimal) -> Result<(), AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation("amount must be positive".to_string()));
    }
    Ok(())
}

// POST /api/payments
#[derive(Deserialize)]
pub struct CreatePaymentRequest {
    pub id: Option<i64>,
    pub amount: Decimal,
    pub payment_date: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub qr_code_url: Option<String>,
    pub transaction_id: Option<String>,
    pub user_id: Option<i64>,
}

pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePaymentRequest>,
) -> Result<Response, AppError> {
    if body.id.is_some() {
        return Err(AppError::Conflict(
            "a new payment cannot already have an id".to_string(),
        ));
    }
    ensure_positive(body.amount)?;

    let db = state.db.lock().unwrap();
    ensure_user_exists(&db, body.user_id)?;

    let mut payment = Payment {
        id: 0,
        amount: body.amount,
        payment_date: body.payment_date,
        status: body.status,
        qr_code_url: body.qr_code_url,
        transaction_id: Some(
            body.transaction_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        ),
        user_id: body.user_id,
    };
    payment.id = queries::create_payment(&db, &payment)?;

    let location = format!("/api/payments/{}", payment.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(payment),
    )
        .into_response())
}

// GET /api/payments
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_payments(&db)?))
}

// GET /api/payments/:id
pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Payment>, AppError> {
    let db = state.db.lock().unwrap();
    match queries::get_payment(&db, id)? {
        Some(payment) => Ok(Json(payment)),
        None => Err(AppError::NotFound(format!("payment {id}"))),
    }
}

// PUT /api/payments/:id
#[derive(Deserialize)]
pub struct UpdatePaymentRequest {
    pub id: Option<i64>,
    pub amount: Decimal,
    pub payment_date: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub qr_code_url: Option<String>,
    pub transaction_id: Option<String>,
    pub user_id: Option<i64>,
}

pub async fn update_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePaymentRequest>,
) -> Result<Json<Payment>, AppError> {
    if body.id != Some(id) {
        return Err(AppError::Validation(
            "id in path and body do not match".to_string(),
        ));
    }
    ensure_positive(body.amount)?;

    let db = state.db.lock().unwrap();
    ensure_user_exists(&db, body.user_id)?;

    let payment = Payment {
        id,
        amount: body.amount,
        payment_date: body.payment_date,
        status: body.status,
        qr_code_url: body.qr_code_url,
        transaction_id: body.transaction_id,
        user_id: body.user_id,
    };
    if !queries::update_payment(&db, &payment)? {
        return Err(AppError::NotFound(format!("payment {id}")));
    }
    Ok(Json(payment))
}

// PATCH /api/payments/:id
#[derive(Deserialize)]
pub struct PatchPaymentRequest {
    pub amount: Option<Decimal>,
    pub payment_date: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub qr_code_url: Option<String>,
    pub transaction_id: Option<String>,
    pub user_id: Option<i64>,
}

pub async fn patch_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<PatchPaymentRequest>,
) -> Result<Json<Payment>, AppError> {
    let db = state.db.lock().unwrap();
    let Some(mut payment) = queries::get_payment(&db, id)? else {
        return Err(AppError::NotFound(format!("payment {id}")));
    };

    ensure_user_exists(&db, body.user_id)?;

    if let Some(amount) = body.amount {
        ensure_positive(amount)?;
        payment.amount = amount;
    }
    if body.payment_date.is_some() {
        payment.payment_date = body.payment_date;
    }
    if body.status.is_some() {
        payment.status = body.status;
    }
    if body.qr_code_url.is_some() {
        payment.qr_code_url = body.qr_code_url;
    }
    if body.transaction_id.is_some() {
        payment.transaction_id = body.transaction_id;
    }
    if body.user_id.is_some() {
        payment.user_id = body.user_id;
    }

    queries::update_payment(&db, &payment)?;
    Ok(Json(payment))
}

// DELETE /api/payments/:id
pub async fn delete_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let db = state.db.lock().unwrap();
    queries::delete_payment(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}
