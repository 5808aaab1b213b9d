use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::AppError;
use crate::services::revenue::{self, Period, RevenueBucket};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PeriodQuery {
    pub period: String,
}

// GET /api/revenue?period=daily|weekly|monthly
pub async fn revenue_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<RevenueBucket>>, AppError> {
    let period = Period::parse(&query.period);
    let today = Utc::now().date_naive();

    let db = state.db.lock().unwrap();
    Ok(Json(revenue::revenue_series(&db, period, today)?))
}

// GET /api/revenue/total?period=
pub async fn revenue_total(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Decimal>, AppError> {
    let period = Period::parse(&query.period);
    let today = Utc::now().date_naive();

    let db = state.db.lock().unwrap();
    Ok(Json(revenue::total_for_period(&db, period, today)?))
}
