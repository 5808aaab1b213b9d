use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub amount: Decimal,
    pub payment_date: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub qr_code_url: Option<String>,
    pub transaction_id: Option<String>,
    pub user_id: Option<i64>,
}
