use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub booking_id: String,
    pub booking_date: NaiveDateTime,
    pub status: BookingStatus,
    pub user_id: Option<i64>,
    pub time_slot_id: Option<i64>,
    pub payment_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Approved => "APPROVED",
            BookingStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "APPROVED" => BookingStatus::Approved,
            "REJECTED" => BookingStatus::Rejected,
            _ => BookingStatus::Pending,
        }
    }
}
