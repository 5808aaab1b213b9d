use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub age: Option<i64>,
    pub dob: Option<NaiveDateTime>,
    pub tier_id: Option<i64>,
    pub user_id: Option<i64>,
}
