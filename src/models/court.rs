use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Court {
    pub id: i64,
    pub name: String,
    pub sport_id: Option<i64>,
}
