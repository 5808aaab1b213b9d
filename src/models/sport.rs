use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sport {
    pub id: i64,
    pub name: String,
}
