use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientTier {
    pub id: i64,
    pub tier_name: String,
    pub discount_percentage: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierVoucher {
    pub id: i64,
    pub tier: TierLevel,
    pub voucher_type: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum TierLevel {
    Lead,
    Iron,
    Gold,
    Platinum,
}

impl TierLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierLevel::Lead => "LEAD",
            TierLevel::Iron => "IRON",
            TierLevel::Gold => "GOLD",
            TierLevel::Platinum => "PLATINUM",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LEAD" => Some(TierLevel::Lead),
            "IRON" => Some(TierLevel::Iron),
            "GOLD" => Some(TierLevel::Gold),
            "PLATINUM" => Some(TierLevel::Platinum),
            _ => None,
        }
    }
}
