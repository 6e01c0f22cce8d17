// models/src/facility.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attention tier of a care facility, first level being the most basic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionTier {
    FirstLevel,
    SecondLevel,
    ThirdLevel,
}

/// A care facility as read from the external catalog. Read-only to this core;
/// catalog maintenance lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub phone: Option<String>,
    pub specialties: Vec<String>,
    pub has_emergency: bool,
    pub has_24h: bool,
    pub has_icu: bool,
    pub has_trauma: bool,
    pub tier: AttentionTier,
    pub active: bool,
}

impl Facility {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}
