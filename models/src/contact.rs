// models/src/contact.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An emergency contact. `priority` is 1-based, unique and dense per patient;
/// any reorder renumbers every affected contact in one atomic write. The two
/// notify flags gate the panic and profile-access fan-outs respectively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub relation: String,
    pub priority: u32,
    pub notify_on_emergency: bool,
    pub notify_on_access: bool,
    pub created_at: DateTime<Utc>,
}
