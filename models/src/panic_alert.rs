// models/src/panic_alert.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dispatch::{ContactDeliveryResult, DeliveryStatus};

/// Lifecycle of a panic alert. `Active` is the only initial state; the three
/// successor states are all terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanicStatus {
    Active,
    Cancelled,
    Resolved,
    Expired,
}

impl PanicStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PanicStatus::Active)
    }

    pub fn can_transition_to(&self, next: PanicStatus) -> bool {
        matches!(
            (self, next),
            (
                PanicStatus::Active,
                PanicStatus::Cancelled | PanicStatus::Resolved | PanicStatus::Expired
            )
        )
    }
}

/// Facility matched at alert-creation time, persisted for reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitySnapshot {
    pub id: Uuid,
    pub name: String,
    pub distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<u8>,
}

/// Per-contact delivery outcome persisted on the alert record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactDeliverySnapshot {
    pub contact_id: Uuid,
    pub name: String,
    pub phone: String,
    pub sms_status: DeliveryStatus,
    pub email_status: DeliveryStatus,
}

impl From<&ContactDeliveryResult> for ContactDeliverySnapshot {
    fn from(result: &ContactDeliveryResult) -> Self {
        ContactDeliverySnapshot {
            contact_id: result.contact_id,
            name: result.name.clone(),
            phone: result.phone.clone(),
            sms_status: result.sms.status,
            email_status: result.email.status,
        }
    }
}

/// A patient-initiated emergency broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanicAlert {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub message: Option<String>,
    pub status: PanicStatus,
    pub facilities: Vec<FacilitySnapshot>,
    pub notified: Vec<ContactDeliverySnapshot>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}
