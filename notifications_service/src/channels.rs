// notifications_service/src/channels.rs
//
// Seams to the external delivery providers. This core defines message
// content and the per-channel result contract only; transport details (and
// their timeouts) belong to the adapter implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use models::contact::EmergencyContact;
use models::errors::Result;

/// A rendered SMS, ready for an adapter to deliver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
}

/// A rendered email, ready for an adapter to deliver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// A structured event for the real-time layer. `channel` is a logical room
/// name; the publisher decides how rooms map onto its transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub channel: String,
    pub event: String,
    pub payload: Value,
}

impl RealtimeEvent {
    /// The patient's own session channel.
    pub fn user_channel(patient_id: Uuid) -> String {
        format!("user:{}", patient_id)
    }

    /// The representative channel scoped to the same patient.
    pub fn representative_channel(patient_id: Uuid) -> String {
        format!("representative:{}", patient_id)
    }
}

#[async_trait]
pub trait SmsProvider: Send + Sync {
    async fn send(&self, message: &SmsMessage) -> Result<()>;
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &RealtimeEvent) -> Result<()>;
}

/// Read contract the dispatcher needs from contact storage.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Contacts of the patient, ordered by ascending priority.
    async fn contacts_for(&self, patient_id: Uuid) -> Result<Vec<EmergencyContact>>;
}
