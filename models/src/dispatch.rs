// models/src/dispatch.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What triggered a notification fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Panic,
    Access,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Panic => "panic",
            AlertKind::Access => "access",
        }
    }
}

/// Terminal status of one channel attempt for one contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    Skipped,
}

/// Outcome of a single channel for a single contact. An unconfigured provider
/// reports `Sent` with `simulated = true`; a real provider error reports
/// `Failed` plus the error text. Neither is ever raised to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelOutcome {
    pub status: DeliveryStatus,
    pub simulated: bool,
    pub error: Option<String>,
}

impl ChannelOutcome {
    pub fn sent() -> Self {
        ChannelOutcome {
            status: DeliveryStatus::Sent,
            simulated: false,
            error: None,
        }
    }

    pub fn simulated() -> Self {
        ChannelOutcome {
            status: DeliveryStatus::Sent,
            simulated: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        ChannelOutcome {
            status: DeliveryStatus::Failed,
            simulated: false,
            error: Some(error.into()),
        }
    }

    pub fn skipped() -> Self {
        ChannelOutcome {
            status: DeliveryStatus::Skipped,
            simulated: false,
            error: None,
        }
    }
}

/// Aggregated per-contact result returned by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactDeliveryResult {
    pub contact_id: Uuid,
    pub name: String,
    pub phone: String,
    pub sms: ChannelOutcome,
    pub email: ChannelOutcome,
}
