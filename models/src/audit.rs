// models/src/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One append-only audit record. Never mutated or deleted by this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor: String,
    pub action: String,
    pub resource: String,
    pub metadata: Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        actor: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
        metadata: Value,
    ) -> Self {
        AuditEvent {
            actor: actor.into(),
            action: action.into(),
            resource: resource.into(),
            metadata,
            timestamp: Utc::now(),
        }
    }
}
