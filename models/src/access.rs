// models/src/access.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Geolocation;

/// Grant lifetime. Fixed; grants are never extended or revoked early, and
/// expiry is checked lazily at verify time.
pub const GRANT_TTL_MINUTES: i64 = 60;

/// Identity of the responder who scanned the QR credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessorInfo {
    pub name: String,
    pub role: String,
    pub license: Option<String>,
    pub institution_id: Option<Uuid>,
    pub institution_name: Option<String>,
}

/// Proof that a QR scan occurred. Created once, read-only afterward; expired
/// rows stay in storage for retention cleanup outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrant {
    pub token: Uuid,
    pub patient_id: Uuid,
    pub accessor: AccessorInfo,
    pub location: Option<Geolocation>,
    pub location_name: Option<String>,
    pub scopes: Vec<String>,
    pub accessed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn new(
        patient_id: Uuid,
        accessor: AccessorInfo,
        location: Option<Geolocation>,
        location_name: Option<String>,
        scopes: Vec<String>,
    ) -> Self {
        let accessed_at = Utc::now();
        AccessGrant {
            token: Uuid::new_v4(),
            patient_id,
            accessor,
            location,
            location_name,
            scopes,
            accessed_at,
            expires_at: accessed_at + Duration::minutes(GRANT_TTL_MINUTES),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
