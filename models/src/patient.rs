// models/src/patient.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A patient record as stored. Medical fields are opaque ciphertexts produced
/// by the credential vault; nothing outside an explicit vault decrypt ever
/// sees them in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub phone: Option<String>,

    pub blood_type_enc: Option<String>,
    pub allergies_enc: Option<String>,
    pub conditions_enc: Option<String>,
    pub medications_enc: Option<String>,

    pub organ_donor: bool,
    pub donation_detail: Option<String>,
    pub directive_summary: Option<String>,

    /// Rotating QR credential. Unique across patients; replaced wholesale on
    /// regeneration, at which point the previous value stops resolving.
    pub qr_token: String,
    pub qr_rotated_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PatientRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Decrypted view of the sensitive fields, assembled only inside an access
/// snapshot or a panic activation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicalInfo {
    pub blood_type: Option<String>,
    pub allergies: Vec<String>,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
}
