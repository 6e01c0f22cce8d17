// emergency/src/access.rs
//
// QR access broker: issues short-lived access grants to responders who scan
// a patient's rotating QR credential, resolves the patient snapshot, and
// submits the access notification fan-out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use audit_service::{AuditSink, record_or_log};
use geomatch_service::{CapabilityFilters, GeomatchEngine};
use models::access::{AccessGrant, AccessorInfo};
use models::contact::EmergencyContact;
use models::dispatch::{AlertKind, ContactDeliveryResult};
use models::errors::{EmergencyError, Result};
use models::geo::Geolocation;
use models::patient::{MedicalInfo, PatientRecord};
use notifications_service::{AlertContext, AlertDispatcher};
use security::CredentialVault;

use crate::config::GeomatchDefaults;
use crate::profile::decrypt_medical;
use crate::storage::{GrantStore, PatientStore};
use crate::storage::ContactStore;

const QR_TOKEN_BYTES: usize = 32;

/// Data scopes granted to every QR access.
const GRANT_SCOPES: [&str; 5] = ["demographics", "medical", "directive", "donation", "contacts"];

/// The submitted access notification fan-out. Dropping the task does not stop
/// it; `wait` surfaces the per-contact outcomes (or the task failure) so the
/// caller cannot silently lose dispatch errors.
pub struct DispatchTask {
    handle: JoinHandle<Result<Vec<ContactDeliveryResult>>>,
}

impl DispatchTask {
    pub async fn wait(self) -> Result<Vec<ContactDeliveryResult>> {
        self.handle
            .await
            .map_err(|e| EmergencyError::Internal(format!("dispatch task failed: {}", e)))?
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationInfo {
    pub organ_donor: bool,
    pub detail: Option<String>,
}

/// Everything a responder sees after a successful scan, plus the handle to
/// the in-flight notification fan-out.
pub struct InitiatedAccess {
    pub access_token: Uuid,
    pub expires_at: DateTime<Utc>,
    pub patient: PatientSummary,
    pub medical: MedicalInfo,
    pub directive: Option<String>,
    pub donation: DonationInfo,
    pub representatives: Vec<EmergencyContact>,
    pub notifications: DispatchTask,
}

/// Result of a lazy expiry check on a stored grant. Expired and unknown are
/// distinguishable here and nowhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum VerifyOutcome {
    Valid {
        expires_at: DateTime<Utc>,
        accessed_at: DateTime<Utc>,
    },
    Expired {
        expires_at: DateTime<Utc>,
    },
    Unknown,
}

pub struct AccessBroker {
    patients: Arc<dyn PatientStore>,
    contacts: Arc<dyn ContactStore>,
    grants: Arc<dyn GrantStore>,
    vault: CredentialVault,
    geomatch: Arc<GeomatchEngine>,
    dispatcher: Arc<AlertDispatcher>,
    audit: Arc<dyn AuditSink>,
    geo_defaults: GeomatchDefaults,
}

impl AccessBroker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        patients: Arc<dyn PatientStore>,
        contacts: Arc<dyn ContactStore>,
        grants: Arc<dyn GrantStore>,
        vault: CredentialVault,
        geomatch: Arc<GeomatchEngine>,
        dispatcher: Arc<AlertDispatcher>,
        audit: Arc<dyn AuditSink>,
        geo_defaults: GeomatchDefaults,
    ) -> Self {
        AccessBroker {
            patients,
            contacts,
            grants,
            vault,
            geomatch,
            dispatcher,
            audit,
            geo_defaults,
        }
    }

    /// Replaces the patient's QR credential with a fresh random one. The old
    /// credential stops resolving the moment the swap lands; unexpired
    /// grants issued under it remain valid independently.
    pub async fn regenerate(&self, patient_id: Uuid) -> Result<String> {
        if self.patients.get(patient_id).await?.is_none() {
            return Err(EmergencyError::NotFound(format!("patient {}", patient_id)));
        }

        let mut bytes = [0u8; QR_TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        self.patients
            .rotate_qr_token(patient_id, token.clone(), Utc::now())
            .await?;

        record_or_log(
            self.audit.as_ref(),
            models::audit::AuditEvent::new(
                patient_id.to_string(),
                "qr_token_regenerated",
                format!("patient/{}", patient_id),
                json!({}),
            ),
        )
        .await;

        Ok(token)
    }

    /// Resolves a scanned QR credential into an access grant and a patient
    /// snapshot. An unknown credential yields one undetailed not-found
    /// signal; nothing reveals whether it ever existed.
    pub async fn initiate(
        &self,
        qr_token: &str,
        accessor: AccessorInfo,
        location: Option<Geolocation>,
        location_name: Option<String>,
    ) -> Result<InitiatedAccess> {
        if accessor.name.trim().is_empty() || accessor.role.trim().is_empty() {
            return Err(EmergencyError::Validation(
                "accessor name and role are required".to_string(),
            ));
        }

        let patient = self
            .patients
            .find_by_qr_token(qr_token)
            .await?
            .ok_or_else(|| EmergencyError::NotFound("emergency profile not found".to_string()))?;

        // Decrypt failures abort before any grant exists; a corrupted field
        // must never surface as empty data or leave a live access token
        // behind.
        let medical = decrypt_medical(&self.vault, &patient)?;
        let representatives = self.contacts.list_for(patient.id).await?;

        let grant = AccessGrant::new(
            patient.id,
            accessor.clone(),
            location,
            location_name,
            GRANT_SCOPES.iter().map(|s| s.to_string()).collect(),
        );
        self.grants.insert(grant.clone()).await?;

        let facilities = match location {
            Some(origin) => {
                self.geomatch
                    .nearby_by_distance(
                        origin,
                        self.geo_defaults.radius_km,
                        self.geo_defaults.limit,
                        &CapabilityFilters::default(),
                    )
                    .await?
            }
            None => Vec::new(),
        };

        let notifications = self.submit_access_dispatch(&patient, &accessor, location, facilities);

        record_or_log(
            self.audit.as_ref(),
            models::audit::AuditEvent::new(
                accessor.name.clone(),
                "emergency_access_initiated",
                format!("patient/{}", patient.id),
                json!({
                    "accessor_role": accessor.role,
                    "institution": accessor.institution_name,
                    "access_token": grant.token,
                }),
            ),
        )
        .await;

        info!(patient_id = %patient.id, accessor = %accessor.name, "emergency access initiated");

        Ok(InitiatedAccess {
            access_token: grant.token,
            expires_at: grant.expires_at,
            patient: PatientSummary {
                id: patient.id,
                name: patient.full_name(),
                date_of_birth: patient.date_of_birth,
                phone: patient.phone.clone(),
            },
            medical,
            directive: patient.directive_summary.clone(),
            donation: DonationInfo {
                organ_donor: patient.organ_donor,
                detail: patient.donation_detail.clone(),
            },
            representatives,
            notifications,
        })
    }

    /// Lazily checks a grant against the current time. Pure read: the grant
    /// row is never mutated or deleted here; retention cleanup of expired
    /// rows happens outside this core.
    pub async fn verify(&self, access_token: &str) -> Result<VerifyOutcome> {
        let Ok(token) = Uuid::parse_str(access_token) else {
            return Ok(VerifyOutcome::Unknown);
        };
        let Some(grant) = self.grants.get(token).await? else {
            return Ok(VerifyOutcome::Unknown);
        };
        if grant.is_expired_at(Utc::now()) {
            Ok(VerifyOutcome::Expired {
                expires_at: grant.expires_at,
            })
        } else {
            Ok(VerifyOutcome::Valid {
                expires_at: grant.expires_at,
                accessed_at: grant.accessed_at,
            })
        }
    }

    fn submit_access_dispatch(
        &self,
        patient: &PatientRecord,
        accessor: &AccessorInfo,
        location: Option<Geolocation>,
        facilities: Vec<geomatch_service::FacilityMatch>,
    ) -> DispatchTask {
        let dispatcher = Arc::clone(&self.dispatcher);
        let ctx = AlertContext {
            kind: AlertKind::Access,
            patient_id: patient.id,
            patient_name: patient.full_name(),
            location,
            message: None,
            accessor_name: Some(accessor.name.clone()),
            facilities,
        };
        DispatchTask {
            handle: tokio::spawn(async move { dispatcher.notify_all(&ctx).await }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use audit_service::InMemoryAuditLog;
    use geomatch_service::InMemoryFacilityCatalog;
    use models::dispatch::DeliveryStatus;
    use notifications_service::DispatchConfig;

    use crate::storage::{
        ContactDirectoryAdapter, InMemoryContactStore, InMemoryGrantStore, InMemoryPatientStore,
    };

    fn vault() -> CredentialVault {
        CredentialVault::new(&[9u8; 32]).unwrap()
    }

    struct Fixture {
        broker: AccessBroker,
        patients: Arc<InMemoryPatientStore>,
        grants: Arc<InMemoryGrantStore>,
        patient_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let patients = Arc::new(InMemoryPatientStore::new());
        let contacts = Arc::new(InMemoryContactStore::new());
        let grants = Arc::new(InMemoryGrantStore::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        let catalog = Arc::new(InMemoryFacilityCatalog::new());
        let geomatch = Arc::new(GeomatchEngine::new(catalog));
        let v = vault();

        let dispatcher = Arc::new(AlertDispatcher::new(
            Arc::new(ContactDirectoryAdapter(contacts.clone() as Arc<dyn ContactStore>)),
            None,
            None,
            None,
            audit.clone(),
            DispatchConfig::default(),
        ));

        let patient_id = Uuid::new_v4();
        let mut patient = PatientRecord {
            id: patient_id,
            first_name: "Ana".to_string(),
            last_name: "Díaz".to_string(),
            date_of_birth: None,
            phone: Some("+57 300 555 0000".to_string()),
            blood_type_enc: None,
            allergies_enc: None,
            conditions_enc: None,
            medications_enc: None,
            organ_donor: true,
            donation_detail: Some("all organs".to_string()),
            directive_summary: Some("do not resuscitate".to_string()),
            qr_token: "initial-token".to_string(),
            qr_rotated_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        crate::profile::apply_medical(
            &v,
            &mut patient,
            &MedicalInfo {
                blood_type: Some("O+".to_string()),
                allergies: vec!["penicillin".to_string()],
                conditions: vec!["diabetes".to_string()],
                medications: vec!["metformin".to_string()],
            },
        )
        .unwrap();
        patients.upsert(patient).await.unwrap();

        contacts
            .add(EmergencyContact {
                id: Uuid::new_v4(),
                patient_id,
                name: "Luis".to_string(),
                phone: "+57 300 555 0101".to_string(),
                email: Some("luis@example.com".to_string()),
                relation: "sibling".to_string(),
                priority: 1,
                notify_on_emergency: true,
                notify_on_access: true,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let broker = AccessBroker::new(
            patients.clone(),
            contacts,
            grants.clone(),
            v,
            geomatch,
            dispatcher,
            audit,
            GeomatchDefaults::default(),
        );

        Fixture {
            broker,
            patients,
            grants,
            patient_id,
        }
    }

    fn accessor() -> AccessorInfo {
        AccessorInfo {
            name: "Dr. Rojas".to_string(),
            role: "emergency physician".to_string(),
            license: Some("MED-4411".to_string()),
            institution_id: None,
            institution_name: Some("Hospital Central".to_string()),
        }
    }

    #[tokio::test]
    async fn successive_regenerations_yield_distinct_tokens_and_kill_the_old_one() {
        let f = fixture().await;

        let first = f.broker.regenerate(f.patient_id).await.unwrap();
        let second = f.broker.regenerate(f.patient_id).await.unwrap();
        assert_ne!(first, second);

        // The first rotated token no longer resolves.
        let err = f.broker.initiate(&first, accessor(), None, None).await;
        assert!(matches!(err, Err(EmergencyError::NotFound(_))));

        // The current one does.
        assert!(f.broker.initiate(&second, accessor(), None, None).await.is_ok());
    }

    #[tokio::test]
    async fn regenerate_unknown_patient_is_not_found() {
        let f = fixture().await;
        assert!(matches!(
            f.broker.regenerate(Uuid::new_v4()).await,
            Err(EmergencyError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn initiate_unknown_token_returns_single_not_found_signal() {
        let f = fixture().await;
        match f.broker.initiate("no-such-token", accessor(), None, None).await {
            Err(EmergencyError::NotFound(msg)) => {
                // One generic message; no hint whether the token ever existed.
                assert_eq!(msg, "emergency profile not found");
            }
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn initiate_requires_accessor_identity() {
        let f = fixture().await;
        let mut anonymous = accessor();
        anonymous.name = "  ".to_string();
        assert!(matches!(
            f.broker.initiate("initial-token", anonymous, None, None).await,
            Err(EmergencyError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn initiate_returns_decrypted_snapshot_and_completes_dispatch() {
        let f = fixture().await;
        let access = f
            .broker
            .initiate(
                "initial-token",
                accessor(),
                Some(Geolocation::new(4.6097, -74.0817).unwrap()),
                Some("Calle 26".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(access.patient.name, "Ana Díaz");
        assert_eq!(access.medical.blood_type.as_deref(), Some("O+"));
        assert_eq!(access.medical.conditions, vec!["diabetes".to_string()]);
        assert_eq!(access.directive.as_deref(), Some("do not resuscitate"));
        assert!(access.donation.organ_donor);
        assert_eq!(access.representatives.len(), 1);

        let grant = f.grants.get(access.access_token).await.unwrap().unwrap();
        assert_eq!(
            grant.expires_at - grant.accessed_at,
            Duration::minutes(models::access::GRANT_TTL_MINUTES)
        );

        // The fan-out completes within the request lifecycle; with no
        // providers configured every channel is a recorded simulation.
        let results = access.notifications.wait().await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sms.status, DeliveryStatus::Sent);
        assert!(results[0].sms.simulated);
    }

    #[tokio::test]
    async fn decrypt_failure_leaves_no_grant_behind() {
        let f = fixture().await;

        let corrupted_id = Uuid::new_v4();
        f.patients
            .upsert(PatientRecord {
                id: corrupted_id,
                first_name: "Mario".to_string(),
                last_name: "Paz".to_string(),
                date_of_birth: None,
                phone: None,
                blood_type_enc: None,
                allergies_enc: None,
                conditions_enc: Some("not:a:ciphertext".to_string()),
                medications_enc: None,
                organ_donor: false,
                donation_detail: None,
                directive_summary: None,
                qr_token: "corrupted-token".to_string(),
                qr_rotated_at: Utc::now(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        assert!(matches!(
            f.broker.initiate("corrupted-token", accessor(), None, None).await,
            Err(EmergencyError::Crypto(_))
        ));

        // The failed access issued no token: nothing for verify to honor.
        assert!(f.grants.is_empty().await);
    }

    #[tokio::test]
    async fn verify_distinguishes_valid_expired_and_unknown_without_mutation() {
        let f = fixture().await;
        let access = f
            .broker
            .initiate("initial-token", accessor(), None, None)
            .await
            .unwrap();

        match f.broker.verify(&access.access_token.to_string()).await.unwrap() {
            VerifyOutcome::Valid { expires_at, .. } => {
                assert_eq!(expires_at, access.expires_at)
            }
            other => panic!("expected Valid, got {:?}", other),
        }

        // Unknown token, and a string that is not even a UUID.
        assert_eq!(
            f.broker.verify(&Uuid::new_v4().to_string()).await.unwrap(),
            VerifyOutcome::Unknown
        );
        assert_eq!(
            f.broker.verify("not-a-uuid").await.unwrap(),
            VerifyOutcome::Unknown
        );

        // A grant past its window reads as expired, with the row untouched.
        let mut stale = AccessGrant::new(f.patient_id, accessor(), None, None, vec![]);
        stale.accessed_at = Utc::now() - Duration::minutes(120);
        stale.expires_at = Utc::now() - Duration::minutes(60);
        f.grants.insert(stale.clone()).await.unwrap();

        match f.broker.verify(&stale.token.to_string()).await.unwrap() {
            VerifyOutcome::Expired { expires_at } => assert_eq!(expires_at, stale.expires_at),
            other => panic!("expected Expired, got {:?}", other),
        }
        let after = f.grants.get(stale.token).await.unwrap().unwrap();
        assert_eq!(after.expires_at, stale.expires_at);
        assert_eq!(after.accessed_at, stale.accessed_at);
    }
}
