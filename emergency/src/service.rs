// emergency/src/service.rs
//
// Facade consumed by the thin inbound controllers that live outside this
// core. Requests arrive as plain fields; the facade validates them into
// domain types and delegates to the broker and the panic machine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use audit_service::AuditSink;
use geomatch_service::{FacilityCatalog, GeomatchEngine};
use models::access::AccessorInfo;
use models::errors::Result;
use models::geo::Geolocation;
use notifications_service::{AlertDispatcher, EmailProvider, EventPublisher, SmsProvider};
use security::CredentialVault;

use crate::access::{AccessBroker, InitiatedAccess, VerifyOutcome};
use crate::config::EmergencyConfig;
use crate::panic::{PanicAlertMachine, PanicOutcome};
use crate::storage::{
    AlertStore, ContactDirectoryAdapter, ContactStore, GrantStore, PatientStore,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateAccessRequest {
    pub qr_token: String,
    pub accessor_name: String,
    pub accessor_role: String,
    pub accessor_license: Option<String>,
    pub institution_id: Option<Uuid>,
    pub institution_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivatePanicRequest {
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub message: Option<String>,
}

/// External collaborators injected at construction. Channel providers are
/// optional; a missing one puts that channel in simulation mode.
pub struct ServiceDeps {
    pub patients: Arc<dyn PatientStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub grants: Arc<dyn GrantStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub catalog: Arc<dyn FacilityCatalog>,
    pub sms: Option<Arc<dyn SmsProvider>>,
    pub email: Option<Arc<dyn EmailProvider>>,
    pub realtime: Option<Arc<dyn EventPublisher>>,
    pub audit: Arc<dyn AuditSink>,
}

/// The core, constructed once at process start and shared by reference.
pub struct EmergencyService {
    broker: AccessBroker,
    panic: PanicAlertMachine,
}

impl EmergencyService {
    pub fn new(config: &EmergencyConfig, deps: ServiceDeps) -> Result<Self> {
        let vault = CredentialVault::from_hex_key(&config.encryption_key()?)?;
        let geomatch = Arc::new(GeomatchEngine::new(deps.catalog));
        let dispatcher = Arc::new(AlertDispatcher::new(
            Arc::new(ContactDirectoryAdapter(deps.contacts.clone())),
            deps.sms,
            deps.email,
            deps.realtime,
            deps.audit.clone(),
            config.dispatch,
        ));

        let broker = AccessBroker::new(
            deps.patients.clone(),
            deps.contacts,
            deps.grants,
            vault.clone(),
            geomatch.clone(),
            dispatcher.clone(),
            deps.audit.clone(),
            config.geomatch,
        );
        let panic = PanicAlertMachine::new(
            deps.patients,
            deps.alerts,
            vault,
            geomatch,
            dispatcher,
            deps.audit,
            config.geomatch,
            config.resolution,
        );

        Ok(EmergencyService { broker, panic })
    }

    pub async fn initiate_access(&self, req: InitiateAccessRequest) -> Result<InitiatedAccess> {
        let location = match (req.latitude, req.longitude) {
            (Some(lat), Some(lon)) => Some(Geolocation::new(lat, lon)?),
            _ => None,
        };
        let accessor = AccessorInfo {
            name: req.accessor_name,
            role: req.accessor_role,
            license: req.accessor_license,
            institution_id: req.institution_id,
            institution_name: req.institution_name,
        };
        self.broker
            .initiate(&req.qr_token, accessor, location, req.location_name)
            .await
    }

    pub async fn verify_access(&self, access_token: &str) -> Result<VerifyOutcome> {
        self.broker.verify(access_token).await
    }

    pub async fn regenerate_qr(&self, patient_id: Uuid) -> Result<String> {
        self.broker.regenerate(patient_id).await
    }

    pub async fn activate_panic(&self, req: ActivatePanicRequest) -> Result<PanicOutcome> {
        let location = Geolocation::new(req.latitude, req.longitude)?;
        self.panic
            .activate(req.user_id, location, req.accuracy_m, req.message)
            .await
    }

    pub async fn cancel_panic(&self, alert_id: Uuid, user_id: Uuid) -> Result<()> {
        self.panic.cancel(alert_id, user_id).await
    }

    /// Administrative surface, kept off the patient-facing paths.
    pub fn panic_admin(&self) -> &PanicAlertMachine {
        &self.panic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use audit_service::InMemoryAuditLog;
    use geomatch_service::InMemoryFacilityCatalog;
    use models::contact::EmergencyContact;
    use models::errors::EmergencyError;
    use models::patient::{MedicalInfo, PatientRecord};
    use security::CredentialVault;

    use crate::storage::{
        InMemoryAlertStore, InMemoryContactStore, InMemoryGrantStore, InMemoryPatientStore,
    };

    const KEY_HEX: &str = "0101010101010101010101010101010101010101010101010101010101010101";

    async fn service_with_patient() -> (EmergencyService, Uuid) {
        let patients = Arc::new(InMemoryPatientStore::new());
        let contacts = Arc::new(InMemoryContactStore::new());

        let patient_id = Uuid::new_v4();
        let vault = CredentialVault::from_hex_key(KEY_HEX).unwrap();
        let mut patient = PatientRecord {
            id: patient_id,
            first_name: "Ana".to_string(),
            last_name: "Díaz".to_string(),
            date_of_birth: None,
            phone: None,
            blood_type_enc: None,
            allergies_enc: None,
            conditions_enc: None,
            medications_enc: None,
            organ_donor: false,
            donation_detail: None,
            directive_summary: None,
            qr_token: "qr-token-1".to_string(),
            qr_rotated_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        crate::profile::apply_medical(
            &vault,
            &mut patient,
            &MedicalInfo {
                blood_type: Some("AB-".to_string()),
                allergies: vec![],
                conditions: vec![],
                medications: vec![],
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
                email: None,
                relation: "sibling".to_string(),
                priority: 1,
                notify_on_emergency: true,
                notify_on_access: true,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let config = EmergencyConfig {
            encryption_key: Some(KEY_HEX.to_string()),
            ..Default::default()
        };
        let service = EmergencyService::new(
            &config,
            ServiceDeps {
                patients,
                contacts,
                grants: Arc::new(InMemoryGrantStore::new()),
                alerts: Arc::new(InMemoryAlertStore::new()),
                catalog: Arc::new(InMemoryFacilityCatalog::new()),
                sms: None,
                email: None,
                realtime: None,
                audit: Arc::new(InMemoryAuditLog::new()),
            },
        )
        .unwrap();

        (service, patient_id)
    }

    #[tokio::test]
    async fn full_access_flow_through_the_facade() {
        let (service, _) = service_with_patient().await;

        let access = service
            .initiate_access(InitiateAccessRequest {
                qr_token: "qr-token-1".to_string(),
                accessor_name: "Dr. Rojas".to_string(),
                accessor_role: "paramedic".to_string(),
                accessor_license: None,
                institution_id: None,
                institution_name: None,
                latitude: Some(4.6097),
                longitude: Some(-74.0817),
                location_name: None,
            })
            .await
            .unwrap();

        assert_eq!(access.medical.blood_type.as_deref(), Some("AB-"));
        assert!(matches!(
            service
                .verify_access(&access.access_token.to_string())
                .await
                .unwrap(),
            VerifyOutcome::Valid { .. }
        ));
        access.notifications.wait().await.unwrap();
    }

    #[tokio::test]
    async fn malformed_coordinates_are_rejected_before_any_work() {
        let (service, patient_id) = service_with_patient().await;
        let result = service
            .activate_panic(ActivatePanicRequest {
                user_id: patient_id,
                latitude: 123.0,
                longitude: 0.0,
                accuracy_m: None,
                message: None,
            })
            .await;
        assert!(matches!(result, Err(EmergencyError::Validation(_))));
    }

    #[tokio::test]
    async fn panic_flow_through_the_facade() {
        let (service, patient_id) = service_with_patient().await;
        let outcome = service
            .activate_panic(ActivatePanicRequest {
                user_id: patient_id,
                latitude: 4.6097,
                longitude: -74.0817,
                accuracy_m: Some(8.0),
                message: Some("help".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(outcome.contact_results.len(), 1);
        service.cancel_panic(outcome.alert_id, patient_id).await.unwrap();
        assert!(matches!(
            service.cancel_panic(outcome.alert_id, patient_id).await,
            Err(EmergencyError::StateConflict(_))
        ));
    }
}
