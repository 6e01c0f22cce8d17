// emergency/src/storage.rs
//
// Repository seams for the writes this core performs: grant creation, panic
// alert creation/status update, QR token rotation and contact reorder. The
// in-memory implementations back the tests and any embedding that syncs to a
// real store itself; persistence engine internals are not this core's
// concern.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use models::access::AccessGrant;
use models::contact::EmergencyContact;
use models::errors::{EmergencyError, Result};
use models::panic_alert::{PanicAlert, PanicStatus};
use models::patient::PatientRecord;

use notifications_service::ContactDirectory;

#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<PatientRecord>>;
    async fn find_by_qr_token(&self, token: &str) -> Result<Option<PatientRecord>>;
    async fn upsert(&self, patient: PatientRecord) -> Result<()>;
    /// Atomically replaces the stored QR token. The old token must stop
    /// resolving the moment this returns.
    async fn rotate_qr_token(&self, id: Uuid, token: String, at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn add(&self, contact: EmergencyContact) -> Result<()>;
    /// Contacts of the patient, ordered by ascending priority.
    async fn list_for(&self, patient_id: Uuid) -> Result<Vec<EmergencyContact>>;
    /// Renumbers priorities to 1..n following `ordered_ids`. Atomic across
    /// all affected contacts; the id set must exactly match the patient's.
    async fn reorder(&self, patient_id: Uuid, ordered_ids: &[Uuid]) -> Result<()>;
}

#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn insert(&self, grant: AccessGrant) -> Result<()>;
    async fn get(&self, token: Uuid) -> Result<Option<AccessGrant>>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert(&self, alert: PanicAlert) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<PanicAlert>>;
    async fn update(&self, alert: PanicAlert) -> Result<()>;
    async fn active_alerts(&self) -> Result<Vec<PanicAlert>>;
}

#[derive(Debug, Default)]
pub struct InMemoryPatientStore {
    patients: Arc<RwLock<HashMap<Uuid, PatientRecord>>>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn get(&self, id: Uuid) -> Result<Option<PatientRecord>> {
        let patients = self.patients.read().await;
        Ok(patients.get(&id).cloned())
    }

    async fn find_by_qr_token(&self, token: &str) -> Result<Option<PatientRecord>> {
        let patients = self.patients.read().await;
        Ok(patients.values().find(|p| p.qr_token == token).cloned())
    }

    async fn upsert(&self, patient: PatientRecord) -> Result<()> {
        let mut patients = self.patients.write().await;
        patients.insert(patient.id, patient);
        Ok(())
    }

    async fn rotate_qr_token(&self, id: Uuid, token: String, at: DateTime<Utc>) -> Result<()> {
        let mut patients = self.patients.write().await;
        let patient = patients
            .get_mut(&id)
            .ok_or_else(|| EmergencyError::NotFound(format!("patient {}", id)))?;
        patient.qr_token = token;
        patient.qr_rotated_at = at;
        patient.updated_at = at;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryContactStore {
    contacts: Arc<RwLock<HashMap<Uuid, EmergencyContact>>>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn add(&self, contact: EmergencyContact) -> Result<()> {
        let mut contacts = self.contacts.write().await;
        contacts.insert(contact.id, contact);
        Ok(())
    }

    async fn list_for(&self, patient_id: Uuid) -> Result<Vec<EmergencyContact>> {
        let contacts = self.contacts.read().await;
        let mut list: Vec<EmergencyContact> = contacts
            .values()
            .filter(|c| c.patient_id == patient_id)
            .cloned()
            .collect();
        list.sort_by_key(|c| c.priority);
        Ok(list)
    }

    async fn reorder(&self, patient_id: Uuid, ordered_ids: &[Uuid]) -> Result<()> {
        // Single write lock for the whole renumbering: a partial reorder
        // would break the dense-unique-priority invariant.
        let mut contacts = self.contacts.write().await;

        let mut current: Vec<Uuid> = contacts
            .values()
            .filter(|c| c.patient_id == patient_id)
            .map(|c| c.id)
            .collect();
        current.sort();
        let mut requested = ordered_ids.to_vec();
        requested.sort();
        requested.dedup();
        if current != requested || requested.len() != ordered_ids.len() {
            return Err(EmergencyError::Validation(
                "reorder must list each of the patient's contacts exactly once".to_string(),
            ));
        }

        for (index, id) in ordered_ids.iter().enumerate() {
            if let Some(contact) = contacts.get_mut(id) {
                contact.priority = (index + 1) as u32;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryGrantStore {
    grants: Arc<RwLock<HashMap<Uuid, AccessGrant>>>,
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.grants.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.grants.read().await.is_empty()
    }
}

#[async_trait]
impl GrantStore for InMemoryGrantStore {
    async fn insert(&self, grant: AccessGrant) -> Result<()> {
        let mut grants = self.grants.write().await;
        grants.insert(grant.token, grant);
        Ok(())
    }

    async fn get(&self, token: Uuid) -> Result<Option<AccessGrant>> {
        let grants = self.grants.read().await;
        Ok(grants.get(&token).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAlertStore {
    alerts: Arc<RwLock<HashMap<Uuid, PanicAlert>>>,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn insert(&self, alert: PanicAlert) -> Result<()> {
        let mut alerts = self.alerts.write().await;
        alerts.insert(alert.id, alert);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<PanicAlert>> {
        let alerts = self.alerts.read().await;
        Ok(alerts.get(&id).cloned())
    }

    async fn update(&self, alert: PanicAlert) -> Result<()> {
        let mut alerts = self.alerts.write().await;
        if !alerts.contains_key(&alert.id) {
            return Err(EmergencyError::NotFound(format!("alert {}", alert.id)));
        }
        alerts.insert(alert.id, alert);
        Ok(())
    }

    async fn active_alerts(&self) -> Result<Vec<PanicAlert>> {
        let alerts = self.alerts.read().await;
        Ok(alerts
            .values()
            .filter(|a| a.status == PanicStatus::Active)
            .cloned()
            .collect())
    }
}

/// Bridges a [`ContactStore`] into the read contract the dispatcher expects.
pub struct ContactDirectoryAdapter(pub Arc<dyn ContactStore>);

#[async_trait]
impl ContactDirectory for ContactDirectoryAdapter {
    async fn contacts_for(&self, patient_id: Uuid) -> Result<Vec<EmergencyContact>> {
        self.0.list_for(patient_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(patient_id: Uuid, name: &str, priority: u32) -> EmergencyContact {
        EmergencyContact {
            id: Uuid::new_v4(),
            patient_id,
            name: name.to_string(),
            phone: "+57 300 555 0101".to_string(),
            email: None,
            relation: "sibling".to_string(),
            priority,
            notify_on_emergency: true,
            notify_on_access: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn reorder_renumbers_densely_from_one() {
        let store = InMemoryContactStore::new();
        let patient_id = Uuid::new_v4();
        let a = contact(patient_id, "A", 1);
        let b = contact(patient_id, "B", 2);
        let c = contact(patient_id, "C", 3);
        for x in [&a, &b, &c] {
            store.add(x.clone()).await.unwrap();
        }

        store.reorder(patient_id, &[c.id, a.id, b.id]).await.unwrap();

        let list = store.list_for(patient_id).await.unwrap();
        let names: Vec<&str> = list.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["C", "A", "B"]);
        let priorities: Vec<u32> = list.iter().map(|c| c.priority).collect();
        assert_eq!(priorities, [1, 2, 3]);
    }

    #[tokio::test]
    async fn reorder_rejects_incomplete_or_foreign_id_sets() {
        let store = InMemoryContactStore::new();
        let patient_id = Uuid::new_v4();
        let a = contact(patient_id, "A", 1);
        let b = contact(patient_id, "B", 2);
        store.add(a.clone()).await.unwrap();
        store.add(b.clone()).await.unwrap();

        // Missing one contact.
        assert!(store.reorder(patient_id, &[a.id]).await.is_err());
        // Unknown id in the list.
        assert!(
            store
                .reorder(patient_id, &[a.id, Uuid::new_v4()])
                .await
                .is_err()
        );
        // Duplicate id.
        assert!(store.reorder(patient_id, &[a.id, a.id]).await.is_err());

        // Failed attempts leave the original priorities untouched.
        let list = store.list_for(patient_id).await.unwrap();
        assert_eq!(list[0].name, "A");
        assert_eq!(list[0].priority, 1);
        assert_eq!(list[1].priority, 2);
    }
}
