// emergency/src/panic.rs
//
// Panic alert lifecycle. An alert is born ACTIVE with a snapshot of the
// facilities matched at that moment; the patient can cancel it, and the
// administrative/scheduled paths can resolve or expire it depending on the
// configured policy. Terminal states absorb.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use audit_service::{AuditSink, record_or_log};
use geomatch_service::{CapabilityFilters, FacilityMatch, GeomatchEngine};
use models::dispatch::{AlertKind, ContactDeliveryResult};
use models::errors::{EmergencyError, Result};
use models::geo::Geolocation;
use models::panic_alert::{ContactDeliverySnapshot, FacilitySnapshot, PanicAlert, PanicStatus};
use notifications_service::{AlertContext, AlertDispatcher};
use security::CredentialVault;

use crate::config::{GeomatchDefaults, ResolutionPolicy};
use crate::profile::decrypt_medical;
use crate::storage::{AlertStore, PatientStore};

/// What the patient gets back from an activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanicOutcome {
    pub alert_id: Uuid,
    pub status: PanicStatus,
    pub facilities: Vec<FacilitySnapshot>,
    pub contact_results: Vec<ContactDeliveryResult>,
}

pub struct PanicAlertMachine {
    patients: Arc<dyn PatientStore>,
    alerts: Arc<dyn AlertStore>,
    vault: CredentialVault,
    geomatch: Arc<GeomatchEngine>,
    dispatcher: Arc<AlertDispatcher>,
    audit: Arc<dyn AuditSink>,
    geo_defaults: GeomatchDefaults,
    policy: ResolutionPolicy,
}

impl PanicAlertMachine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        patients: Arc<dyn PatientStore>,
        alerts: Arc<dyn AlertStore>,
        vault: CredentialVault,
        geomatch: Arc<GeomatchEngine>,
        dispatcher: Arc<AlertDispatcher>,
        audit: Arc<dyn AuditSink>,
        geo_defaults: GeomatchDefaults,
        policy: ResolutionPolicy,
    ) -> Self {
        PanicAlertMachine {
            patients,
            alerts,
            vault,
            geomatch,
            dispatcher,
            audit,
            geo_defaults,
            policy,
        }
    }

    /// Activates a panic alert: matches facilities (condition-aware when the
    /// patient has known conditions), persists the alert, fans out the
    /// notifications, and persists the per-contact delivery snapshot. The
    /// dispatch is awaited; its outcomes are part of the response.
    pub async fn activate(
        &self,
        patient_id: Uuid,
        location: Geolocation,
        accuracy_m: Option<f64>,
        message: Option<String>,
    ) -> Result<PanicOutcome> {
        let patient = self
            .patients
            .get(patient_id)
            .await?
            .ok_or_else(|| EmergencyError::NotFound(format!("patient {}", patient_id)))?;

        let conditions = decrypt_medical(&self.vault, &patient)?.conditions;
        let matches = self.match_facilities(location, &conditions).await?;
        let facilities: Vec<FacilitySnapshot> = matches
            .iter()
            .map(|m| FacilitySnapshot {
                id: m.facility.id,
                name: m.facility.name.clone(),
                distance_km: m.distance_km,
                match_score: m.score,
            })
            .collect();

        let mut alert = PanicAlert {
            id: Uuid::new_v4(),
            patient_id,
            latitude: location.latitude,
            longitude: location.longitude,
            accuracy_m,
            message: message.clone(),
            status: PanicStatus::Active,
            facilities: facilities.clone(),
            notified: Vec::new(),
            created_at: Utc::now(),
            cancelled_at: None,
            resolved_at: None,
        };
        self.alerts.insert(alert.clone()).await?;

        let ctx = AlertContext {
            kind: AlertKind::Panic,
            patient_id,
            patient_name: patient.full_name(),
            location: Some(location),
            message,
            accessor_name: None,
            facilities: matches,
        };
        let contact_results = self.dispatcher.notify_all(&ctx).await?;

        alert.notified = contact_results.iter().map(ContactDeliverySnapshot::from).collect();
        self.alerts.update(alert.clone()).await?;

        record_or_log(
            self.audit.as_ref(),
            models::audit::AuditEvent::new(
                patient_id.to_string(),
                "panic_alert_activated",
                format!("alert/{}", alert.id),
                json!({
                    "facilities": facilities.len(),
                    "contacts_notified": alert.notified.len(),
                }),
            ),
        )
        .await;

        info!(alert_id = %alert.id, patient_id = %patient_id, "panic alert activated");

        Ok(PanicOutcome {
            alert_id: alert.id,
            status: PanicStatus::Active,
            facilities,
            contact_results,
        })
    }

    /// Cancels an ACTIVE alert owned by `patient_id`. A missing or foreign
    /// alert reads as not-found; a terminal alert is a state conflict.
    pub async fn cancel(&self, alert_id: Uuid, patient_id: Uuid) -> Result<()> {
        let mut alert = self
            .alerts
            .get(alert_id)
            .await?
            .filter(|a| a.patient_id == patient_id)
            .ok_or_else(|| EmergencyError::NotFound(format!("alert {}", alert_id)))?;

        if !alert.status.can_transition_to(PanicStatus::Cancelled) {
            return Err(EmergencyError::StateConflict(format!(
                "alert {} is not active",
                alert_id
            )));
        }

        alert.status = PanicStatus::Cancelled;
        alert.cancelled_at = Some(Utc::now());
        self.alerts.update(alert.clone()).await?;

        self.dispatcher
            .publish_patient_event(
                patient_id,
                "panic_cancelled",
                json!({ "alert_id": alert.id, "cancelled_at": alert.cancelled_at }),
            )
            .await;

        record_or_log(
            self.audit.as_ref(),
            models::audit::AuditEvent::new(
                patient_id.to_string(),
                "panic_alert_cancelled",
                format!("alert/{}", alert.id),
                json!({}),
            ),
        )
        .await;

        Ok(())
    }

    /// Administrative resolution. Not reachable from the patient-facing
    /// facade; gated on the configured policy.
    pub async fn resolve(&self, alert_id: Uuid) -> Result<()> {
        if !self.policy.allows_manual_resolve() {
            return Err(EmergencyError::Config(
                "manual resolution is disabled by policy".to_string(),
            ));
        }

        let mut alert = self
            .alerts
            .get(alert_id)
            .await?
            .ok_or_else(|| EmergencyError::NotFound(format!("alert {}", alert_id)))?;

        if !alert.status.can_transition_to(PanicStatus::Resolved) {
            return Err(EmergencyError::StateConflict(format!(
                "alert {} is not active",
                alert_id
            )));
        }

        alert.status = PanicStatus::Resolved;
        alert.resolved_at = Some(Utc::now());
        self.alerts.update(alert.clone()).await?;

        record_or_log(
            self.audit.as_ref(),
            models::audit::AuditEvent::new(
                "admin",
                "panic_alert_resolved",
                format!("alert/{}", alert.id),
                json!({}),
            ),
        )
        .await;

        Ok(())
    }

    /// Expires every ACTIVE alert older than the policy's window. The hook an
    /// external scheduler calls; there is no sweeper inside this core.
    /// Returns the number of alerts expired.
    pub async fn expire_due(&self) -> Result<usize> {
        let Some(after_minutes) = self.policy.auto_expiry_minutes() else {
            return Ok(0);
        };
        let cutoff = Utc::now() - Duration::minutes(after_minutes);

        let mut expired = 0;
        for mut alert in self.alerts.active_alerts().await? {
            if alert.created_at > cutoff {
                continue;
            }
            if !alert.status.can_transition_to(PanicStatus::Expired) {
                continue;
            }
            alert.status = PanicStatus::Expired;
            alert.resolved_at = Some(Utc::now());
            if let Err(e) = self.alerts.update(alert.clone()).await {
                warn!(alert_id = %alert.id, error = %e, "failed to expire alert");
                continue;
            }
            expired += 1;
        }
        Ok(expired)
    }

    async fn match_facilities(
        &self,
        location: Geolocation,
        conditions: &[String],
    ) -> Result<Vec<FacilityMatch>> {
        if conditions.is_empty() {
            self.geomatch
                .nearby_by_distance(
                    location,
                    self.geo_defaults.radius_km,
                    self.geo_defaults.limit,
                    &CapabilityFilters::default(),
                )
                .await
        } else {
            self.geomatch
                .nearby_by_condition(
                    location,
                    conditions,
                    self.geo_defaults.radius_km,
                    self.geo_defaults.limit,
                    true,
                )
                .await
        }
    }
}
