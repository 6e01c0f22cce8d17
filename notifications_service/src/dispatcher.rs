// notifications_service/src/dispatcher.rs

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use audit_service::{AuditSink, record_or_log};
use geomatch_service::FacilityMatch;
use models::audit::AuditEvent;
use models::contact::EmergencyContact;
use models::dispatch::{AlertKind, ChannelOutcome, ContactDeliveryResult};
use models::errors::Result;
use models::geo::Geolocation;

use crate::channels::{
    ContactDirectory, EmailMessage, EmailProvider, EventPublisher, RealtimeEvent, SmsMessage,
    SmsProvider,
};
use crate::templates::{self, TemplateInput};

/// Dispatcher tuning. `max_retries` is the number of re-attempts after the
/// first failed send; the default of zero matches the no-retry policy of the
/// system this core serves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub max_retries: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig { max_retries: 0 }
    }
}

/// Everything the templates and the real-time events need about one alert.
#[derive(Debug, Clone)]
pub struct AlertContext {
    pub kind: AlertKind,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub location: Option<Geolocation>,
    pub message: Option<String>,
    pub accessor_name: Option<String>,
    pub facilities: Vec<FacilityMatch>,
}

/// Fans one alert out to every notifiable contact of a patient.
///
/// Channel adapters are optional: a `None` provider means the channel is not
/// configured in this deployment, and sends through it degrade to a recorded
/// simulation (`Sent` with `simulated = true`) instead of failing. Individual
/// channel failures are captured in the per-contact result and never abort
/// the remaining work.
pub struct AlertDispatcher {
    contacts: Arc<dyn ContactDirectory>,
    sms: Option<Arc<dyn SmsProvider>>,
    email: Option<Arc<dyn EmailProvider>>,
    realtime: Option<Arc<dyn EventPublisher>>,
    audit: Arc<dyn AuditSink>,
    config: DispatchConfig,
}

impl AlertDispatcher {
    pub fn new(
        contacts: Arc<dyn ContactDirectory>,
        sms: Option<Arc<dyn SmsProvider>>,
        email: Option<Arc<dyn EmailProvider>>,
        realtime: Option<Arc<dyn EventPublisher>>,
        audit: Arc<dyn AuditSink>,
        config: DispatchConfig,
    ) -> Self {
        AlertDispatcher {
            contacts,
            sms,
            email,
            realtime,
            audit,
            config,
        }
    }

    /// Notifies every contact opted into the alert's kind (`notify_on_emergency`
    /// for panic, `notify_on_access` for profile access), in priority order.
    /// Work across contacts and across channels runs concurrently, but the
    /// call returns only once every attempted channel has an outcome.
    pub async fn notify_all(&self, ctx: &AlertContext) -> Result<Vec<ContactDeliveryResult>> {
        let mut contacts = self.contacts.contacts_for(ctx.patient_id).await?;
        contacts.retain(|c| match ctx.kind {
            AlertKind::Panic => c.notify_on_emergency,
            AlertKind::Access => c.notify_on_access,
        });
        contacts.sort_by_key(|c| c.priority);

        let results = join_all(contacts.iter().map(|c| self.notify_contact(ctx, c))).await;

        record_or_log(
            self.audit.as_ref(),
            AuditEvent::new(
                ctx.patient_id.to_string(),
                format!("{}_alerts_dispatched", ctx.kind.as_str()),
                format!("patient/{}", ctx.patient_id),
                json!({
                    "contacts": results.len(),
                    "sms_sent": results
                        .iter()
                        .filter(|r| r.sms.status == models::dispatch::DeliveryStatus::Sent)
                        .count(),
                }),
            ),
        )
        .await;

        Ok(results)
    }

    /// Publishes one structured event to the patient's session channel and
    /// one to the patient-scoped representative channel. Publish failures are
    /// logged and dropped; the real-time layer is best-effort.
    pub async fn publish_patient_event(&self, patient_id: Uuid, event: &str, payload: Value) {
        let targets = [
            RealtimeEvent::user_channel(patient_id),
            RealtimeEvent::representative_channel(patient_id),
        ];
        for channel in targets {
            let rt = RealtimeEvent {
                channel,
                event: event.to_string(),
                payload: payload.clone(),
            };
            match &self.realtime {
                Some(publisher) => {
                    if let Err(e) = publisher.publish(&rt).await {
                        warn!(channel = %rt.channel, error = %e, "realtime publish failed");
                    }
                }
                None => {
                    debug!(channel = %rt.channel, event = %rt.event, "realtime publisher not configured; event simulated");
                }
            }
        }
    }

    async fn notify_contact(
        &self,
        ctx: &AlertContext,
        contact: &EmergencyContact,
    ) -> ContactDeliveryResult {
        let input = TemplateInput {
            kind: ctx.kind,
            patient_name: &ctx.patient_name,
            contact_name: &contact.name,
            location: ctx.location,
            message: ctx.message.as_deref(),
            accessor_name: ctx.accessor_name.as_deref(),
            facilities: &ctx.facilities,
        };

        let (sms, email) = tokio::join!(
            self.send_sms(contact, &input),
            self.send_email(contact, &input)
        );

        // Real-time events go out regardless of the per-contact outcome.
        let event_name = match ctx.kind {
            AlertKind::Panic => "panic_alert",
            AlertKind::Access => "profile_access",
        };
        self.publish_patient_event(
            ctx.patient_id,
            event_name,
            json!({
                "patient_id": ctx.patient_id,
                "contact": contact.name,
                "latitude": ctx.location.map(|l| l.latitude),
                "longitude": ctx.location.map(|l| l.longitude),
                "timestamp": Utc::now(),
            }),
        )
        .await;

        ContactDeliveryResult {
            contact_id: contact.id,
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            sms,
            email,
        }
    }

    async fn send_sms(&self, contact: &EmergencyContact, input: &TemplateInput<'_>) -> ChannelOutcome {
        let message = SmsMessage {
            to: contact.phone.clone(),
            body: templates::sms_body(input),
        };
        match &self.sms {
            Some(provider) => {
                let mut last_error = String::new();
                for attempt in 0..=self.config.max_retries {
                    match provider.send(&message).await {
                        Ok(()) => return ChannelOutcome::sent(),
                        Err(e) => {
                            last_error = e.to_string();
                            debug!(to = %message.to, attempt, error = %last_error, "sms send failed");
                        }
                    }
                }
                ChannelOutcome::failed(last_error)
            }
            None => {
                info!(to = %message.to, "sms provider not configured; delivery simulated");
                ChannelOutcome::simulated()
            }
        }
    }

    async fn send_email(
        &self,
        contact: &EmergencyContact,
        input: &TemplateInput<'_>,
    ) -> ChannelOutcome {
        let Some(address) = contact.email.as_ref() else {
            return ChannelOutcome::skipped();
        };
        let message = EmailMessage {
            to: address.clone(),
            subject: templates::email_subject(input),
            body: templates::email_body(input),
        };
        match &self.email {
            Some(provider) => {
                let mut last_error = String::new();
                for attempt in 0..=self.config.max_retries {
                    match provider.send(&message).await {
                        Ok(()) => return ChannelOutcome::sent(),
                        Err(e) => {
                            last_error = e.to_string();
                            debug!(to = %message.to, attempt, error = %last_error, "email send failed");
                        }
                    }
                }
                ChannelOutcome::failed(last_error)
            }
            None => {
                info!(to = %message.to, "email provider not configured; delivery simulated");
                ChannelOutcome::simulated()
            }
        }
    }
}
