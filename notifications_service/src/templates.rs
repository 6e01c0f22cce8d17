// notifications_service/src/templates.rs
//
// Message content for each alert kind. The SMS stays short and always fits
// one segment worth of essentials; the email carries the facility list.

use models::dispatch::AlertKind;
use models::geo::Geolocation;

use geomatch_service::FacilityMatch;

/// Upper bound on facilities listed in the email body.
pub const MAX_EMAIL_FACILITIES: usize = 3;

pub struct TemplateInput<'a> {
    pub kind: AlertKind,
    pub patient_name: &'a str,
    pub contact_name: &'a str,
    pub location: Option<Geolocation>,
    pub message: Option<&'a str>,
    pub accessor_name: Option<&'a str>,
    pub facilities: &'a [FacilityMatch],
}

pub fn sms_body(input: &TemplateInput<'_>) -> String {
    let map_link = input
        .location
        .map(|l| l.map_link())
        .unwrap_or_else(|| "unknown".to_string());
    let nearest = input
        .facilities
        .first()
        .map(|m| format!(" Nearest facility: {}.", m.facility.name))
        .unwrap_or_default();

    match input.kind {
        AlertKind::Panic => {
            let note = input
                .message
                .map(|m| format!(" Message: {}.", m))
                .unwrap_or_default();
            format!(
                "EMERGENCY: {} activated a panic alert.{} Location: {}.{}",
                input.patient_name, note, map_link, nearest
            )
        }
        AlertKind::Access => {
            let accessor = input.accessor_name.unwrap_or("an emergency responder");
            format!(
                "ALERT: {}'s emergency medical profile was accessed by {}. Location: {}.{}",
                input.patient_name, accessor, map_link, nearest
            )
        }
    }
}

pub fn email_subject(input: &TemplateInput<'_>) -> String {
    match input.kind {
        AlertKind::Panic => format!("Emergency: panic alert from {}", input.patient_name),
        AlertKind::Access => format!("Medical profile access notice for {}", input.patient_name),
    }
}

pub fn email_body(input: &TemplateInput<'_>) -> String {
    let mut body = format!("Hello {},\n\n", input.contact_name);

    match input.kind {
        AlertKind::Panic => {
            body.push_str(&format!(
                "{} has activated a panic alert and may need immediate help.\n",
                input.patient_name
            ));
            if let Some(message) = input.message {
                body.push_str(&format!("Their message: \"{}\"\n", message));
            }
        }
        AlertKind::Access => {
            let accessor = input.accessor_name.unwrap_or("an emergency responder");
            body.push_str(&format!(
                "{}'s emergency medical profile was just accessed by {}.\n",
                input.patient_name, accessor
            ));
        }
    }

    let location = input
        .location
        .map(|l| l.map_link())
        .unwrap_or_else(|| "unknown".to_string());
    body.push_str(&format!("\nLast known location: {}\n", location));

    if !input.facilities.is_empty() {
        body.push_str("\nNearby care facilities:\n");
        for m in input.facilities.iter().take(MAX_EMAIL_FACILITIES) {
            let phone = m.facility.phone.as_deref().unwrap_or("no phone on record");
            body.push_str(&format!(
                "  - {} ({:.1} km) — {}\n",
                m.facility.name, m.distance_km, phone
            ));
        }
    }

    body.push_str("\nThis is an automated emergency notification.\n");
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::facility::{AttentionTier, Facility};
    use uuid::Uuid;

    fn matches(n: usize) -> Vec<FacilityMatch> {
        (0..n)
            .map(|i| FacilityMatch {
                facility: Facility {
                    id: Uuid::new_v4(),
                    name: format!("Hospital {}", i),
                    latitude: Some(4.6),
                    longitude: Some(-74.08),
                    phone: Some(format!("+57 601 555 010{}", i)),
                    specialties: vec!["emergency".to_string()],
                    has_emergency: true,
                    has_24h: true,
                    has_icu: false,
                    has_trauma: false,
                    tier: AttentionTier::SecondLevel,
                    active: true,
                },
                distance_km: 1.5 + i as f64,
                score: None,
            })
            .collect()
    }

    fn input<'a>(kind: AlertKind, facilities: &'a [FacilityMatch]) -> TemplateInput<'a> {
        TemplateInput {
            kind,
            patient_name: "Ana Díaz",
            contact_name: "Luis Díaz",
            location: Some(Geolocation::new(4.6097, -74.0817).unwrap()),
            message: Some("chest pain"),
            accessor_name: Some("Dr. Rojas"),
            facilities,
        }
    }

    #[test]
    fn panic_sms_carries_map_link_and_nearest_facility() {
        let facilities = matches(2);
        let body = sms_body(&input(AlertKind::Panic, &facilities));
        assert!(body.contains("Ana Díaz"));
        assert!(body.contains("https://maps.google.com/?q=4.6097,-74.0817"));
        assert!(body.contains("Hospital 0"));
        assert!(body.contains("chest pain"));
    }

    #[test]
    fn access_sms_names_the_accessor() {
        let body = sms_body(&input(AlertKind::Access, &[]));
        assert!(body.contains("Dr. Rojas"));
        assert!(body.contains("https://maps.google.com/?q="));
        assert!(!body.contains("Nearest facility"));
    }

    #[test]
    fn email_lists_at_most_three_facilities_with_phones() {
        let facilities = matches(5);
        let body = email_body(&input(AlertKind::Panic, &facilities));
        assert!(body.contains("Hospital 0"));
        assert!(body.contains("Hospital 2"));
        assert!(!body.contains("Hospital 3"));
        assert!(body.contains("+57 601 555 0100"));
    }
}
