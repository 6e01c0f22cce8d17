// models/src/lib.rs
//
// Shared domain types for the emergency access core. Every service crate
// depends on this one; it depends on nothing but the serialization stack.

pub mod access;
pub mod audit;
pub mod contact;
pub mod dispatch;
pub mod errors;
pub mod facility;
pub mod geo;
pub mod panic_alert;
pub mod patient;

pub use access::{AccessGrant, AccessorInfo};
pub use audit::AuditEvent;
pub use contact::EmergencyContact;
pub use dispatch::{AlertKind, ChannelOutcome, ContactDeliveryResult, DeliveryStatus};
pub use errors::{EmergencyError, Result};
pub use facility::{AttentionTier, Facility};
pub use geo::Geolocation;
pub use panic_alert::{ContactDeliverySnapshot, FacilitySnapshot, PanicAlert, PanicStatus};
pub use patient::{MedicalInfo, PatientRecord};
