// emergency/src/lib.rs
//
// Core of the emergency medical access system. Wires the credential vault,
// geomatch engine, alert dispatcher and audit recorder behind two operations
// surfaces: the QR access broker (third-party scans) and the panic alert
// state machine (patient-initiated broadcasts). Every collaborator is
// injected as a trait reference; nothing here holds global state.

pub mod access;
pub mod config;
pub mod panic;
pub mod profile;
pub mod service;
pub mod storage;
pub mod telemetry;

pub use access::{AccessBroker, DispatchTask, InitiatedAccess, VerifyOutcome};
pub use config::{EmergencyConfig, GeomatchDefaults, ResolutionPolicy};
pub use panic::{PanicAlertMachine, PanicOutcome};
pub use service::{ActivatePanicRequest, EmergencyService, InitiateAccessRequest, ServiceDeps};
pub use storage::{
    AlertStore, ContactStore, GrantStore, InMemoryAlertStore, InMemoryContactStore,
    InMemoryGrantStore, InMemoryPatientStore, PatientStore,
};
