// notifications_service/src/lib.rs
//
// Alert dispatcher: fans a panic or access alert out to a patient's
// emergency contacts across SMS, email and real-time channels, collecting a
// per-contact, per-channel outcome instead of propagating failures.

pub mod channels;
pub mod dispatcher;
pub mod templates;

pub use channels::{
    ContactDirectory, EmailMessage, EmailProvider, EventPublisher, RealtimeEvent, SmsMessage,
    SmsProvider,
};
pub use dispatcher::{AlertContext, AlertDispatcher, DispatchConfig};
