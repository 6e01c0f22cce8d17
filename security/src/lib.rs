// security/src/lib.rs
//
// Credential vault: authenticated encryption for the sensitive fields of a
// patient record. Stateless; every error is fatal to the calling operation,
// a corrupted ciphertext is never treated as empty data.

pub mod vault;

pub use vault::CredentialVault;
