// emergency/src/profile.rs
//
// Read/write of the encrypted medical fields through the credential vault.
// A decrypt failure here is always fatal to the calling operation: a
// corrupted field is never served as empty data.

use models::errors::Result;
use models::patient::{MedicalInfo, PatientRecord};
use security::CredentialVault;

/// Decrypts every present medical field of a patient record.
pub fn decrypt_medical(vault: &CredentialVault, patient: &PatientRecord) -> Result<MedicalInfo> {
    let blood_type = match &patient.blood_type_enc {
        Some(enc) => Some(vault.decrypt(enc)?),
        None => None,
    };
    Ok(MedicalInfo {
        blood_type,
        allergies: decrypt_list(vault, patient.allergies_enc.as_deref())?,
        conditions: decrypt_list(vault, patient.conditions_enc.as_deref())?,
        medications: decrypt_list(vault, patient.medications_enc.as_deref())?,
    })
}

/// Seals a plaintext medical profile into the record's encrypted fields.
/// Empty lists and a missing blood type clear the corresponding field.
pub fn apply_medical(
    vault: &CredentialVault,
    patient: &mut PatientRecord,
    info: &MedicalInfo,
) -> Result<()> {
    patient.blood_type_enc = match &info.blood_type {
        Some(bt) => Some(vault.encrypt(bt)?),
        None => None,
    };
    patient.allergies_enc = seal_list(vault, &info.allergies)?;
    patient.conditions_enc = seal_list(vault, &info.conditions)?;
    patient.medications_enc = seal_list(vault, &info.medications)?;
    Ok(())
}

fn decrypt_list(vault: &CredentialVault, field: Option<&str>) -> Result<Vec<String>> {
    match field {
        Some(enc) => vault.decrypt_value(enc),
        None => Ok(Vec::new()),
    }
}

fn seal_list(vault: &CredentialVault, items: &[String]) -> Result<Option<String>> {
    if items.is_empty() {
        Ok(None)
    } else {
        Ok(Some(vault.encrypt_value(&items.to_vec())?))
    }
}
