// geomatch_service/src/conditions.rs
//
// Static condition-to-specialty policy. Fixed, hard-coded constants; a
// data-driven table is deferred until a requirement for it exists.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

/// Every condition-based query requires the baseline emergency specialty on
/// top of whatever the conditions map to.
pub const BASELINE_SPECIALTY: &str = "emergency";

/// Conditions whose presence unlocks the ICU/trauma criticality bonuses.
pub const CRITICAL_CONDITIONS: [&str; 4] = ["heart attack", "stroke", "major trauma", "burns"];

static CONDITION_SPECIALTIES: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        m.insert("heart attack", &["cardiology"]);
        m.insert("heart disease", &["cardiology"]);
        m.insert("hypertension", &["cardiology"]);
        m.insert("stroke", &["neurology"]);
        m.insert("epilepsy", &["neurology"]);
        m.insert("seizure", &["neurology"]);
        m.insert("diabetes", &["endocrinology"]);
        m.insert("asthma", &["pulmonology"]);
        m.insert("copd", &["pulmonology"]);
        m.insert("major trauma", &["trauma surgery"]);
        m.insert("burns", &["burn unit"]);
        m.insert("kidney failure", &["nephrology"]);
        m.insert("anaphylaxis", &["allergology"]);
        m.insert("pregnancy", &["obstetrics"]);
        m.insert("cancer", &["oncology"]);
        m.insert("hemophilia", &["hematology"]);
        m.insert("psychiatric crisis", &["psychiatry"]);
        m.insert("fracture", &["orthopedics"]);
        m
    });

/// Specialties required to treat the given conditions: the union of every
/// known condition's specialties plus the baseline. Unknown conditions
/// contribute nothing beyond the baseline.
pub fn required_specialties(conditions: &[String]) -> HashSet<String> {
    let mut required = HashSet::new();
    required.insert(BASELINE_SPECIALTY.to_string());
    for condition in conditions {
        if let Some(specialties) = CONDITION_SPECIALTIES.get(condition.trim().to_lowercase().as_str())
        {
            for s in specialties.iter() {
                required.insert((*s).to_string());
            }
        }
    }
    required
}

pub fn any_critical(conditions: &[String]) -> bool {
    conditions.iter().any(|c| {
        let c = c.trim().to_lowercase();
        CRITICAL_CONDITIONS.contains(&c.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_is_always_required() {
        let required = required_specialties(&[]);
        assert_eq!(required.len(), 1);
        assert!(required.contains(BASELINE_SPECIALTY));
    }

    #[test]
    fn known_conditions_add_specialties_case_insensitively() {
        let required = required_specialties(&["Diabetes".to_string(), "STROKE".to_string()]);
        assert!(required.contains("endocrinology"));
        assert!(required.contains("neurology"));
        assert!(required.contains(BASELINE_SPECIALTY));
        assert_eq!(required.len(), 3);
    }

    #[test]
    fn unknown_condition_contributes_nothing() {
        let required = required_specialties(&["unmapped syndrome".to_string()]);
        assert_eq!(required.len(), 1);
    }

    #[test]
    fn criticality_detection() {
        assert!(any_critical(&["Heart Attack".to_string()]));
        assert!(any_critical(&["diabetes".to_string(), "burns".to_string()]));
        assert!(!any_critical(&["diabetes".to_string()]));
        assert!(!any_critical(&[]));
    }
}
