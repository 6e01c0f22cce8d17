// emergency/src/config.rs
//
// Process configuration, loaded from TOML with an environment override for
// the key material so it never has to live in a file.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use models::errors::{EmergencyError, Result};
use notifications_service::DispatchConfig;

pub const ENCRYPTION_KEY_ENV: &str = "EMERGENCY_ENCRYPTION_KEY";

/// How alerts leave the ACTIVE state besides patient cancellation. There is
/// no in-core scheduler either way: `resolve` is the administrative path and
/// `expire_due` the hook an external scheduler calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Only administrative `resolve` calls end an alert.
    Manual,
    /// Only the time-based sweep expires alerts.
    AutoExpire { after_minutes: i64 },
    /// Both paths are allowed.
    Both { after_minutes: i64 },
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        ResolutionPolicy::Manual
    }
}

impl ResolutionPolicy {
    pub fn allows_manual_resolve(&self) -> bool {
        matches!(self, ResolutionPolicy::Manual | ResolutionPolicy::Both { .. })
    }

    pub fn auto_expiry_minutes(&self) -> Option<i64> {
        match self {
            ResolutionPolicy::AutoExpire { after_minutes }
            | ResolutionPolicy::Both { after_minutes } => Some(*after_minutes),
            ResolutionPolicy::Manual => None,
        }
    }
}

/// Default search window for facility matching.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeomatchDefaults {
    pub radius_km: f64,
    pub limit: usize,
}

impl Default for GeomatchDefaults {
    fn default() -> Self {
        GeomatchDefaults {
            radius_km: 25.0,
            limit: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyConfig {
    /// Hex-encoded 256-bit vault key. `EMERGENCY_ENCRYPTION_KEY` overrides it.
    #[serde(default)]
    pub encryption_key: Option<String>,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub resolution: ResolutionPolicy,
    #[serde(default)]
    pub geomatch: GeomatchDefaults,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        EmergencyConfig {
            encryption_key: None,
            dispatch: DispatchConfig::default(),
            resolution: ResolutionPolicy::default(),
            geomatch: GeomatchDefaults::default(),
        }
    }
}

impl EmergencyConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| EmergencyError::Config(format!("invalid config: {}", e)))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EmergencyError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// The effective vault key: environment first, then the config file.
    pub fn encryption_key(&self) -> Result<String> {
        if let Ok(key) = env::var(ENCRYPTION_KEY_ENV) {
            if !key.is_empty() {
                return Ok(key);
            }
        }
        self.encryption_key.clone().ok_or_else(|| {
            EmergencyError::Config(format!(
                "no encryption key: set {} or the encryption_key config field",
                ENCRYPTION_KEY_ENV
            ))
        })
    }
}
