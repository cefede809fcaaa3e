//! YAML client configuration.

use std::path::Path;

use scr_driver::{PolicyKind, RuleBasedConfig};
use scr_recorder::RecorderConfig;
use scr_session::{SessionConfig, TransportConfig};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub policy: PolicyKind,
    pub rule_based: RuleBasedConfig,
}

/// Everything the client needs to start a session. Every section is optional
/// in the YAML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub session: SessionConfig,
    pub transport: TransportConfig,
    pub driver: DriverConfig,
    pub recorder: RecorderConfig,
}

impl ClientConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ClientError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            ClientError::InvalidConfiguration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.session.bot_id.trim().is_empty() {
            return Err(ClientError::InvalidConfiguration(
                "bot id must not be empty".to_string(),
            ));
        }
        if self.session.receive_buffer_bytes == 0 {
            return Err(ClientError::InvalidConfiguration(
                "receive buffer must hold at least one byte".to_string(),
            ));
        }
        if self.transport.host.trim().is_empty() {
            return Err(ClientError::InvalidConfiguration(
                "host must not be empty".to_string(),
            ));
        }
        if self.transport.port == 0 {
            return Err(ClientError::InvalidConfiguration(
                "port must be non-zero".to_string(),
            ));
        }
        let rules = &self.driver.rule_based;
        if !(rules.steer_lock.is_finite() && rules.steer_lock > 0.0) {
            return Err(ClientError::InvalidConfiguration(format!(
                "steer_lock must be positive, got {}",
                rules.steer_lock
            )));
        }
        if !rules.target_speed.is_finite() {
            return Err(ClientError::InvalidConfiguration(format!(
                "target_speed must be finite, got {}",
                rules.target_speed
            )));
        }
        Ok(())
    }
}
