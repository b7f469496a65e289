use std::time::Duration;

use serde::Deserialize;

use crate::types::DisplayUnits;

/// Platform configuration block.
///
/// ```json
/// { "name": "Hallway", "email": "...", "password": "...",
///   "interval": 10, "displayUnits": "F" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_interval", rename = "interval")]
    pub interval_secs: u64,
    #[serde(default, rename = "displayUnits")]
    pub display_units: DisplayUnits,
}

fn default_name() -> String {
    "Hx3 Thermostat".to_string()
}

fn default_interval() -> u64 {
    10
}

impl BridgeConfig {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
