//! Matching Zigbee devices to thermostat quirks

use crate::error::ClimateError;
use crate::persistence;
use crate::quirks::ThermostatQuirks;
use serde::{Deserialize, Serialize};
use std::path::Path;
use zigbee_core::ZigbeeDevice;

/// Manufacturer string reported by NAMRON thermostats
pub const NAMRON_MANUFACTURER: &str = "NAMRON AS";

/// Strict match rule: the device manufacturer must be listed, and when
/// `models` is non-empty the model must be listed too
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuirkRule {
    pub manufacturers: Vec<String>,
    #[serde(default)]
    pub models: Vec<String>,
    pub quirks: ThermostatQuirks,
}

impl QuirkRule {
    #[must_use] pub fn matches(&self, device: &ZigbeeDevice) -> bool {
        let Some(manufacturer) = device.manufacturer.as_deref() else {
            return false;
        };
        if !self.manufacturers.iter().any(|m| m == manufacturer) {
            return false;
        }
        self.models.is_empty()
            || device
                .model
                .as_deref()
                .is_some_and(|model| self.models.iter().any(|m| m == model))
    }
}

/// Ordered set of quirk rules with a generic fallback.
///
/// User rules are checked first, newest first, then the built-ins.
#[derive(Debug, Clone)]
pub struct QuirkRegistry {
    user_rules: Vec<QuirkRule>,
    builtin: Vec<QuirkRule>,
    fallback: ThermostatQuirks,
}

impl QuirkRegistry {
    /// Registry with the built-in rules
    #[must_use] pub fn new() -> Self {
        Self {
            user_rules: Vec::new(),
            builtin: vec![QuirkRule {
                manufacturers: vec![NAMRON_MANUFACTURER.to_string()],
                models: Vec::new(),
                quirks: ThermostatQuirks::namron(),
            }],
            fallback: ThermostatQuirks::generic(),
        }
    }

    /// Registry with user rules from a JSON file, in file order
    pub async fn load(path: &Path) -> Self {
        let mut registry = Self::new();
        registry.user_rules = persistence::load_list::<QuirkRule>(path, "quirk rules").await;
        registry
    }

    /// Write the user rules back in precedence order
    pub async fn save(&self, path: &Path) -> Result<(), ClimateError> {
        persistence::save_list(path, &self.user_rules).await
    }

    /// Add a rule ahead of every existing one
    pub fn register(&mut self, rule: QuirkRule) {
        tracing::debug!(
            "Registering {} quirks for {:?}",
            rule.quirks.name,
            rule.manufacturers
        );
        self.user_rules.insert(0, rule);
    }

    /// Quirks for a device, `None` when it has no Thermostat server cluster
    #[must_use] pub fn match_device(&self, device: &ZigbeeDevice) -> Option<&ThermostatQuirks> {
        device.thermostat_endpoint()?;
        let quirks = self
            .user_rules
            .iter()
            .chain(&self.builtin)
            .find(|rule| rule.matches(device))
            .map_or(&self.fallback, |rule| &rule.quirks);
        Some(quirks)
    }

    /// Registered rules, excluding the built-ins
    #[must_use] pub fn user_rules(&self) -> &[QuirkRule] {
        &self.user_rules
    }
}

impl Default for QuirkRegistry {
    fn default() -> Self {
        Self::new()
    }
}
