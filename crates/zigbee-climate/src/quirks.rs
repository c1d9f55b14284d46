//! Per-device deviations from the generic thermostat entity

use crate::mode::{HvacMode, Preset};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Features a climate entity advertises to the host framework
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClimateEntityFeature: u32 {
        const TARGET_TEMPERATURE = 1 << 0;
        const TARGET_TEMPERATURE_RANGE = 1 << 1;
        const TARGET_HUMIDITY = 1 << 2;
        const FAN_MODE = 1 << 3;
        const PRESET_MODE = 1 << 4;
        const SWING_MODE = 1 << 5;
        const AUX_HEAT = 1 << 6;
    }
}

impl Default for ClimateEntityFeature {
    fn default() -> Self {
        Self::TARGET_TEMPERATURE
    }
}

/// Which register the entity reports as its current temperature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentTemperatureSource {
    #[default]
    Local,
    /// The outdoor register, used by floor heating thermostats that wire
    /// their floor probe to it
    Outdoor,
}

/// Device quirks consumed by [`crate::Thermostat`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermostatQuirks {
    /// Label used in logs
    pub name: String,
    /// Fixed mode list; derived from `ctrl_sequence_of_oper` when unset
    #[serde(default)]
    pub hvac_modes: Option<Vec<HvacMode>>,
    /// Base feature flags, serialized as the raw bitmask
    #[serde(default, with = "feature_bits")]
    pub supported_features: ClimateEntityFeature,
    #[serde(default)]
    pub preset_modes: Vec<Preset>,
    #[serde(default)]
    pub current_temperature: CurrentTemperatureSource,
}

impl ThermostatQuirks {
    /// Plain ZCL thermostat
    #[must_use] pub fn generic() -> Self {
        Self {
            name: "zcl".to_string(),
            hvac_modes: None,
            supported_features: ClimateEntityFeature::TARGET_TEMPERATURE,
            preset_modes: Vec::new(),
            current_temperature: CurrentTemperatureSource::Local,
        }
    }

    /// NAMRON floor heating thermostat
    #[must_use] pub fn namron() -> Self {
        Self {
            name: "namron".to_string(),
            hvac_modes: Some(vec![
                HvacMode::Auto,
                HvacMode::Heat,
                HvacMode::Dry,
                HvacMode::Off,
            ]),
            supported_features: ClimateEntityFeature::TARGET_TEMPERATURE,
            preset_modes: Vec::new(),
            current_temperature: CurrentTemperatureSource::Outdoor,
        }
    }
}

impl Default for ThermostatQuirks {
    fn default() -> Self {
        Self::generic()
    }
}

mod feature_bits {
    use super::ClimateEntityFeature;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        features: &ClimateEntityFeature,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(features.bits())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<ClimateEntityFeature, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(ClimateEntityFeature::from_bits_truncate(bits))
    }
}
