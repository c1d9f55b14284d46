//! HVAC vocabulary of the host framework and its ZCL lookup tables

use serde::{Deserialize, Serialize};
use zigbee_core::{ControlSequenceOfOperation, RunningMode, SystemMode};

/// Operating mode of a climate entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    Off,
    Heat,
    Cool,
    HeatCool,
    Auto,
    Dry,
    FanOnly,
}

impl HvacMode {
    #[must_use] pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Off => "off",
            HvacMode::Heat => "heat",
            HvacMode::Cool => "cool",
            HvacMode::HeatCool => "heat_cool",
            HvacMode::Auto => "auto",
            HvacMode::Dry => "dry",
            HvacMode::FanOnly => "fan_only",
        }
    }
}

impl std::fmt::Display for HvacMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the device is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacAction {
    Off,
    Heating,
    Cooling,
    Drying,
    Idle,
    Fan,
}

/// Preset modes known to the entity layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    None,
    Away,
    Boost,
    Comfort,
    Eco,
    Schedule,
    Complex,
    TempManual,
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Preset::None => "none",
            Preset::Away => "away",
            Preset::Boost => "boost",
            Preset::Comfort => "comfort",
            Preset::Eco => "eco",
            Preset::Schedule => "schedule",
            Preset::Complex => "complex",
            Preset::TempManual => "temp_manual",
        };
        f.write_str(name)
    }
}

/// Fan modes offered to the host framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanSetting {
    Auto,
    On,
}

/// Translate a device `system_mode` to an HVAC mode.
///
/// Several system modes collapse onto the same HVAC mode, so this is not
/// the inverse of [`hvac_to_system_mode`].
#[must_use] pub fn system_mode_to_hvac(mode: SystemMode) -> HvacMode {
    match mode {
        SystemMode::Off => HvacMode::Off,
        SystemMode::Auto => HvacMode::Auto,
        SystemMode::Cool => HvacMode::Cool,
        SystemMode::Heat => HvacMode::Heat,
        SystemMode::EmergencyHeating => HvacMode::Heat,
        // Unverified against vendor documentation: precooling may not be
        // plain cooling
        SystemMode::PreCooling => HvacMode::Cool,
        SystemMode::FanOnly => HvacMode::FanOnly,
        SystemMode::Dry => HvacMode::Dry,
        // Unverified against vendor documentation
        SystemMode::Sleep => HvacMode::Off,
    }
}

/// Translate a raw `system_mode` register value, `None` when outside the table
#[must_use] pub fn hvac_mode_from_raw(raw: u8) -> Option<HvacMode> {
    SystemMode::try_from(raw).ok().map(system_mode_to_hvac)
}

/// System mode to write for a requested HVAC mode
#[must_use] pub fn hvac_to_system_mode(mode: HvacMode) -> SystemMode {
    match mode {
        HvacMode::Off => SystemMode::Off,
        HvacMode::HeatCool => SystemMode::Auto,
        HvacMode::Auto => SystemMode::Auto,
        HvacMode::Cool => SystemMode::Cool,
        HvacMode::Heat => SystemMode::Heat,
        HvacMode::FanOnly => SystemMode::FanOnly,
        HvacMode::Dry => SystemMode::Dry,
    }
}

/// Diagnostic rendering of a raw `system_mode`, e.g. `[SystemMode.Heat]/heat`
#[must_use] pub fn system_mode_label(raw: u8) -> String {
    match SystemMode::try_from(raw) {
        Ok(mode) => format!("[{mode}]/{}", system_mode_to_hvac(mode)),
        Err(raw) => format!("[{raw}]/unknown"),
    }
}

/// Translate a raw `running_mode` register value
#[must_use] pub fn running_mode_to_hvac(raw: u8) -> Option<HvacMode> {
    match RunningMode::try_from(raw).ok()? {
        RunningMode::Off => Some(HvacMode::Off),
        RunningMode::Cool => Some(HvacMode::Cool),
        RunningMode::Heat => Some(HvacMode::Heat),
    }
}

/// Supported HVAC modes implied by `ctrl_sequence_of_oper`
#[must_use] pub fn seq_of_operation_modes(raw: Option<u8>) -> Vec<HvacMode> {
    use ControlSequenceOfOperation as Seq;

    let Some(seq) = raw.and_then(|r| Seq::try_from(r).ok()) else {
        return vec![HvacMode::Off];
    };

    match seq {
        Seq::CoolingOnly | Seq::CoolingWithReheat => vec![HvacMode::Off, HvacMode::Cool],
        Seq::HeatingOnly | Seq::HeatingWithReheat => vec![HvacMode::Off, HvacMode::Heat],
        Seq::CoolingAndHeating4Pipes | Seq::CoolingAndHeating4PipesWithReheat => vec![
            HvacMode::Off,
            HvacMode::HeatCool,
            HvacMode::Cool,
            HvacMode::Heat,
        ],
        Seq::CentraliteCoolHeatOff => vec![HvacMode::Cool, HvacMode::Heat, HvacMode::Off],
        Seq::CentraliteHeatCoolOff => vec![HvacMode::HeatCool, HvacMode::Off],
    }
}
