//! ZCL (Zigbee Cluster Library) definitions for the HVAC clusters

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// ZCL cluster IDs used by climate devices
pub mod id {
    pub const BASIC: u16 = 0x0000;

    // HVAC Clusters
    pub const THERMOSTAT: u16 = 0x0201;
    pub const FAN_CONTROL: u16 = 0x0202;
}

/// Thermostat cluster attributes
pub mod thermostat_attrs {
    pub const LOCAL_TEMPERATURE: u16 = 0x0000;
    pub const OUTDOOR_TEMPERATURE: u16 = 0x0001;
    pub const OCCUPANCY: u16 = 0x0002;
    pub const PI_COOLING_DEMAND: u16 = 0x0007;
    pub const PI_HEATING_DEMAND: u16 = 0x0008;
    pub const OCCUPIED_COOLING_SETPOINT: u16 = 0x0011;
    pub const OCCUPIED_HEATING_SETPOINT: u16 = 0x0012;
    pub const UNOCCUPIED_COOLING_SETPOINT: u16 = 0x0013;
    pub const UNOCCUPIED_HEATING_SETPOINT: u16 = 0x0014;
    pub const MIN_HEAT_SETPOINT_LIMIT: u16 = 0x0015;
    pub const MAX_HEAT_SETPOINT_LIMIT: u16 = 0x0016;
    pub const MIN_COOL_SETPOINT_LIMIT: u16 = 0x0017;
    pub const MAX_COOL_SETPOINT_LIMIT: u16 = 0x0018;
    pub const CTRL_SEQUENCE_OF_OPER: u16 = 0x001B;
    pub const SYSTEM_MODE: u16 = 0x001C;
    pub const RUNNING_MODE: u16 = 0x001E;
    pub const RUNNING_STATE: u16 = 0x0029;
}

/// Thermostat `system_mode` attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SystemMode {
    Off = 0x00,
    Auto = 0x01,
    Cool = 0x03,
    Heat = 0x04,
    EmergencyHeating = 0x05,
    PreCooling = 0x06,
    FanOnly = 0x07,
    Dry = 0x08,
    Sleep = 0x09,
}

impl TryFrom<u8> for SystemMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(SystemMode::Off),
            0x01 => Ok(SystemMode::Auto),
            0x03 => Ok(SystemMode::Cool),
            0x04 => Ok(SystemMode::Heat),
            0x05 => Ok(SystemMode::EmergencyHeating),
            0x06 => Ok(SystemMode::PreCooling),
            0x07 => Ok(SystemMode::FanOnly),
            0x08 => Ok(SystemMode::Dry),
            0x09 => Ok(SystemMode::Sleep),
            _ => Err(value),
        }
    }
}

impl std::fmt::Display for SystemMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SystemMode::Off => "Off",
            SystemMode::Auto => "Auto",
            SystemMode::Cool => "Cool",
            SystemMode::Heat => "Heat",
            SystemMode::EmergencyHeating => "Emergency_Heating",
            SystemMode::PreCooling => "Pre_cooling",
            SystemMode::FanOnly => "Fan_only",
            SystemMode::Dry => "Dry",
            SystemMode::Sleep => "Sleep",
        };
        write!(f, "SystemMode.{name}")
    }
}

bitflags! {
    /// Thermostat `running_state` bitmap
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RunningState: u16 {
        /// ZCL defines idle as the empty mask
        const IDLE = 0x0000;
        const HEAT_STATE_ON = 0x0001;
        const COOL_STATE_ON = 0x0002;
        const FAN_STATE_ON = 0x0004;
        const HEAT_2ND_STAGE_ON = 0x0008;
        const COOL_2ND_STAGE_ON = 0x0010;
        const FAN_2ND_STAGE_ON = 0x0020;
        const FAN_3RD_STAGE_ON = 0x0040;
    }
}

impl RunningState {
    /// Any heating stage
    pub const HEATING: Self = Self::HEAT_STATE_ON.union(Self::HEAT_2ND_STAGE_ON);
    /// Any cooling stage
    pub const COOLING: Self = Self::COOL_STATE_ON.union(Self::COOL_2ND_STAGE_ON);
    /// Any fan stage
    pub const FAN: Self = Self::FAN_STATE_ON
        .union(Self::FAN_2ND_STAGE_ON)
        .union(Self::FAN_3RD_STAGE_ON);
}

/// Thermostat `running_mode` attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunningMode {
    Off = 0x00,
    Cool = 0x03,
    Heat = 0x04,
}

impl TryFrom<u8> for RunningMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(RunningMode::Off),
            0x03 => Ok(RunningMode::Cool),
            0x04 => Ok(RunningMode::Heat),
            _ => Err(value),
        }
    }
}

/// Thermostat `ctrl_sequence_of_oper` attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlSequenceOfOperation {
    CoolingOnly = 0x00,
    CoolingWithReheat = 0x01,
    HeatingOnly = 0x02,
    HeatingWithReheat = 0x03,
    CoolingAndHeating4Pipes = 0x04,
    CoolingAndHeating4PipesWithReheat = 0x05,
    // Centralite specific
    CentraliteCoolHeatOff = 0x06,
    CentraliteHeatCoolOff = 0x07,
}

impl TryFrom<u8> for ControlSequenceOfOperation {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(Self::CoolingOnly),
            0x01 => Ok(Self::CoolingWithReheat),
            0x02 => Ok(Self::HeatingOnly),
            0x03 => Ok(Self::HeatingWithReheat),
            0x04 => Ok(Self::CoolingAndHeating4Pipes),
            0x05 => Ok(Self::CoolingAndHeating4PipesWithReheat),
            0x06 => Ok(Self::CentraliteCoolHeatOff),
            0x07 => Ok(Self::CentraliteHeatCoolOff),
            _ => Err(value),
        }
    }
}

/// Fan Control cluster `fan_mode` attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FanMode {
    Off = 0x00,
    Low = 0x01,
    Medium = 0x02,
    High = 0x03,
    On = 0x04,
    Auto = 0x05,
    Smart = 0x06,
}
