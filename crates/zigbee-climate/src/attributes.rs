//! Cached Thermostat cluster attributes

use serde::{Deserialize, Serialize};
use zigbee_core::cluster::thermostat_attrs;
use zigbee_core::RunningState;

// Diagnostic attribute keys
pub const ATTR_SYS_MODE: &str = "system_mode";
pub const ATTR_RUNNING_MODE: &str = "running_mode";
pub const ATTR_OCCUPANCY: &str = "occupancy";
pub const ATTR_PI_COOLING_DEMAND: &str = "pi_cooling_demand";
pub const ATTR_PI_HEATING_DEMAND: &str = "pi_heating_demand";
pub const ATTR_OCCP_COOL_SETPT: &str = "occupied_cooling_setpoint";
pub const ATTR_OCCP_HEAT_SETPT: &str = "occupied_heating_setpoint";
pub const ATTR_UNOCCP_COOL_SETPT: &str = "unoccupied_cooling_setpoint";
pub const ATTR_UNOCCP_HEAT_SETPT: &str = "unoccupied_heating_setpoint";

/// Snapshot of the attribute cache kept by the thermostat channel.
///
/// Temperatures are ZCL int16 values in hundredths of a degree. Every
/// field is `None` until the device has reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermostatAttributes {
    pub local_temperature: Option<i16>,
    pub outdoor_temperature: Option<i16>,
    pub occupancy: Option<u8>,
    pub pi_cooling_demand: Option<u8>,
    pub pi_heating_demand: Option<u8>,
    pub occupied_cooling_setpoint: Option<i16>,
    pub occupied_heating_setpoint: Option<i16>,
    pub unoccupied_cooling_setpoint: Option<i16>,
    pub unoccupied_heating_setpoint: Option<i16>,
    pub min_heat_setpoint_limit: Option<i16>,
    pub max_heat_setpoint_limit: Option<i16>,
    pub min_cool_setpoint_limit: Option<i16>,
    pub max_cool_setpoint_limit: Option<i16>,
    pub ctrl_sequence_of_oper: Option<u8>,
    pub system_mode: Option<u8>,
    pub running_mode: Option<u8>,
    pub running_state: Option<u16>,
}

impl ThermostatAttributes {
    /// `running_state` as a bitmap, unknown bits dropped
    #[must_use] pub fn running_state(&self) -> Option<RunningState> {
        self.running_state.map(RunningState::from_bits_truncate)
    }

    /// Store a reported value. Values that do not fit the attribute's
    /// ZCL type clear it.
    pub fn apply(&mut self, attr: ThermostatAttribute, value: Option<i64>) {
        fn fit<T: TryFrom<i64>>(value: Option<i64>) -> Option<T> {
            value.and_then(|v| T::try_from(v).ok())
        }

        use ThermostatAttribute as A;
        match attr {
            A::LocalTemperature => self.local_temperature = fit(value),
            A::OutdoorTemperature => self.outdoor_temperature = fit(value),
            A::Occupancy => self.occupancy = fit(value),
            A::PiCoolingDemand => self.pi_cooling_demand = fit(value),
            A::PiHeatingDemand => self.pi_heating_demand = fit(value),
            A::OccupiedCoolingSetpoint => self.occupied_cooling_setpoint = fit(value),
            A::OccupiedHeatingSetpoint => self.occupied_heating_setpoint = fit(value),
            A::UnoccupiedCoolingSetpoint => self.unoccupied_cooling_setpoint = fit(value),
            A::UnoccupiedHeatingSetpoint => self.unoccupied_heating_setpoint = fit(value),
            A::MinHeatSetpointLimit => self.min_heat_setpoint_limit = fit(value),
            A::MaxHeatSetpointLimit => self.max_heat_setpoint_limit = fit(value),
            A::MinCoolSetpointLimit => self.min_cool_setpoint_limit = fit(value),
            A::MaxCoolSetpointLimit => self.max_cool_setpoint_limit = fit(value),
            A::CtrlSequenceOfOper => self.ctrl_sequence_of_oper = fit(value),
            A::SystemMode => self.system_mode = fit(value),
            A::RunningMode => self.running_mode = fit(value),
            A::RunningState => self.running_state = fit(value),
        }
    }
}

/// Thermostat cluster attributes tracked by the entity layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermostatAttribute {
    LocalTemperature,
    OutdoorTemperature,
    Occupancy,
    PiCoolingDemand,
    PiHeatingDemand,
    OccupiedCoolingSetpoint,
    OccupiedHeatingSetpoint,
    UnoccupiedCoolingSetpoint,
    UnoccupiedHeatingSetpoint,
    MinHeatSetpointLimit,
    MaxHeatSetpointLimit,
    MinCoolSetpointLimit,
    MaxCoolSetpointLimit,
    CtrlSequenceOfOper,
    SystemMode,
    RunningMode,
    RunningState,
}

impl ThermostatAttribute {
    /// ZCL attribute ID within the Thermostat cluster
    #[must_use] pub fn id(&self) -> u16 {
        use ThermostatAttribute as A;
        match self {
            A::LocalTemperature => thermostat_attrs::LOCAL_TEMPERATURE,
            A::OutdoorTemperature => thermostat_attrs::OUTDOOR_TEMPERATURE,
            A::Occupancy => thermostat_attrs::OCCUPANCY,
            A::PiCoolingDemand => thermostat_attrs::PI_COOLING_DEMAND,
            A::PiHeatingDemand => thermostat_attrs::PI_HEATING_DEMAND,
            A::OccupiedCoolingSetpoint => thermostat_attrs::OCCUPIED_COOLING_SETPOINT,
            A::OccupiedHeatingSetpoint => thermostat_attrs::OCCUPIED_HEATING_SETPOINT,
            A::UnoccupiedCoolingSetpoint => thermostat_attrs::UNOCCUPIED_COOLING_SETPOINT,
            A::UnoccupiedHeatingSetpoint => thermostat_attrs::UNOCCUPIED_HEATING_SETPOINT,
            A::MinHeatSetpointLimit => thermostat_attrs::MIN_HEAT_SETPOINT_LIMIT,
            A::MaxHeatSetpointLimit => thermostat_attrs::MAX_HEAT_SETPOINT_LIMIT,
            A::MinCoolSetpointLimit => thermostat_attrs::MIN_COOL_SETPOINT_LIMIT,
            A::MaxCoolSetpointLimit => thermostat_attrs::MAX_COOL_SETPOINT_LIMIT,
            A::CtrlSequenceOfOper => thermostat_attrs::CTRL_SEQUENCE_OF_OPER,
            A::SystemMode => thermostat_attrs::SYSTEM_MODE,
            A::RunningMode => thermostat_attrs::RUNNING_MODE,
            A::RunningState => thermostat_attrs::RUNNING_STATE,
        }
    }

    /// Attribute name as reported by the cluster
    #[must_use] pub fn name(&self) -> &'static str {
        use ThermostatAttribute as A;
        match self {
            A::LocalTemperature => "local_temperature",
            A::OutdoorTemperature => "outdoor_temperature",
            A::Occupancy => ATTR_OCCUPANCY,
            A::PiCoolingDemand => ATTR_PI_COOLING_DEMAND,
            A::PiHeatingDemand => ATTR_PI_HEATING_DEMAND,
            A::OccupiedCoolingSetpoint => ATTR_OCCP_COOL_SETPT,
            A::OccupiedHeatingSetpoint => ATTR_OCCP_HEAT_SETPT,
            A::UnoccupiedCoolingSetpoint => ATTR_UNOCCP_COOL_SETPT,
            A::UnoccupiedHeatingSetpoint => ATTR_UNOCCP_HEAT_SETPT,
            A::MinHeatSetpointLimit => "min_heat_setpoint_limit",
            A::MaxHeatSetpointLimit => "max_heat_setpoint_limit",
            A::MinCoolSetpointLimit => "min_cool_setpoint_limit",
            A::MaxCoolSetpointLimit => "max_cool_setpoint_limit",
            A::CtrlSequenceOfOper => "ctrl_sequence_of_oper",
            A::SystemMode => ATTR_SYS_MODE,
            A::RunningMode => ATTR_RUNNING_MODE,
            A::RunningState => "running_state",
        }
    }

    /// An occupied setpoint report can hint at an occupancy change
    #[must_use] pub fn is_occupied_setpoint(&self) -> bool {
        matches!(
            self,
            ThermostatAttribute::OccupiedCoolingSetpoint
                | ThermostatAttribute::OccupiedHeatingSetpoint
        )
    }
}

impl std::fmt::Display for ThermostatAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
