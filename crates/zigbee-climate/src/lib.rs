//! Zigbee climate entities
//!
//! Maps Thermostat cluster attributes onto climate entity state and turns
//! entity commands back into cluster writes, with per-vendor quirks such
//! as the NAMRON floor heating thermostat.

pub mod attributes;
pub mod channel;
pub mod error;
pub mod mode;
pub mod persistence;
pub mod quirks;
pub mod registry;
pub mod thermostat;

pub use attributes::{ThermostatAttribute, ThermostatAttributes};
pub use channel::{ChannelWrite, FanChannel, MemoryFan, MemoryThermostat, ThermostatChannel};
pub use error::ClimateError;
pub use mode::{FanSetting, HvacAction, HvacMode, Preset};
pub use quirks::{ClimateEntityFeature, CurrentTemperatureSource, ThermostatQuirks};
pub use registry::{QuirkRegistry, QuirkRule, NAMRON_MANUFACTURER};
pub use thermostat::{ClimateState, SetTemperature, Thermostat};
