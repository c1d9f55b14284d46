//! Cluster channels consumed by climate entities
//!
//! A channel owns the attribute cache of one cluster on one endpoint and
//! performs the writes. The entity only reads the latest snapshot and asks
//! the channel to write; polling, reporting and retries happen below this
//! interface.

use crate::attributes::{ThermostatAttribute, ThermostatAttributes};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use zigbee_core::{FanMode, SystemMode};

/// Thermostat cluster capability
#[async_trait]
pub trait ThermostatChannel: Send + Sync {
    /// Latest cached attribute values
    fn attributes(&self) -> ThermostatAttributes;

    /// Write the heating setpoint, unoccupied variant when `is_away`
    async fn set_heating_setpoint(&self, value: i16, is_away: bool) -> bool;

    /// Write the cooling setpoint, unoccupied variant when `is_away`
    async fn set_cooling_setpoint(&self, value: i16, is_away: bool) -> bool;

    /// Write `system_mode`
    async fn set_operation_mode(&self, mode: SystemMode) -> bool;

    /// Read occupancy from the device, bypassing the cache
    async fn get_occupancy(&self) -> Option<bool>;

    /// Force occupancy; most devices do not allow it
    async fn set_occupancy(&self, _occupied: bool) -> bool {
        false
    }
}

/// Fan Control cluster capability
#[async_trait]
pub trait FanChannel: Send + Sync {
    async fn set_fan_mode(&self, mode: FanMode) -> bool;
}

/// A write issued through a memory channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelWrite {
    HeatingSetpoint { value: i16, is_away: bool },
    CoolingSetpoint { value: i16, is_away: bool },
    OperationMode(SystemMode),
    Occupancy(bool),
    FanMode(FanMode),
}

/// In-memory thermostat channel.
///
/// Successful writes update the cache the way a device acknowledgement
/// would. Every write attempt is recorded.
#[derive(Debug, Default)]
pub struct MemoryThermostat {
    attributes: RwLock<ThermostatAttributes>,
    writes: Mutex<Vec<ChannelWrite>>,
    reject_writes: AtomicBool,
}

impl MemoryThermostat {
    #[must_use] pub fn new(attributes: ThermostatAttributes) -> Self {
        Self {
            attributes: RwLock::new(attributes),
            ..Default::default()
        }
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Replace the cached value of one attribute
    pub fn update(&self, attr: ThermostatAttribute, value: Option<i64>) {
        self.attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(attr, value);
    }

    /// Mutate the cache directly
    pub fn modify(&self, f: impl FnOnce(&mut ThermostatAttributes)) {
        let mut attrs = self.attributes.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *attrs);
    }

    /// All writes attempted so far
    #[must_use] pub fn writes(&self) -> Vec<ChannelWrite> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, write: ChannelWrite) -> bool {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(write);
        !self.reject_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThermostatChannel for MemoryThermostat {
    fn attributes(&self) -> ThermostatAttributes {
        self.attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn set_heating_setpoint(&self, value: i16, is_away: bool) -> bool {
        if !self.record(ChannelWrite::HeatingSetpoint { value, is_away }) {
            return false;
        }
        self.modify(|attrs| {
            if is_away {
                attrs.unoccupied_heating_setpoint = Some(value);
            } else {
                attrs.occupied_heating_setpoint = Some(value);
            }
        });
        true
    }

    async fn set_cooling_setpoint(&self, value: i16, is_away: bool) -> bool {
        if !self.record(ChannelWrite::CoolingSetpoint { value, is_away }) {
            return false;
        }
        self.modify(|attrs| {
            if is_away {
                attrs.unoccupied_cooling_setpoint = Some(value);
            } else {
                attrs.occupied_cooling_setpoint = Some(value);
            }
        });
        true
    }

    async fn set_operation_mode(&self, mode: SystemMode) -> bool {
        if !self.record(ChannelWrite::OperationMode(mode)) {
            return false;
        }
        self.modify(|attrs| attrs.system_mode = Some(mode as u8));
        true
    }

    async fn get_occupancy(&self) -> Option<bool> {
        self.attributes().occupancy.map(|o| o & 0x01 != 0)
    }

    async fn set_occupancy(&self, occupied: bool) -> bool {
        if !self.record(ChannelWrite::Occupancy(occupied)) {
            return false;
        }
        self.modify(|attrs| attrs.occupancy = Some(u8::from(occupied)));
        true
    }
}

/// In-memory fan channel
#[derive(Debug, Default)]
pub struct MemoryFan {
    fan_mode: Mutex<Option<FanMode>>,
}

impl MemoryFan {
    #[must_use] pub fn fan_mode(&self) -> Option<FanMode> {
        *self.fan_mode.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl FanChannel for MemoryFan {
    async fn set_fan_mode(&self, mode: FanMode) -> bool {
        *self.fan_mode.lock().unwrap_or_else(PoisonError::into_inner) = Some(mode);
        true
    }
}
