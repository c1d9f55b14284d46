//! Thermostat climate entity
//!
//! A view over the attribute cache of a Thermostat cluster channel. Every
//! property is computed from the latest snapshot; the only entity-owned
//! state is the selected preset.

use crate::attributes::{
    ThermostatAttribute, ThermostatAttributes, ATTR_OCCP_COOL_SETPT, ATTR_OCCP_HEAT_SETPT,
    ATTR_OCCUPANCY, ATTR_PI_COOLING_DEMAND, ATTR_PI_HEATING_DEMAND, ATTR_RUNNING_MODE,
    ATTR_SYS_MODE, ATTR_UNOCCP_COOL_SETPT, ATTR_UNOCCP_HEAT_SETPT,
};
use crate::channel::{FanChannel, ThermostatChannel};
use crate::error::ClimateError;
use crate::mode::{
    hvac_mode_from_raw, hvac_to_system_mode, running_mode_to_hvac, seq_of_operation_modes,
    system_mode_label, FanSetting, HvacAction, HvacMode, Preset,
};
use crate::quirks::{ClimateEntityFeature, CurrentTemperatureSource, ThermostatQuirks};
use crate::registry::QuirkRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use zigbee_core::{FanMode, RunningState, ZigbeeDevice};

/// ZCL temperatures are hundredths of a degree
pub const ZCL_TEMP: f64 = 100.0;
pub const DEFAULT_MIN_TEMP: f64 = 7.0;
pub const DEFAULT_MAX_TEMP: f64 = 35.0;
pub const PRECISION_TENTHS: f64 = 0.1;
pub const TEMPERATURE_UNIT: &str = "°C";

/// Arguments of a set-temperature service call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetTemperature {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub target_temp_low: Option<f64>,
    #[serde(default)]
    pub target_temp_high: Option<f64>,
    #[serde(default)]
    pub hvac_mode: Option<HvacMode>,
}

impl SetTemperature {
    /// Single target temperature
    #[must_use] pub fn temperature(temperature: f64) -> Self {
        Self {
            temperature: Some(temperature),
            ..Default::default()
        }
    }
}

/// Everything the host framework sees of a climate entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateState {
    pub entity_id: String,
    pub name: String,
    pub hvac_mode: Option<HvacMode>,
    pub hvac_modes: Vec<HvacMode>,
    pub hvac_action: Option<HvacAction>,
    pub current_temperature: Option<f64>,
    pub current_room_temperature: Option<f64>,
    pub current_floor_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub target_temperature_high: Option<f64>,
    pub target_temperature_low: Option<f64>,
    pub min_temp: f64,
    pub max_temp: f64,
    pub precision: f64,
    pub temperature_unit: &'static str,
    pub preset_mode: Preset,
    pub preset_modes: Vec<Preset>,
    pub fan_mode: Option<FanSetting>,
    pub fan_modes: Option<Vec<FanSetting>>,
    pub supported_features: u32,
    pub extra_state_attributes: BTreeMap<String, Value>,
}

/// Climate entity for a Thermostat cluster endpoint
pub struct Thermostat {
    unique_id: String,
    name: String,
    channel: Arc<dyn ThermostatChannel>,
    fan: Option<Arc<dyn FanChannel>>,
    quirks: ThermostatQuirks,
    preset: Preset,
    state_tx: broadcast::Sender<ClimateState>,
}

impl Thermostat {
    /// Create an entity over a thermostat channel
    pub fn new(
        unique_id: impl Into<String>,
        name: impl Into<String>,
        channel: Arc<dyn ThermostatChannel>,
        quirks: ThermostatQuirks,
    ) -> Self {
        let (state_tx, _) = broadcast::channel(16);
        Self {
            unique_id: unique_id.into(),
            name: name.into(),
            channel,
            fan: None,
            quirks,
            preset: Preset::None,
            state_tx,
        }
    }

    /// Attach a Fan Control channel
    #[must_use] pub fn with_fan(mut self, fan: Arc<dyn FanChannel>) -> Self {
        self.fan = Some(fan);
        self
    }

    /// Create the entity for a discovered device, picking quirks from the
    /// registry
    pub fn for_device(
        device: &ZigbeeDevice,
        registry: &QuirkRegistry,
        channel: Arc<dyn ThermostatChannel>,
        fan: Option<Arc<dyn FanChannel>>,
    ) -> Result<Self, ClimateError> {
        let not_a_thermostat = || ClimateError::NotAThermostat(device.ieee_address_string());
        let endpoint = device.thermostat_endpoint().ok_or_else(not_a_thermostat)?;
        let quirks = registry.match_device(device).ok_or_else(not_a_thermostat)?;

        let unique_id = format!("{}-{}", device.ieee_address_string(), endpoint.id);
        tracing::info!(
            "Creating climate entity {} with {} quirks",
            unique_id,
            quirks.name
        );

        let mut thermostat = Self::new(unique_id, device.display_name(), channel, quirks.clone());
        thermostat.fan = fan;
        Ok(thermostat)
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quirks(&self) -> &ThermostatQuirks {
        &self.quirks
    }

    /// Subscribe to state flushes
    pub fn subscribe(&self) -> broadcast::Receiver<ClimateState> {
        self.state_tx.subscribe()
    }

    /// Current temperature as configured by the quirks, unrounded
    pub fn current_temperature(&self) -> Option<f64> {
        match self.quirks.current_temperature {
            CurrentTemperatureSource::Local => self.current_room_temperature(),
            CurrentTemperatureSource::Outdoor => self.current_floor_temperature(),
        }
    }

    /// `local_temperature` in degrees
    pub fn current_room_temperature(&self) -> Option<f64> {
        self.channel.attributes().local_temperature.map(to_degrees)
    }

    /// `outdoor_temperature` in degrees; floor probe on floor heating units
    pub fn current_floor_temperature(&self) -> Option<f64> {
        self.channel.attributes().outdoor_temperature.map(to_degrees)
    }

    pub fn hvac_mode(&self) -> Option<HvacMode> {
        hvac_mode_of(&self.channel.attributes())
    }

    /// Modes the entity accepts
    pub fn hvac_modes(&self) -> Vec<HvacMode> {
        self.modes_of(&self.channel.attributes())
    }

    fn modes_of(&self, attrs: &ThermostatAttributes) -> Vec<HvacMode> {
        match &self.quirks.hvac_modes {
            Some(modes) => modes.clone(),
            None => seq_of_operation_modes(attrs.ctrl_sequence_of_oper),
        }
    }

    /// Current HVAC action.
    ///
    /// Devices reporting PI demand are judged by demand, the others by
    /// `running_state`.
    pub fn hvac_action(&self) -> Option<HvacAction> {
        let attrs = self.channel.attributes();
        if attrs.pi_heating_demand.is_none() && attrs.pi_cooling_demand.is_none() {
            return rm_rs_action(&attrs);
        }
        Some(pi_demand_action(&attrs))
    }

    /// Action derived from the `running_state` bitmap alone
    pub fn rm_rs_action(&self) -> Option<HvacAction> {
        rm_rs_action(&self.channel.attributes())
    }

    pub fn supported_features(&self) -> ClimateEntityFeature {
        let mut features = self.quirks.supported_features;
        if self.hvac_modes().contains(&HvacMode::Auto) {
            features |= ClimateEntityFeature::TARGET_TEMPERATURE_RANGE;
        }
        if self.fan.is_some() {
            features |= ClimateEntityFeature::FAN_MODE;
        }
        if !self.quirks.preset_modes.is_empty() {
            features |= ClimateEntityFeature::PRESET_MODE;
        }
        features
    }

    pub fn preset_mode(&self) -> Preset {
        self.preset
    }

    pub fn preset_modes(&self) -> &[Preset] {
        &self.quirks.preset_modes
    }

    /// Target temperature of the setpoint selected by mode and preset
    pub fn target_temperature(&self) -> Option<f64> {
        let attrs = self.channel.attributes();
        let away = self.preset == Preset::Away;
        let raw = match hvac_mode_of(&attrs)? {
            HvacMode::Cool => cooling_setpoint(&attrs, away),
            HvacMode::Heat | HvacMode::Auto => heating_setpoint(&attrs, away),
            _ => None,
        };
        raw.map(to_rounded_degrees)
    }

    /// Upper bound, only in heat/cool mode
    pub fn target_temperature_high(&self) -> Option<f64> {
        let attrs = self.channel.attributes();
        if hvac_mode_of(&attrs) != Some(HvacMode::HeatCool) {
            return None;
        }
        cooling_setpoint(&attrs, self.preset == Preset::Away).map(to_rounded_degrees)
    }

    /// Lower bound, only in heat/cool mode
    pub fn target_temperature_low(&self) -> Option<f64> {
        let attrs = self.channel.attributes();
        if hvac_mode_of(&attrs) != Some(HvacMode::HeatCool) {
            return None;
        }
        heating_setpoint(&attrs, self.preset == Preset::Away).map(to_rounded_degrees)
    }

    pub fn max_temp(&self) -> f64 {
        let attrs = self.channel.attributes();
        self.setpoint_limits(&attrs, attrs.max_heat_setpoint_limit, attrs.max_cool_setpoint_limit)
            .max()
            .map_or(DEFAULT_MAX_TEMP, to_rounded_degrees)
    }

    pub fn min_temp(&self) -> f64 {
        let attrs = self.channel.attributes();
        self.setpoint_limits(&attrs, attrs.min_heat_setpoint_limit, attrs.min_cool_setpoint_limit)
            .min()
            .map_or(DEFAULT_MIN_TEMP, to_rounded_degrees)
    }

    /// Limit registers that apply to the supported modes; unset ones are skipped
    fn setpoint_limits(
        &self,
        attrs: &ThermostatAttributes,
        heat: Option<i16>,
        cool: Option<i16>,
    ) -> impl Iterator<Item = i16> {
        let modes = self.modes_of(attrs);
        let mut limits = Vec::new();
        if modes.contains(&HvacMode::Heat) {
            limits.push(heat);
        }
        if modes.contains(&HvacMode::Auto) {
            limits.push(heat);
        }
        if modes.contains(&HvacMode::Cool) {
            limits.push(cool);
        }
        limits.into_iter().flatten()
    }

    pub fn fan_modes(&self) -> Option<Vec<FanSetting>> {
        self.fan.as_ref()?;
        Some(vec![FanSetting::Auto, FanSetting::On])
    }

    pub fn fan_mode(&self) -> Option<FanSetting> {
        self.fan.as_ref()?;
        let running = self.channel.attributes().running_state();
        if running.is_some_and(|state| state.contains(RunningState::FAN_STATE_ON)) {
            return Some(FanSetting::On);
        }
        Some(FanSetting::Auto)
    }

    /// Device specific diagnostics; unset registers are left out
    pub fn extra_state_attributes(&self) -> BTreeMap<String, Value> {
        let attrs = self.channel.attributes();
        let mut data = BTreeMap::new();

        if let Some(raw) = attrs.system_mode {
            data.insert(ATTR_SYS_MODE.to_string(), json!(system_mode_label(raw)));
        }
        if let Some(raw) = attrs.running_mode {
            let mode = running_mode_to_hvac(raw).map_or("unknown", |m| m.as_str());
            data.insert(ATTR_RUNNING_MODE.to_string(), json!(mode));
        }

        let raw_values = [
            (ATTR_OCCUPANCY, attrs.occupancy.map(i64::from)),
            (ATTR_OCCP_COOL_SETPT, attrs.occupied_cooling_setpoint.map(i64::from)),
            (ATTR_OCCP_HEAT_SETPT, attrs.occupied_heating_setpoint.map(i64::from)),
            (ATTR_PI_HEATING_DEMAND, attrs.pi_heating_demand.map(i64::from)),
            (ATTR_PI_COOLING_DEMAND, attrs.pi_cooling_demand.map(i64::from)),
            (ATTR_UNOCCP_COOL_SETPT, attrs.unoccupied_cooling_setpoint.map(i64::from)),
            (ATTR_UNOCCP_HEAT_SETPT, attrs.unoccupied_heating_setpoint.map(i64::from)),
        ];
        for (key, value) in raw_values {
            if let Some(value) = value {
                data.insert(key.to_string(), json!(value));
            }
        }

        data
    }

    /// Snapshot of every exposed property
    pub fn state(&self) -> ClimateState {
        ClimateState {
            entity_id: self.unique_id.clone(),
            name: self.name.clone(),
            hvac_mode: self.hvac_mode(),
            hvac_modes: self.hvac_modes(),
            hvac_action: self.hvac_action(),
            current_temperature: self.current_temperature(),
            current_room_temperature: self.current_room_temperature(),
            current_floor_temperature: self.current_floor_temperature(),
            target_temperature: self.target_temperature(),
            target_temperature_high: self.target_temperature_high(),
            target_temperature_low: self.target_temperature_low(),
            min_temp: self.min_temp(),
            max_temp: self.max_temp(),
            precision: PRECISION_TENTHS,
            temperature_unit: TEMPERATURE_UNIT,
            preset_mode: self.preset,
            preset_modes: self.quirks.preset_modes.clone(),
            fan_mode: self.fan_mode(),
            fan_modes: self.fan_modes(),
            supported_features: self.supported_features().bits(),
            extra_state_attributes: self.extra_state_attributes(),
        }
    }

    /// Publish the current state to subscribers
    fn write_state(&self) {
        // No subscribers is fine
        let _ = self.state_tx.send(self.state());
    }

    /// Set the target temperature(s), optionally switching mode first.
    ///
    /// Unsupported combinations are ignored. State is only published when
    /// the device accepted the write.
    pub async fn set_temperature(&self, request: SetTemperature) {
        if let Some(mode) = request.hvac_mode {
            self.set_hvac_mode(mode).await;
        }

        let mode = self.hvac_mode();
        if self.write_setpoints(mode, &request).await == Some(true) {
            self.write_state();
        }
    }

    /// Write the setpoints `request` asks for in `mode`.
    ///
    /// `None` when nothing was written, otherwise whether every attempted
    /// write succeeded. Heat/cool writes stop at the first failure.
    async fn write_setpoints(
        &self,
        mode: Option<HvacMode>,
        request: &SetTemperature,
    ) -> Option<bool> {
        let is_away = self.preset == Preset::Away;

        if mode == Some(HvacMode::HeatCool) {
            let mut success = true;
            if let Some(low) = request.target_temp_low {
                success = success && self.write_heating(low, is_away).await;
                tracing::debug!(
                    entity_id = %self.unique_id,
                    "Setting heating {} setpoint: {}",
                    low,
                    success
                );
            }
            if let Some(high) = request.target_temp_high {
                success = success && self.write_cooling(high, is_away).await;
                tracing::debug!(
                    entity_id = %self.unique_id,
                    "Setting cooling {} setpoint: {}",
                    high,
                    success
                );
            }
            return Some(success);
        }

        let Some(temp) = request.temperature else {
            tracing::debug!(
                entity_id = %self.unique_id,
                "incorrect {:?} setting for '{}' mode",
                request,
                mode_label(mode)
            );
            return None;
        };

        match mode {
            Some(HvacMode::Cool) => Some(self.write_cooling(temp, is_away).await),
            Some(HvacMode::Heat) => Some(self.write_heating(temp, is_away).await),
            _ => {
                tracing::debug!(
                    entity_id = %self.unique_id,
                    "Not setting temperature for '{}' mode",
                    mode_label(mode)
                );
                None
            }
        }
    }

    async fn write_heating(&self, degrees: f64, is_away: bool) -> bool {
        match self.setpoint_value(degrees) {
            Some(value) => self.channel.set_heating_setpoint(value, is_away).await,
            None => false,
        }
    }

    async fn write_cooling(&self, degrees: f64, is_away: bool) -> bool {
        match self.setpoint_value(degrees) {
            Some(value) => self.channel.set_cooling_setpoint(value, is_away).await,
            None => false,
        }
    }

    fn setpoint_value(&self, degrees: f64) -> Option<i16> {
        let value = to_zcl(degrees);
        if value.is_none() {
            tracing::debug!(
                entity_id = %self.unique_id,
                "Setpoint {} is out of range, not writing",
                degrees
            );
        }
        value
    }

    /// Switch the device to `mode` if the entity supports it
    pub async fn set_hvac_mode(&self, mode: HvacMode) {
        let modes = self.hvac_modes();
        if !modes.contains(&mode) {
            tracing::warn!(
                entity_id = %self.unique_id,
                "can't set '{}' mode. Supported modes are: {:?}",
                mode,
                modes
            );
            return;
        }

        if self
            .channel
            .set_operation_mode(hvac_to_system_mode(mode))
            .await
        {
            self.write_state();
        }
    }

    pub async fn set_fan_mode(&self, fan_mode: FanSetting) {
        let Some(fan) = &self.fan else {
            tracing::warn!(entity_id = %self.unique_id, "Unsupported '{:?}' fan mode", fan_mode);
            return;
        };

        let mode = match fan_mode {
            FanSetting::On => FanMode::On,
            FanSetting::Auto => FanMode::Auto,
        };
        if !fan.set_fan_mode(mode).await {
            tracing::debug!(entity_id = %self.unique_id, "Fan rejected {:?} mode", mode);
        }
    }

    /// Switch presets, turning the active one off first
    pub async fn set_preset_mode(&mut self, preset: Preset) {
        if !self.quirks.preset_modes.contains(&preset) {
            tracing::debug!(
                entity_id = %self.unique_id,
                "Preset mode '{}' is not supported",
                preset
            );
            return;
        }

        let current = self.preset;
        if current != preset
            && current != Preset::None
            && !self.preset_handler(current, false).await
        {
            tracing::debug!(
                entity_id = %self.unique_id,
                "Couldn't turn off '{}' preset",
                current
            );
            return;
        }

        if preset != Preset::None && !self.preset_handler(preset, true).await {
            tracing::debug!(
                entity_id = %self.unique_id,
                "Couldn't turn on '{}' preset",
                preset
            );
            return;
        }

        self.preset = preset;
        self.write_state();
    }

    async fn preset_handler(&self, preset: Preset, enable: bool) -> bool {
        match preset {
            Preset::Away => self.channel.set_occupancy(!enable).await,
            _ => {
                tracing::debug!(
                    entity_id = %self.unique_id,
                    "No handler for '{}' preset",
                    preset
                );
                false
            }
        }
    }

    /// Called by the channel owner after it refreshed an attribute
    pub async fn attribute_updated(&mut self, attr: ThermostatAttribute, value: Option<i64>) {
        if attr.is_occupied_setpoint() && self.preset == Preset::Away {
            // Occupancy is not reportable; an occupied setpoint report
            // may mean it changed
            if self.channel.get_occupancy().await == Some(true) {
                self.preset = Preset::None;
            }
        }

        tracing::debug!(
            entity_id = %self.unique_id,
            "Attribute '{}' = {:?} update",
            attr,
            value
        );
        self.write_state();
    }
}

fn hvac_mode_of(attrs: &ThermostatAttributes) -> Option<HvacMode> {
    attrs.system_mode.and_then(hvac_mode_from_raw)
}

fn mode_label(mode: Option<HvacMode>) -> &'static str {
    mode.map_or("unknown", |m| m.as_str())
}

fn heating_setpoint(attrs: &ThermostatAttributes, away: bool) -> Option<i16> {
    if away {
        attrs.unoccupied_heating_setpoint
    } else {
        attrs.occupied_heating_setpoint
    }
}

fn cooling_setpoint(attrs: &ThermostatAttributes, away: bool) -> Option<i16> {
    if away {
        attrs.unoccupied_cooling_setpoint
    } else {
        attrs.occupied_cooling_setpoint
    }
}

/// Single pass over `running_state`: heat, cool, fan, idle, then the mode
fn rm_rs_action(attrs: &ThermostatAttributes) -> Option<HvacAction> {
    let running_state = attrs.running_state()?;
    if running_state.intersects(RunningState::HEATING) {
        return Some(HvacAction::Heating);
    }
    if running_state.intersects(RunningState::COOLING) {
        return Some(HvacAction::Cooling);
    }
    if running_state.intersects(RunningState::FAN) {
        return Some(HvacAction::Fan);
    }
    // IDLE is the empty mask, so this never matches; idle devices fall
    // through to the mode check
    if running_state.intersects(RunningState::IDLE) {
        return Some(HvacAction::Idle);
    }
    if hvac_mode_of(attrs) != Some(HvacMode::Off) {
        return Some(HvacAction::Idle);
    }
    Some(HvacAction::Off)
}

fn pi_demand_action(attrs: &ThermostatAttributes) -> HvacAction {
    if attrs.pi_heating_demand.is_some_and(|d| d > 0) {
        return HvacAction::Heating;
    }
    if attrs.pi_cooling_demand.is_some_and(|d| d > 0) {
        return HvacAction::Cooling;
    }
    if hvac_mode_of(attrs) != Some(HvacMode::Off) {
        return HvacAction::Idle;
    }
    HvacAction::Off
}

fn to_degrees(raw: i16) -> f64 {
    f64::from(raw) / ZCL_TEMP
}

/// One decimal, ties to even on the exact binary value
fn to_rounded_degrees(raw: i16) -> f64 {
    let degrees = to_degrees(raw);
    format!("{degrees:.1}").parse().unwrap_or(degrees)
}

/// Degrees to ZCL units, truncating; `None` outside the int16 range
fn to_zcl(degrees: f64) -> Option<i16> {
    let raw = (degrees * ZCL_TEMP).trunc();
    if raw.is_nan() || raw < f64::from(i16::MIN) || raw > f64::from(i16::MAX) {
        return None;
    }
    Some(raw as i16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelWrite, MemoryFan, MemoryThermostat};
    use tokio::sync::broadcast::error::TryRecvError;
    use zigbee_core::cluster::id;
    use zigbee_core::{Endpoint, SystemMode};

    const HEAT: u8 = SystemMode::Heat as u8;
    const COOL: u8 = SystemMode::Cool as u8;
    const OFF: u8 = SystemMode::Off as u8;

    fn namron(attrs: ThermostatAttributes) -> (Arc<MemoryThermostat>, Thermostat) {
        let channel = Arc::new(MemoryThermostat::new(attrs));
        let thermostat = Thermostat::new(
            "00:11:22:33:44:55:66:77-1",
            "Floor heating",
            channel.clone(),
            ThermostatQuirks::namron(),
        );
        (channel, thermostat)
    }

    fn with_presets(attrs: ThermostatAttributes) -> (Arc<MemoryThermostat>, Thermostat) {
        let channel = Arc::new(MemoryThermostat::new(attrs));
        let mut quirks = ThermostatQuirks::generic();
        quirks.preset_modes = vec![Preset::None, Preset::Away];
        let thermostat = Thermostat::new("thermostat-1", "Hallway", channel.clone(), quirks);
        (channel, thermostat)
    }

    fn setpoints(system_mode: u8) -> ThermostatAttributes {
        ThermostatAttributes {
            system_mode: Some(system_mode),
            occupied_cooling_setpoint: Some(2150),
            unoccupied_cooling_setpoint: Some(2600),
            occupied_heating_setpoint: Some(2200),
            unoccupied_heating_setpoint: Some(1600),
            ..Default::default()
        }
    }

    #[test]
    fn test_target_temperature_cool() {
        let (_, thermostat) = namron(setpoints(COOL));
        assert_eq!(thermostat.target_temperature(), Some(21.5));
    }

    #[tokio::test]
    async fn test_target_temperature_cool_away() {
        let (_, mut thermostat) = with_presets(setpoints(COOL));
        thermostat.set_preset_mode(Preset::Away).await;
        assert_eq!(thermostat.preset_mode(), Preset::Away);
        assert_eq!(thermostat.target_temperature(), Some(26.0));
    }

    #[test]
    fn test_target_temperature_heat_and_auto() {
        let (_, thermostat) = namron(setpoints(HEAT));
        assert_eq!(thermostat.target_temperature(), Some(22.0));

        let (_, thermostat) = namron(setpoints(SystemMode::Auto as u8));
        assert_eq!(thermostat.target_temperature(), Some(22.0));
    }

    #[test]
    fn test_target_temperature_other_modes() {
        for mode in [SystemMode::Dry, SystemMode::FanOnly, SystemMode::Off] {
            let (_, thermostat) = namron(setpoints(mode as u8));
            assert_eq!(thermostat.target_temperature(), None, "{mode}");
        }
    }

    #[test]
    fn test_target_temperature_unset() {
        let (_, thermostat) = namron(ThermostatAttributes {
            system_mode: Some(HEAT),
            ..Default::default()
        });
        assert_eq!(thermostat.target_temperature(), None);

        let (_, thermostat) = namron(ThermostatAttributes::default());
        assert_eq!(thermostat.target_temperature(), None);
    }

    #[test]
    fn test_target_temperature_rounds_to_tenths() {
        let cases = [
            (2157, 21.6),
            (2125, 21.2),
            (2225, 22.2),
            (2115, 21.1),
            (2145, 21.4),
            (2165, 21.6),
            (1625, 16.2),
            (-125, -1.2),
        ];
        let (channel, thermostat) = namron(setpoints(HEAT));
        for (raw, expected) in cases {
            channel.modify(|attrs| {
                attrs.occupied_heating_setpoint = Some(raw);
                attrs.max_heat_setpoint_limit = Some(raw);
                attrs.min_heat_setpoint_limit = Some(raw);
            });
            assert_eq!(thermostat.target_temperature(), Some(expected), "raw {raw}");
            assert_eq!(thermostat.max_temp(), expected, "raw {raw}");
            assert_eq!(thermostat.min_temp(), expected, "raw {raw}");
        }
    }

    #[test]
    fn test_range_bounds_outside_heat_cool() {
        let (_, thermostat) = namron(setpoints(HEAT));
        assert_eq!(thermostat.target_temperature_high(), None);
        assert_eq!(thermostat.target_temperature_low(), None);
    }

    #[test]
    fn test_max_temp_ignores_cool_limits() {
        let (_, thermostat) = namron(ThermostatAttributes {
            max_heat_setpoint_limit: Some(3000),
            max_cool_setpoint_limit: Some(4000),
            min_heat_setpoint_limit: Some(500),
            min_cool_setpoint_limit: Some(100),
            ..Default::default()
        });
        assert_eq!(thermostat.max_temp(), 30.0);
        assert_eq!(thermostat.min_temp(), 5.0);
    }

    #[test]
    fn test_min_max_defaults() {
        let (_, thermostat) = namron(ThermostatAttributes::default());
        assert_eq!(thermostat.max_temp(), DEFAULT_MAX_TEMP);
        assert_eq!(thermostat.min_temp(), DEFAULT_MIN_TEMP);

        // Cooling-only device without limits reported
        let channel = Arc::new(MemoryThermostat::new(ThermostatAttributes {
            ctrl_sequence_of_oper: Some(0x00),
            max_heat_setpoint_limit: Some(3000),
            ..Default::default()
        }));
        let generic = Thermostat::new("t", "t", channel, ThermostatQuirks::generic());
        assert_eq!(generic.max_temp(), DEFAULT_MAX_TEMP);
    }

    #[test]
    fn test_min_max_across_heat_and_cool() {
        let channel = Arc::new(MemoryThermostat::new(ThermostatAttributes {
            ctrl_sequence_of_oper: Some(0x04),
            max_heat_setpoint_limit: Some(3000),
            max_cool_setpoint_limit: Some(3200),
            min_heat_setpoint_limit: Some(700),
            min_cool_setpoint_limit: Some(1600),
            ..Default::default()
        }));
        let thermostat = Thermostat::new("t", "t", channel, ThermostatQuirks::generic());
        assert_eq!(thermostat.max_temp(), 32.0);
        assert_eq!(thermostat.min_temp(), 7.0);
    }

    #[test]
    fn test_rm_rs_action_priority() {
        let cases = [
            (0x0001 | 0x0002 | 0x0004, HvacAction::Heating),
            (0x0008, HvacAction::Heating),
            (0x0002 | 0x0004, HvacAction::Cooling),
            (0x0010, HvacAction::Cooling),
            (0x0020, HvacAction::Fan),
            (0x0040, HvacAction::Fan),
        ];
        for (bits, expected) in cases {
            let (_, thermostat) = namron(ThermostatAttributes {
                system_mode: Some(OFF),
                running_state: Some(bits),
                ..Default::default()
            });
            assert_eq!(thermostat.rm_rs_action(), Some(expected), "bits {bits:#06x}");
            assert_eq!(thermostat.hvac_action(), Some(expected));
        }
    }

    #[test]
    fn test_rm_rs_action_idle_depends_on_mode() {
        let (channel, thermostat) = namron(ThermostatAttributes {
            system_mode: Some(HEAT),
            running_state: Some(0),
            ..Default::default()
        });
        assert_eq!(thermostat.hvac_action(), Some(HvacAction::Idle));

        channel.update(ThermostatAttribute::SystemMode, Some(i64::from(OFF)));
        assert_eq!(thermostat.hvac_action(), Some(HvacAction::Off));

        channel.update(ThermostatAttribute::RunningState, None);
        assert_eq!(thermostat.hvac_action(), None);
    }

    #[test]
    fn test_pi_demand_action() {
        let (channel, thermostat) = namron(ThermostatAttributes {
            system_mode: Some(HEAT),
            running_state: Some(0x0002),
            pi_heating_demand: Some(40),
            ..Default::default()
        });
        // Demand wins over running_state
        assert_eq!(thermostat.hvac_action(), Some(HvacAction::Heating));

        channel.modify(|attrs| {
            attrs.pi_heating_demand = Some(0);
            attrs.pi_cooling_demand = Some(15);
        });
        assert_eq!(thermostat.hvac_action(), Some(HvacAction::Cooling));

        channel.update(ThermostatAttribute::PiCoolingDemand, Some(0));
        assert_eq!(thermostat.hvac_action(), Some(HvacAction::Idle));

        channel.update(ThermostatAttribute::SystemMode, Some(i64::from(OFF)));
        assert_eq!(thermostat.hvac_action(), Some(HvacAction::Off));
    }

    #[test]
    fn test_current_temperatures() {
        let (_, thermostat) = namron(ThermostatAttributes {
            local_temperature: Some(2034),
            outdoor_temperature: Some(2250),
            ..Default::default()
        });
        assert_eq!(thermostat.current_temperature(), Some(22.5));
        assert_eq!(thermostat.current_floor_temperature(), Some(22.5));
        assert_eq!(thermostat.current_room_temperature(), Some(20.34));

        let (_, thermostat) = namron(ThermostatAttributes::default());
        assert_eq!(thermostat.current_temperature(), None);
        assert_eq!(thermostat.current_room_temperature(), None);
    }

    #[test]
    fn test_hvac_modes() {
        let (_, thermostat) = namron(ThermostatAttributes {
            ctrl_sequence_of_oper: Some(0x04),
            ..Default::default()
        });
        assert_eq!(
            thermostat.hvac_modes(),
            vec![HvacMode::Auto, HvacMode::Heat, HvacMode::Dry, HvacMode::Off]
        );
    }

    #[test]
    fn test_supported_features() {
        let (_, thermostat) = namron(ThermostatAttributes::default());
        assert_eq!(
            thermostat.supported_features(),
            ClimateEntityFeature::TARGET_TEMPERATURE
                | ClimateEntityFeature::TARGET_TEMPERATURE_RANGE
        );

        let thermostat = thermostat.with_fan(Arc::new(MemoryFan::default()));
        assert!(thermostat
            .supported_features()
            .contains(ClimateEntityFeature::FAN_MODE));

        let (_, thermostat) = with_presets(ThermostatAttributes::default());
        assert_eq!(
            thermostat.supported_features(),
            ClimateEntityFeature::TARGET_TEMPERATURE | ClimateEntityFeature::PRESET_MODE
        );
    }

    #[test]
    fn test_extra_state_attributes() {
        let (channel, thermostat) = namron(ThermostatAttributes {
            system_mode: Some(HEAT),
            occupied_heating_setpoint: Some(2200),
            pi_heating_demand: Some(80),
            ..Default::default()
        });
        let data = thermostat.extra_state_attributes();
        assert_eq!(data[ATTR_SYS_MODE], json!("[SystemMode.Heat]/heat"));
        assert_eq!(data[ATTR_OCCP_HEAT_SETPT], json!(2200));
        assert_eq!(data[ATTR_PI_HEATING_DEMAND], json!(80));
        assert!(!data.contains_key(ATTR_OCCP_COOL_SETPT));
        assert!(!data.contains_key(ATTR_OCCUPANCY));
        assert_eq!(data.len(), 3);

        channel.update(ThermostatAttribute::SystemMode, Some(0x02));
        let data = thermostat.extra_state_attributes();
        assert_eq!(data[ATTR_SYS_MODE], json!("[2]/unknown"));
        assert_eq!(thermostat.hvac_mode(), None);
    }

    #[tokio::test]
    async fn test_set_temperature_heat() {
        let (channel, thermostat) = namron(setpoints(HEAT));
        let mut rx = thermostat.subscribe();

        thermostat.set_temperature(SetTemperature::temperature(22.0)).await;

        assert_eq!(
            channel.writes(),
            vec![ChannelWrite::HeatingSetpoint {
                value: 2200,
                is_away: false
            }]
        );
        let state = rx.try_recv().unwrap();
        assert_eq!(state.target_temperature, Some(22.0));
    }

    #[tokio::test]
    async fn test_set_temperature_failure_does_not_flush() {
        let (channel, thermostat) = namron(setpoints(HEAT));
        channel.set_reject_writes(true);
        let mut rx = thermostat.subscribe();

        thermostat.set_temperature(SetTemperature::temperature(22.0)).await;

        assert_eq!(channel.writes().len(), 1);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_set_temperature_cool_truncates() {
        let (channel, thermostat) = with_presets(setpoints(COOL));
        thermostat.set_temperature(SetTemperature::temperature(21.57)).await;
        assert_eq!(
            channel.writes(),
            vec![ChannelWrite::CoolingSetpoint {
                value: 2157,
                is_away: false
            }]
        );
    }

    #[tokio::test]
    async fn test_set_temperature_away_uses_unoccupied() {
        let (channel, mut thermostat) = with_presets(setpoints(HEAT));
        thermostat.set_preset_mode(Preset::Away).await;

        thermostat.set_temperature(SetTemperature::temperature(15.5)).await;

        assert_eq!(
            channel.writes().last(),
            Some(&ChannelWrite::HeatingSetpoint {
                value: 1550,
                is_away: true
            })
        );
        assert_eq!(thermostat.target_temperature(), Some(15.5));
    }

    #[tokio::test]
    async fn test_set_temperature_without_arguments() {
        let (channel, thermostat) = namron(setpoints(COOL));
        let mut rx = thermostat.subscribe();

        thermostat.set_temperature(SetTemperature::default()).await;

        assert!(channel.writes().is_empty());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_set_temperature_unsupported_mode() {
        for mode in [SystemMode::Dry, SystemMode::Auto, SystemMode::Off] {
            let (channel, thermostat) = namron(setpoints(mode as u8));
            let mut rx = thermostat.subscribe();

            thermostat.set_temperature(SetTemperature::temperature(20.0)).await;

            assert!(channel.writes().is_empty(), "{mode}");
            assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        }
    }

    #[tokio::test]
    async fn test_set_temperature_switches_mode_first() {
        let (channel, thermostat) = namron(setpoints(OFF));
        let mut rx = thermostat.subscribe();

        thermostat
            .set_temperature(SetTemperature {
                temperature: Some(21.0),
                hvac_mode: Some(HvacMode::Heat),
                ..Default::default()
            })
            .await;

        assert_eq!(
            channel.writes(),
            vec![
                ChannelWrite::OperationMode(SystemMode::Heat),
                ChannelWrite::HeatingSetpoint {
                    value: 2100,
                    is_away: false
                },
            ]
        );
        // One flush for the mode, one for the setpoint
        assert_eq!(rx.try_recv().unwrap().hvac_mode, Some(HvacMode::Heat));
        assert_eq!(rx.try_recv().unwrap().target_temperature, Some(21.0));
    }

    fn range(low: f64, high: f64) -> SetTemperature {
        SetTemperature {
            target_temp_low: Some(low),
            target_temp_high: Some(high),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_heat_cool_writes_both_setpoints() {
        let (channel, thermostat) = with_presets(setpoints(HEAT));

        let written = thermostat
            .write_setpoints(Some(HvacMode::HeatCool), &range(19.5, 24.25))
            .await;

        assert_eq!(written, Some(true));
        assert_eq!(
            channel.writes(),
            vec![
                ChannelWrite::HeatingSetpoint {
                    value: 1950,
                    is_away: false
                },
                ChannelWrite::CoolingSetpoint {
                    value: 2425,
                    is_away: false
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_heat_cool_away_uses_unoccupied() {
        let (channel, mut thermostat) = with_presets(setpoints(HEAT));
        thermostat.set_preset_mode(Preset::Away).await;

        let written = thermostat
            .write_setpoints(Some(HvacMode::HeatCool), &range(15.0, 28.0))
            .await;

        assert_eq!(written, Some(true));
        let attrs = channel.attributes();
        assert_eq!(attrs.unoccupied_heating_setpoint, Some(1500));
        assert_eq!(attrs.unoccupied_cooling_setpoint, Some(2800));
    }

    #[tokio::test]
    async fn test_heat_cool_stops_after_failed_write() {
        let (channel, thermostat) = with_presets(setpoints(HEAT));
        channel.set_reject_writes(true);
        let mut rx = thermostat.subscribe();

        let written = thermostat
            .write_setpoints(Some(HvacMode::HeatCool), &range(19.5, 24.0))
            .await;

        assert_eq!(written, Some(false));
        assert_eq!(
            channel.writes(),
            vec![ChannelWrite::HeatingSetpoint {
                value: 1950,
                is_away: false
            }]
        );
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_heat_cool_ignores_single_temperature() {
        let (channel, thermostat) = with_presets(setpoints(HEAT));

        let written = thermostat
            .write_setpoints(Some(HvacMode::HeatCool), &SetTemperature::temperature(21.0))
            .await;

        // Nothing attempted counts as success
        assert_eq!(written, Some(true));
        assert!(channel.writes().is_empty());
    }

    #[tokio::test]
    async fn test_set_temperature_out_of_range() {
        let (channel, thermostat) = namron(setpoints(HEAT));
        let mut rx = thermostat.subscribe();

        thermostat.set_temperature(SetTemperature::temperature(400.0)).await;
        thermostat.set_temperature(SetTemperature::temperature(-400.0)).await;
        thermostat
            .set_temperature(SetTemperature::temperature(f64::NAN))
            .await;

        assert!(channel.writes().is_empty());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(thermostat.target_temperature(), Some(22.0));
    }

    #[test]
    fn test_to_zcl_bounds() {
        assert_eq!(to_zcl(327.67), Some(32767));
        assert_eq!(to_zcl(-327.68), Some(-32768));
        assert_eq!(to_zcl(327.68), None);
        assert_eq!(to_zcl(-1.25), Some(-125));
    }

    #[tokio::test]
    async fn test_set_hvac_mode_unsupported() {
        let (channel, thermostat) = namron(setpoints(HEAT));
        thermostat.set_hvac_mode(HvacMode::Cool).await;
        assert!(channel.writes().is_empty());

        thermostat.set_hvac_mode(HvacMode::Dry).await;
        assert_eq!(
            channel.writes(),
            vec![ChannelWrite::OperationMode(SystemMode::Dry)]
        );
        assert_eq!(thermostat.hvac_mode(), Some(HvacMode::Dry));
    }

    #[tokio::test]
    async fn test_set_preset_unsupported() {
        let (channel, mut thermostat) = namron(setpoints(HEAT));
        thermostat.set_preset_mode(Preset::Away).await;
        assert_eq!(thermostat.preset_mode(), Preset::None);
        assert!(channel.writes().is_empty());
    }

    #[tokio::test]
    async fn test_set_preset_toggles_occupancy() {
        let (channel, mut thermostat) = with_presets(setpoints(HEAT));

        thermostat.set_preset_mode(Preset::Away).await;
        thermostat.set_preset_mode(Preset::None).await;

        assert_eq!(
            channel.writes(),
            vec![ChannelWrite::Occupancy(false), ChannelWrite::Occupancy(true)]
        );
        assert_eq!(thermostat.preset_mode(), Preset::None);
    }

    #[tokio::test]
    async fn test_set_preset_failure_keeps_preset() {
        let (channel, mut thermostat) = with_presets(setpoints(HEAT));
        channel.set_reject_writes(true);
        let mut rx = thermostat.subscribe();

        thermostat.set_preset_mode(Preset::Away).await;

        assert_eq!(thermostat.preset_mode(), Preset::None);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_occupied_setpoint_report_clears_away() {
        let (channel, mut thermostat) = with_presets(setpoints(HEAT));
        thermostat.set_preset_mode(Preset::Away).await;
        let mut rx = thermostat.subscribe();

        // Unrelated attribute keeps the preset
        thermostat
            .attribute_updated(ThermostatAttribute::LocalTemperature, Some(2100))
            .await;
        assert_eq!(thermostat.preset_mode(), Preset::Away);

        channel.update(ThermostatAttribute::Occupancy, Some(1));
        thermostat
            .attribute_updated(ThermostatAttribute::OccupiedHeatingSetpoint, Some(2200))
            .await;
        assert_eq!(thermostat.preset_mode(), Preset::None);

        assert_eq!(rx.try_recv().unwrap().preset_mode, Preset::Away);
        assert_eq!(rx.try_recv().unwrap().preset_mode, Preset::None);
    }

    #[tokio::test]
    async fn test_fan_mode() {
        let (channel, thermostat) = namron(ThermostatAttributes::default());
        assert_eq!(thermostat.fan_mode(), None);
        assert_eq!(thermostat.fan_modes(), None);
        // Without a fan channel this is a no-op
        thermostat.set_fan_mode(FanSetting::On).await;

        let fan = Arc::new(MemoryFan::default());
        let thermostat = thermostat.with_fan(fan.clone());
        assert_eq!(thermostat.fan_mode(), Some(FanSetting::Auto));

        channel.update(ThermostatAttribute::RunningState, Some(0x0004));
        assert_eq!(thermostat.fan_mode(), Some(FanSetting::On));

        thermostat.set_fan_mode(FanSetting::On).await;
        assert_eq!(fan.fan_mode(), Some(FanMode::On));
        thermostat.set_fan_mode(FanSetting::Auto).await;
        assert_eq!(fan.fan_mode(), Some(FanMode::Auto));
    }

    #[test]
    fn test_for_device() {
        let registry = QuirkRegistry::new();
        let mut device = ZigbeeDevice::new([0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11, 0x00], 0x1a2b);
        device.manufacturer = Some("NAMRON AS".to_string());
        device.friendly_name = Some("Bathroom floor".to_string());
        device.endpoints.push(Endpoint {
            id: 1,
            profile_id: 0x0104,
            device_id: 0x0301,
            in_clusters: vec![id::BASIC, id::THERMOSTAT],
            out_clusters: Vec::new(),
        });

        let channel = Arc::new(MemoryThermostat::default());
        let thermostat = Thermostat::for_device(&device, &registry, channel.clone(), None).unwrap();
        assert_eq!(thermostat.unique_id(), "00:11:22:33:44:55:66:77-1");
        assert_eq!(thermostat.name(), "Bathroom floor");
        assert_eq!(thermostat.quirks().name, "namron");

        device.endpoints[0].in_clusters = vec![id::BASIC];
        let result = Thermostat::for_device(&device, &registry, channel, None);
        assert!(matches!(result, Err(ClimateError::NotAThermostat(_))));
    }

    #[test]
    fn test_state_serializes() {
        let (_, thermostat) = namron(setpoints(HEAT));
        let json = serde_json::to_value(thermostat.state()).unwrap();
        assert_eq!(json["hvac_mode"], "heat");
        assert_eq!(json["target_temperature"], 22.0);
        assert_eq!(json["preset_mode"], "none");
        assert_eq!(json["fan_modes"], Value::Null);
        assert_eq!(json["supported_features"], 3);
    }
}
