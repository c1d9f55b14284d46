//! Zigbee device representation

use crate::cluster::id;
use serde::{Deserialize, Serialize};

/// Zigbee device types (network role)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Coordinator,
    Router,
    EndDevice,
}

/// A Zigbee device as seen by the entity layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZigbeeDevice {
    /// IEEE address (EUI-64)
    pub ieee_address: [u8; 8],
    /// Network short address
    pub nwk_address: u16,
    /// Device type (network role)
    pub device_type: DeviceType,
    /// Manufacturer name (from Basic cluster)
    pub manufacturer: Option<String>,
    /// Model identifier (from Basic cluster)
    pub model: Option<String>,
    /// User-assigned friendly name
    pub friendly_name: Option<String>,
    /// Device endpoints
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl ZigbeeDevice {
    /// Create a new device with just address info
    #[must_use] pub fn new(ieee_address: [u8; 8], nwk_address: u16) -> Self {
        Self {
            ieee_address,
            nwk_address,
            device_type: DeviceType::Router,
            manufacturer: None,
            model: None,
            friendly_name: None,
            endpoints: Vec::new(),
        }
    }

    /// Get IEEE address as hex string
    #[must_use] pub fn ieee_address_string(&self) -> String {
        self.ieee_address
            .iter()
            .rev() // IEEE addresses are typically displayed in reverse byte order
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Get a display name (friendly name, model, or IEEE address)
    #[must_use] pub fn display_name(&self) -> String {
        self.friendly_name
            .clone()
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| self.ieee_address_string())
    }

    /// First endpoint serving the Thermostat cluster
    #[must_use] pub fn thermostat_endpoint(&self) -> Option<&Endpoint> {
        self.endpoints.iter().find(|ep| ep.is_thermostat())
    }

    /// Whether any endpoint exposes Fan Control
    #[must_use] pub fn has_fan(&self) -> bool {
        self.endpoints.iter().any(Endpoint::has_fan_control)
    }
}

/// A device endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    /// Endpoint ID (1-240)
    pub id: u8,
    /// Profile ID (e.g., 0x0104 for Home Automation)
    pub profile_id: u16,
    /// Device ID within the profile
    pub device_id: u16,
    /// Input (server) clusters
    pub in_clusters: Vec<u16>,
    /// Output (client) clusters
    #[serde(default)]
    pub out_clusters: Vec<u16>,
}

impl Endpoint {
    /// Thermostat must be a server cluster to be controllable
    #[must_use] pub fn is_thermostat(&self) -> bool {
        self.in_clusters.contains(&id::THERMOSTAT)
    }

    #[must_use] pub fn has_fan_control(&self) -> bool {
        self.in_clusters.contains(&id::FAN_CONTROL)
    }
}
