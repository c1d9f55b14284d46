//! Zigbee abstraction layer
//!
//! ZCL HVAC definitions and the device model shared by the climate
//! entity layer.

pub mod cluster;
pub mod device;

pub use cluster::{ControlSequenceOfOperation, FanMode, RunningMode, RunningState, SystemMode};
pub use device::{DeviceType, Endpoint, ZigbeeDevice};
