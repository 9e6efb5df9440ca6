//! Built-in motion sensors (accelerometer, gravity, gyroscope, magnetometer).
//!
//! Sensors are the one built-in kind that cannot be fed by changes alone:
//! without a platform backend attached there is no hardware behind the
//! device, so it reports [`DeviceStatus::Unavailable`](crate::devices::DeviceStatus)
//! and every axis reads zero.

use crate::devices::{BuiltInDevice, DeviceKind, DeviceType};
use crate::domain::ids::DeviceButtonId;
use crate::domain::value::ButtonInfo;

/// Marker type for `create_device::<BuiltInSensors>()`.
#[derive(Debug, Clone, Copy)]
pub struct BuiltInSensors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SensorAxis {
    AccelerationX = 0,
    AccelerationY,
    AccelerationZ,
    GravityX,
    GravityY,
    GravityZ,
    GyroscopeX,
    GyroscopeY,
    GyroscopeZ,
    MagneticFieldX,
    MagneticFieldY,
    MagneticFieldZ,
}

impl SensorAxis {
    pub const fn id(self) -> DeviceButtonId {
        self as DeviceButtonId
    }
}

impl From<SensorAxis> for DeviceButtonId {
    fn from(axis: SensorAxis) -> Self {
        axis.id()
    }
}

pub(crate) const LAYOUT: &[ButtonInfo] = &[
    ButtonInfo::float("builtin_acceleration_x"),
    ButtonInfo::float("builtin_acceleration_y"),
    ButtonInfo::float("builtin_acceleration_z"),
    ButtonInfo::float("builtin_gravity_x"),
    ButtonInfo::float("builtin_gravity_y"),
    ButtonInfo::float("builtin_gravity_z"),
    ButtonInfo::float("builtin_gyroscope_x"),
    ButtonInfo::float("builtin_gyroscope_y"),
    ButtonInfo::float("builtin_gyroscope_z"),
    ButtonInfo::float("builtin_magneticfield_x"),
    ButtonInfo::float("builtin_magneticfield_y"),
    ButtonInfo::float("builtin_magneticfield_z"),
];

impl BuiltInDevice for BuiltInSensors {
    const DEVICE_TYPE: DeviceType = DeviceType::BuiltIn;

    fn kind() -> DeviceKind {
        DeviceKind::BuiltIn
    }
}
