//! Opaque identifiers handed out by the manager.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a button or axis, scoped to one device.
///
/// Which ids are valid, and whether each one is boolean or float-valued, is
/// defined by the device's button layout.
pub type DeviceButtonId = u32;

/// Identifier of a registered input device.
///
/// Ids are allocated monotonically starting at 0 and are never reused while
/// the manager that allocated them is alive, so a stale id can only ever
/// resolve to "no device", never to the wrong one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Reserved sentinel that never names a device.
    pub const INVALID: DeviceId = DeviceId(u32::MAX);

    /// Wraps a raw id, for example one read back from a log file.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer value.
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns `false` only for [`DeviceId::INVALID`].
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }

    /// Position of this device in the registry's slot table.
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "device#{}", self.0)
        } else {
            f.write_str("device#invalid")
        }
    }
}

/// Index of a device among the devices of the same type.
///
/// Two pads are `Fixed(0)` and `Fixed(1)`.  `Auto` asks the registry to pick
/// the next free index for that type when the device is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceIndex {
    #[default]
    Auto,
    Fixed(u32),
}

impl From<u32> for DeviceIndex {
    fn from(index: u32) -> Self {
        DeviceIndex::Fixed(index)
    }
}

/// Handle returned by `add_listener`, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u32);

/// Handle returned by `add_device_state_modifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModifierId(pub(crate) u32);

/// A (device, button) pair, as reported by `get_any_button_down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceButtonSpec {
    pub device_id: DeviceId,
    pub button_id: DeviceButtonId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_device_id_is_not_valid() {
        assert!(!DeviceId::INVALID.is_valid());
        assert!(DeviceId::from_raw(0).is_valid());
    }

    #[test]
    fn test_device_id_display_includes_raw_value() {
        assert_eq!(DeviceId::from_raw(7).to_string(), "device#7");
        assert_eq!(DeviceId::INVALID.to_string(), "device#invalid");
    }

    #[test]
    fn test_device_index_from_u32_is_fixed() {
        assert_eq!(DeviceIndex::from(3), DeviceIndex::Fixed(3));
        assert_eq!(DeviceIndex::default(), DeviceIndex::Auto);
    }
}
