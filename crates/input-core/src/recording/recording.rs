//! The recorded change log and its serialized form.
//!
//! # Format
//!
//! A serialized recording is a bincode blob whose first field is a format
//! version ([`RECORDING_FORMAT_VERSION`]).  Device ids are only meaningful
//! inside one manager, so each change stores the device's type and index
//! instead; loading resolves them against the manager passed in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::devices::DeviceType;
use crate::domain::ids::{DeviceButtonId, DeviceId};
use crate::domain::value::ButtonValue;
use crate::manager::InputManager;

pub const RECORDING_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("failed to encode recording: {0}")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode recording: {0}")]
    Decode(#[source] bincode::Error),

    #[error("unsupported recording format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// A recorded id does not name a device of the manager being saved from.
    #[error("{0} is not registered with this manager")]
    UnknownDevice(DeviceId),

    /// The manager being loaded into has no device matching a recorded one.
    #[error("no {device_type} device with index {index}")]
    MissingDevice { device_type: DeviceType, index: u32 },
}

/// One logged transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedChange {
    /// Milliseconds since recording started.
    pub time_ms: u64,
    pub device: DeviceId,
    pub button: DeviceButtonId,
    pub value: ButtonValue,
}

/// An ordered log of changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputRecording {
    changes: Vec<RecordedChange>,
}

#[derive(Serialize, Deserialize)]
struct SerializedRecording {
    version: u32,
    changes: Vec<SerializedChange>,
}

#[derive(Serialize, Deserialize)]
struct SerializedChange {
    time_ms: u64,
    device_type: DeviceType,
    device_index: u32,
    button: DeviceButtonId,
    value: ButtonValue,
}

impl InputRecording {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a change.  Times must not go backwards.
    pub fn add_change(
        &mut self,
        time_ms: u64,
        device: DeviceId,
        button: DeviceButtonId,
        value: ButtonValue,
    ) {
        debug_assert!(
            self.changes.last().map_or(true, |last| last.time_ms <= time_ms),
            "recording times must be non-decreasing"
        );
        self.changes.push(RecordedChange {
            time_ms,
            device,
            button,
            value,
        });
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RecordedChange> {
        self.changes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordedChange> {
        self.changes.iter()
    }

    /// Time of the last change.
    pub fn duration_ms(&self) -> u64 {
        self.changes.last().map_or(0, |c| c.time_ms)
    }

    /// Distinct devices, in order of first appearance.
    pub fn devices(&self) -> Vec<DeviceId> {
        let mut devices = Vec::new();
        for change in &self.changes {
            if !devices.contains(&change.device) {
                devices.push(change.device);
            }
        }
        devices
    }

    // ── Serialization ─────────────────────────────────────────────────────────

    fn to_serialized(&self, manager: &InputManager) -> Result<SerializedRecording, RecordingError> {
        let changes = self
            .changes
            .iter()
            .map(|c| {
                let device = manager
                    .get_device(c.device)
                    .ok_or(RecordingError::UnknownDevice(c.device))?;
                Ok(SerializedChange {
                    time_ms: c.time_ms,
                    device_type: device.device_type(),
                    device_index: device.index(),
                    button: c.button,
                    value: c.value,
                })
            })
            .collect::<Result<Vec<_>, RecordingError>>()?;
        Ok(SerializedRecording {
            version: RECORDING_FORMAT_VERSION,
            changes,
        })
    }

    /// Size in bytes of [`serialize`](InputRecording::serialize)'s output.
    ///
    /// # Errors
    ///
    /// Fails when a recorded device is no longer registered with `manager`.
    pub fn serialized_size(&self, manager: &InputManager) -> Result<usize, RecordingError> {
        let serialized = self.to_serialized(manager)?;
        bincode::serialized_size(&serialized)
            .map(|size| size as usize)
            .map_err(RecordingError::Encode)
    }

    /// Encodes the recording, mapping ids through `manager`.
    ///
    /// # Errors
    ///
    /// Fails when a recorded device is no longer registered with `manager`.
    pub fn serialize(&self, manager: &InputManager) -> Result<Vec<u8>, RecordingError> {
        let serialized = self.to_serialized(manager)?;
        bincode::serialize(&serialized).map_err(RecordingError::Encode)
    }

    /// Decodes a recording and resolves its devices in `manager`.
    ///
    /// # Errors
    ///
    /// Fails on malformed bytes, a version mismatch, or when `manager` has
    /// no device of a recorded type and index.
    pub fn deserialize(bytes: &[u8], manager: &InputManager) -> Result<Self, RecordingError> {
        let serialized: SerializedRecording =
            bincode::deserialize(bytes).map_err(RecordingError::Decode)?;
        if serialized.version != RECORDING_FORMAT_VERSION {
            return Err(RecordingError::UnsupportedVersion {
                found: serialized.version,
                expected: RECORDING_FORMAT_VERSION,
            });
        }
        let changes = serialized
            .changes
            .into_iter()
            .map(|c| {
                let device = manager
                    .find_device_id(c.device_type, c.device_index)
                    .ok_or(RecordingError::MissingDevice {
                        device_type: c.device_type,
                        index: c.device_index,
                    })?;
                Ok(RecordedChange {
                    time_ms: c.time_ms,
                    device,
                    button: c.button,
                    value: c.value,
                })
            })
            .collect::<Result<Vec<_>, RecordingError>>()?;
        Ok(Self { changes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::keyboard::{Key, Keyboard};
    use crate::devices::mouse::{Mouse, MouseButton};
    use crate::devices::DeviceVariant;
    use crate::domain::ids::DeviceIndex;

    fn topology() -> (InputManager, DeviceId, DeviceId) {
        let mut manager = InputManager::new();
        let keyboard = manager.create_device::<Keyboard>(DeviceIndex::Auto, DeviceVariant::Standard);
        let mouse = manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
        (manager, keyboard, mouse)
    }

    #[test]
    fn test_serialize_resolves_devices_by_type_and_index() {
        // Arrange: the loading manager registers the devices in another order
        let (source, keyboard, mouse) = topology();
        let mut recording = InputRecording::new();
        recording.add_change(0, keyboard, Key::KeyA.id(), ButtonValue::Bool(true));
        recording.add_change(16, mouse, MouseButton::AxisX.id(), ButtonValue::Float(12.5));
        let mut target = InputManager::new();
        let target_mouse = target.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
        let target_keyboard = target.create_device::<Keyboard>(DeviceIndex::Auto, DeviceVariant::Standard);

        // Act
        let bytes = recording.serialize(&source).unwrap();
        let loaded = InputRecording::deserialize(&bytes, &target).unwrap();

        // Assert
        assert_eq!(bytes.len(), recording.serialized_size(&source).unwrap());
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(0).unwrap().device, target_keyboard);
        assert_eq!(loaded.get(1).unwrap().device, target_mouse);
        assert_eq!(loaded.get(1).unwrap().value, ButtonValue::Float(12.5));
        assert_eq!(loaded.duration_ms(), 16);
    }

    #[test]
    fn test_serialize_fails_for_unregistered_device() {
        // Arrange
        let (source, _, _) = topology();
        let mut recording = InputRecording::new();
        let ghost = DeviceId::from_raw(9);
        recording.add_change(0, ghost, 0, ButtonValue::Bool(true));

        // Act
        let result = recording.serialize(&source);

        // Assert
        assert!(matches!(result, Err(RecordingError::UnknownDevice(id)) if id == ghost));
    }

    #[test]
    fn test_deserialize_fails_when_topology_is_missing_a_device() {
        // Arrange
        let (source, _, mouse) = topology();
        let mut recording = InputRecording::new();
        recording.add_change(0, mouse, MouseButton::Left.id(), ButtonValue::Bool(true));
        let bytes = recording.serialize(&source).unwrap();
        let empty = InputManager::new();

        // Act
        let result = InputRecording::deserialize(&bytes, &empty);

        // Assert
        assert!(matches!(
            result,
            Err(RecordingError::MissingDevice {
                device_type: DeviceType::Mouse,
                index: 0
            })
        ));
    }

    #[test]
    fn test_deserialize_rejects_other_versions_and_garbage() {
        // Arrange
        let (manager, _, _) = topology();
        let future = bincode::serialize(&SerializedRecording {
            version: RECORDING_FORMAT_VERSION + 1,
            changes: Vec::new(),
        })
        .unwrap();

        // Act
        let version = InputRecording::deserialize(&future, &manager);
        let garbage = InputRecording::deserialize(&[0xFF, 0x01], &manager);

        // Assert
        assert!(matches!(
            version,
            Err(RecordingError::UnsupportedVersion { found: 2, expected: 1 })
        ));
        assert!(matches!(garbage, Err(RecordingError::Decode(_))));
    }

    #[test]
    fn test_devices_lists_each_device_once_in_order() {
        // Arrange
        let a = DeviceId::from_raw(4);
        let b = DeviceId::from_raw(2);
        let mut recording = InputRecording::new();
        recording.add_change(0, a, 0, ButtonValue::Bool(true));
        recording.add_change(1, b, 0, ButtonValue::Bool(true));
        recording.add_change(2, a, 0, ButtonValue::Bool(false));

        // Act / Assert
        assert_eq!(recording.devices(), vec![a, b]);
    }
}
