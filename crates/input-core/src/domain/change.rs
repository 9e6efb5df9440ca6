//! Pending state writes.
//!
//! A [`Change`] is how anything outside a device's own update asks for a
//! button value to be written: capture threads, modifiers, the playback
//! engine and the network receiver all produce them.  Only the manager's
//! owning thread ever applies one.

use crate::domain::ids::{DeviceButtonId, DeviceId};
use crate::domain::value::{ButtonType, ButtonValue};

/// Which of a device's two buffers a [`Change`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTarget {
    Current,
    Previous,
}

/// Where a [`Change`] came from.
///
/// Local input is what the device's own capture produced (HID callbacks,
/// sensor threads).  It is dropped while the device is synced, since the
/// remote peer owns the device's state then.  Injected changes are written
/// on someone else's behalf (a sync peer, a playback, a modifier) and always
/// apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    Local,
    Injected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change {
    pub device: DeviceId,
    pub target: StateTarget,
    /// Log the transition so listeners see it.  Writes to the previous
    /// buffer are normally applied silently.
    pub record: bool,
    pub source: ChangeSource,
    pub button: DeviceButtonId,
    pub value: ButtonValue,
}

impl Change {
    /// A recorded local write to the current state.
    pub fn new(device: DeviceId, button: impl Into<DeviceButtonId>, value: ButtonValue) -> Self {
        Self {
            device,
            target: StateTarget::Current,
            record: true,
            source: ChangeSource::Local,
            button: button.into(),
            value,
        }
    }

    pub fn bool(device: DeviceId, button: impl Into<DeviceButtonId>, value: bool) -> Self {
        Self::new(device, button, ButtonValue::Bool(value))
    }

    pub fn float(device: DeviceId, button: impl Into<DeviceButtonId>, value: f32) -> Self {
        Self::new(device, button, ButtonValue::Float(value))
    }

    /// Redirects the write to the previous-state buffer, unrecorded.
    pub fn to_previous(mut self) -> Self {
        self.target = StateTarget::Previous;
        self.record = false;
        self
    }

    /// Marks the change as written on the device's behalf, so it applies
    /// even while the device is synced.
    pub fn injected(mut self) -> Self {
        self.source = ChangeSource::Injected;
        self
    }

    pub fn is_local(&self) -> bool {
        self.source == ChangeSource::Local
    }

    pub fn button_type(&self) -> ButtonType {
        self.value.button_type()
    }
}
