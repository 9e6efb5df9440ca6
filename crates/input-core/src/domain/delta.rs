//! Per-update change log.
//!
//! While a device updates, every slot it actually changes is appended here as
//! an old/new pair.  The manager later replays the log to listeners.  When
//! nobody is listening the manager does not hand a log to devices at all,
//! which skips this bookkeeping entirely without affecting the state buffers.

use crate::domain::ids::{DeviceButtonId, DeviceId};
use crate::domain::value::ButtonValue;

/// One observed transition of one button.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonDelta {
    pub device: DeviceId,
    pub button: DeviceButtonId,
    pub old: ButtonValue,
    pub new: ButtonValue,
}

#[derive(Debug, Default)]
pub struct DeltaState {
    changes: Vec<ButtonDelta>,
}

impl DeltaState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_change(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        old: ButtonValue,
        new: ButtonValue,
    ) {
        self.changes.push(ButtonDelta {
            device,
            button,
            old,
            new,
        });
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ButtonDelta> {
        self.changes.iter()
    }

    /// Removes and yields every logged change in the order it was added.
    pub fn drain(&mut self) -> std::vec::Drain<'_, ButtonDelta> {
        self.changes.drain(..)
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }
}
