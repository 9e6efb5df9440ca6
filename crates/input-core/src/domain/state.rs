//! Fixed-size button state table.
//!
//! Every device owns two of these: the *current* state, which the frame's
//! updates write into, and the *previous* state, a copy of current taken right
//! before the device updates.  Comparing the two gives "pressed this frame" and
//! "released this frame" without any extra bookkeeping.
//!
//! The buffer itself never notifies anyone.  Turning writes into listener
//! callbacks is the manager's job.

use thiserror::Error;

use crate::domain::ids::DeviceButtonId;
use crate::domain::value::{ButtonInfo, ButtonType, ButtonValue};

/// Misuse of the checked [`StateBuffer`] API.
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    /// The button id is past the end of the buffer.
    #[error("button {button} is out of range (buffer has {slots} slots)")]
    OutOfRange { button: DeviceButtonId, slots: usize },

    /// A bool was written to a float slot or the other way round.
    #[error("button {button} holds a {expected} value, got a {found}")]
    TypeMismatch {
        button: DeviceButtonId,
        expected: ButtonType,
        found: ButtonType,
    },
}

/// N button slots of mixed bool/float type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateBuffer {
    slots: Vec<ButtonValue>,
}

impl StateBuffer {
    /// Creates a buffer whose slots match `layout`, all at their default.
    pub fn from_layout(layout: &[ButtonInfo]) -> Self {
        Self {
            slots: layout
                .iter()
                .map(|info| info.button_type.default_value())
                .collect(),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_valid(&self, button: DeviceButtonId) -> bool {
        (button as usize) < self.slots.len()
    }

    /// Returns the value stored for `button`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::OutOfRange`] when `button` is past the end.
    pub fn get(&self, button: DeviceButtonId) -> Result<ButtonValue, StateError> {
        self.slots
            .get(button as usize)
            .copied()
            .ok_or(StateError::OutOfRange {
                button,
                slots: self.slots.len(),
            })
    }

    /// Returns the declared type of `button`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::OutOfRange`] when `button` is past the end.
    pub fn value_type(&self, button: DeviceButtonId) -> Result<ButtonType, StateError> {
        self.get(button).map(ButtonValue::button_type)
    }

    /// Overwrites the slot for `button`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::OutOfRange`] for an unknown button and
    /// [`StateError::TypeMismatch`] when `value` has the wrong type for the slot.
    pub fn set(&mut self, button: DeviceButtonId, value: ButtonValue) -> Result<(), StateError> {
        let slots = self.slots.len();
        let slot = self
            .slots
            .get_mut(button as usize)
            .ok_or(StateError::OutOfRange { button, slots })?;
        if slot.button_type() != value.button_type() {
            return Err(StateError::TypeMismatch {
                button,
                expected: slot.button_type(),
                found: value.button_type(),
            });
        }
        *slot = value;
        Ok(())
    }

    /// Boolean read that treats an unknown button as released.
    pub fn get_bool(&self, button: DeviceButtonId) -> bool {
        self.get(button).map(ButtonValue::as_bool).unwrap_or(false)
    }

    /// Float read that treats an unknown button as zero.
    pub fn get_float(&self, button: DeviceButtonId) -> f32 {
        self.get(button).map(ButtonValue::as_float).unwrap_or(0.0)
    }

    /// Puts every slot back to its type's default.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = slot.button_type().default_value();
        }
    }

    /// Iterates `(button id, value)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (DeviceButtonId, ButtonValue)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, v)| (i as DeviceButtonId, *v))
    }
}
