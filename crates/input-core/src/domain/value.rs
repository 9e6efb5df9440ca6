//! Button values.
//!
//! A button slot holds either a boolean (keys, mouse buttons, pad buttons) or
//! a float (axes, triggers, sensor readings).  [`ButtonValue`] carries the
//! type tag together with the value so the two can never be confused.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The declared type of a button slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonType {
    Bool,
    Float,
}

impl ButtonType {
    /// The value a freshly created or cleared slot of this type holds.
    pub const fn default_value(self) -> ButtonValue {
        match self {
            ButtonType::Bool => ButtonValue::Bool(false),
            ButtonType::Float => ButtonValue::Float(0.0),
        }
    }
}

impl fmt::Display for ButtonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonType::Bool => f.write_str("bool"),
            ButtonType::Float => f.write_str("float"),
        }
    }
}

/// A typed button value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ButtonValue {
    Bool(bool),
    Float(f32),
}

impl ButtonValue {
    pub const fn button_type(self) -> ButtonType {
        match self {
            ButtonValue::Bool(_) => ButtonType::Bool,
            ButtonValue::Float(_) => ButtonType::Float,
        }
    }

    /// Reads the value as a boolean.  Floats count as down when non-zero.
    pub fn as_bool(self) -> bool {
        match self {
            ButtonValue::Bool(v) => v,
            ButtonValue::Float(v) => v != 0.0,
        }
    }

    /// Reads the value as a float.  Booleans map to `0.0` / `1.0`.
    pub fn as_float(self) -> f32 {
        match self {
            ButtonValue::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
            ButtonValue::Float(v) => v,
        }
    }

    /// `true` when the value equals its type's default (released / zero).
    pub fn is_default(self) -> bool {
        self == self.button_type().default_value()
    }
}

impl From<bool> for ButtonValue {
    fn from(v: bool) -> Self {
        ButtonValue::Bool(v)
    }
}

impl From<f32> for ButtonValue {
    fn from(v: f32) -> Self {
        ButtonValue::Float(v)
    }
}

/// Static description of one button slot in a device layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonInfo {
    pub name: &'static str,
    pub button_type: ButtonType,
}

impl ButtonInfo {
    pub const fn bool(name: &'static str) -> Self {
        Self {
            name,
            button_type: ButtonType::Bool,
        }
    }

    pub const fn float(name: &'static str) -> Self {
        Self {
            name,
            button_type: ButtonType::Float,
        }
    }
}
