//! Gesture recognizers built on top of other devices.
//!
//! Gestures are late-update custom devices: they run after the frame's
//! modifiers, read the (post-modifier) state of their source devices and
//! expose the result as ordinary buttons, so listeners can treat "held for
//! half a second" exactly like a key press.

pub mod hold;
pub mod simultaneous;

pub use hold::{HoldButton, HoldGesture};
pub use simultaneous::{SimultaneouslyDownButton, SimultaneouslyDownGesture};
