//! Mouse layout.
//!
//! Buttons 0..=20 are booleans (the three main buttons, the two wheel
//! directions and sixteen extra buttons), followed by the two pointer axes.
//! Wheel "buttons" are pulses: they are released at the start of every
//! update, so a wheel notch reads as down for exactly one frame.
//!
//! The `Raw` variant reports relative motion.  Its axes are reset to zero at
//! the start of every update, while the standard variant keeps the last
//! absolute position.

use crate::devices::{BuiltInDevice, DeviceKind, DeviceType, DeviceUpdate, DeviceVariant};
use crate::domain::ids::DeviceButtonId;
use crate::domain::value::ButtonInfo;

/// Marker type for `create_device::<Mouse>()`.
#[derive(Debug, Clone, Copy)]
pub struct Mouse;

/// Button ids of a mouse device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MouseButton {
    Left = 0,
    Middle = 1,
    Right = 2,
    WheelUp = 3,
    WheelDown = 4,
    Button5 = 5,
    Button6 = 6,
    Button7 = 7,
    Button8 = 8,
    Button9 = 9,
    Button10 = 10,
    Button11 = 11,
    Button12 = 12,
    Button13 = 13,
    Button14 = 14,
    Button15 = 15,
    Button16 = 16,
    Button17 = 17,
    Button18 = 18,
    Button19 = 19,
    Button20 = 20,
    AxisX = 21,
    AxisY = 22,
}

impl MouseButton {
    pub const fn id(self) -> DeviceButtonId {
        self as DeviceButtonId
    }
}

impl From<MouseButton> for DeviceButtonId {
    fn from(button: MouseButton) -> Self {
        button.id()
    }
}

pub(crate) const LAYOUT: &[ButtonInfo] = &[
    ButtonInfo::bool("mouse_left"),
    ButtonInfo::bool("mouse_middle"),
    ButtonInfo::bool("mouse_right"),
    ButtonInfo::bool("mouse_wheel_up"),
    ButtonInfo::bool("mouse_wheel_down"),
    ButtonInfo::bool("mouse_5"),
    ButtonInfo::bool("mouse_6"),
    ButtonInfo::bool("mouse_7"),
    ButtonInfo::bool("mouse_8"),
    ButtonInfo::bool("mouse_9"),
    ButtonInfo::bool("mouse_10"),
    ButtonInfo::bool("mouse_11"),
    ButtonInfo::bool("mouse_12"),
    ButtonInfo::bool("mouse_13"),
    ButtonInfo::bool("mouse_14"),
    ButtonInfo::bool("mouse_15"),
    ButtonInfo::bool("mouse_16"),
    ButtonInfo::bool("mouse_17"),
    ButtonInfo::bool("mouse_18"),
    ButtonInfo::bool("mouse_19"),
    ButtonInfo::bool("mouse_20"),
    ButtonInfo::float("mouse_x"),
    ButtonInfo::float("mouse_y"),
];

impl BuiltInDevice for Mouse {
    const DEVICE_TYPE: DeviceType = DeviceType::Mouse;

    fn kind() -> DeviceKind {
        DeviceKind::Mouse
    }
}

/// Releases the wheel pulses and, for raw mice, zeroes the motion axes.
pub(crate) fn begin_update(variant: DeviceVariant, update: &mut DeviceUpdate<'_>) {
    update.set_bool(MouseButton::WheelUp, false);
    update.set_bool(MouseButton::WheelDown, false);
    if variant == DeviceVariant::Raw {
        update.set_float(MouseButton::AxisX, 0.0);
        update.set_float(MouseButton::AxisY, 0.0);
    }
}
