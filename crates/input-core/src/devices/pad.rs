//! Gamepad layout: six analog axes followed by fifteen digital buttons.

use crate::devices::{BuiltInDevice, DeviceKind, DeviceType};
use crate::domain::ids::DeviceButtonId;
use crate::domain::value::ButtonInfo;

/// Marker type for `create_device::<Pad>()`.
#[derive(Debug, Clone, Copy)]
pub struct Pad;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PadButton {
    LeftStickX = 0,
    LeftStickY,
    RightStickX,
    RightStickY,
    LeftTrigger,
    RightTrigger,
    Start,
    Select,
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    X,
    Y,
    L1,
    R1,
    L3,
    R3,
    Home,
}

impl PadButton {
    pub const fn id(self) -> DeviceButtonId {
        self as DeviceButtonId
    }

    /// `true` for the stick and trigger axes.
    pub const fn is_axis(self) -> bool {
        (self as u32) <= PadButton::RightTrigger as u32
    }
}

impl From<PadButton> for DeviceButtonId {
    fn from(button: PadButton) -> Self {
        button.id()
    }
}

pub(crate) const LAYOUT: &[ButtonInfo] = &[
    ButtonInfo::float("pad_left_stick_x"),
    ButtonInfo::float("pad_left_stick_y"),
    ButtonInfo::float("pad_right_stick_x"),
    ButtonInfo::float("pad_right_stick_y"),
    ButtonInfo::float("pad_left_trigger"),
    ButtonInfo::float("pad_right_trigger"),
    ButtonInfo::bool("pad_start"),
    ButtonInfo::bool("pad_select"),
    ButtonInfo::bool("pad_up"),
    ButtonInfo::bool("pad_down"),
    ButtonInfo::bool("pad_left"),
    ButtonInfo::bool("pad_right"),
    ButtonInfo::bool("pad_a"),
    ButtonInfo::bool("pad_b"),
    ButtonInfo::bool("pad_x"),
    ButtonInfo::bool("pad_y"),
    ButtonInfo::bool("pad_l1"),
    ButtonInfo::bool("pad_r1"),
    ButtonInfo::bool("pad_l3"),
    ButtonInfo::bool("pad_r3"),
    ButtonInfo::bool("pad_home"),
];

impl BuiltInDevice for Pad {
    const DEVICE_TYPE: DeviceType = DeviceType::Pad;

    fn kind() -> DeviceKind {
        DeviceKind::Pad
    }
}
