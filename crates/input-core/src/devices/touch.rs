//! Multi-touch layout.
//!
//! Each of the [`MAX_TOUCHES`] contacts owns four consecutive slots:
//! down (bool), x, y and pressure (floats).

use crate::devices::{BuiltInDevice, DeviceKind, DeviceType};
use crate::domain::ids::DeviceButtonId;
use crate::domain::value::ButtonInfo;

/// Marker type for `create_device::<Touch>()`.
#[derive(Debug, Clone, Copy)]
pub struct Touch;

pub const MAX_TOUCHES: u32 = 8;

/// Slot within one contact's group of four.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TouchField {
    Down = 0,
    X = 1,
    Y = 2,
    Pressure = 3,
}

/// Button id of `field` for contact `touch` (0-based).
pub const fn touch_button(touch: u32, field: TouchField) -> DeviceButtonId {
    touch * 4 + field as u32
}

macro_rules! contacts {
    ($($n:literal),*) => {
        &[$(
            ButtonInfo::bool(concat!("touch_", $n, "_down")),
            ButtonInfo::float(concat!("touch_", $n, "_x")),
            ButtonInfo::float(concat!("touch_", $n, "_y")),
            ButtonInfo::float(concat!("touch_", $n, "_pressure")),
        )*]
    };
}

pub(crate) const LAYOUT: &[ButtonInfo] = contacts!("0", "1", "2", "3", "4", "5", "6", "7");

impl BuiltInDevice for Touch {
    const DEVICE_TYPE: DeviceType = DeviceType::Touch;

    fn kind() -> DeviceKind {
        DeviceKind::Touch
    }
}
