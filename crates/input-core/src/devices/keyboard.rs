//! Keyboard layout.
//!
//! Keys are identified by their physical position, not by the character they
//! produce, so the table is the same on every keyboard layout.  Button ids
//! are dense (`0..Key::COUNT`) so a keyboard's state buffer has no holes.
//! Capture backends that receive USB HID usage ids (page 0x07) translate them
//! with [`Key::from_hid_usage`].

use crate::devices::{BuiltInDevice, DeviceKind, DeviceType};
use crate::domain::ids::DeviceButtonId;
use crate::domain::value::ButtonInfo;

/// Marker type for `create_device::<Keyboard>()`.
#[derive(Debug, Clone, Copy)]
pub struct Keyboard;

macro_rules! keys {
    ($($variant:ident = $hid:literal, $name:literal;)*) => {
        /// Button ids of a keyboard device.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum Key {
            $($variant,)*
        }

        impl Key {
            /// Every key in button-id order.
            pub const ALL: &'static [Key] = &[$(Key::$variant,)*];

            /// Number of keys, which is also the keyboard's slot count.
            pub const COUNT: usize = Key::ALL.len();

            /// Stable, lowercase name used for lookups by name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Key::$variant => concat!("key_", $name),)*
                }
            }

            /// The USB HID usage id (keyboard page 0x07) of this key.
            pub const fn hid_usage(self) -> u16 {
                match self {
                    $(Key::$variant => $hid,)*
                }
            }

            /// Translates a USB HID usage id.  Returns `None` for usages that
            /// have no key in this table.
            pub fn from_hid_usage(usage: u16) -> Option<Key> {
                match usage {
                    $($hid => Some(Key::$variant),)*
                    _ => None,
                }
            }
        }

        pub(crate) const LAYOUT: &[ButtonInfo] = &[
            $(ButtonInfo::bool(concat!("key_", $name)),)*
        ];
    };
}

keys! {
    Escape = 0x29, "escape";
    F1 = 0x3A, "f1";
    F2 = 0x3B, "f2";
    F3 = 0x3C, "f3";
    F4 = 0x3D, "f4";
    F5 = 0x3E, "f5";
    F6 = 0x3F, "f6";
    F7 = 0x40, "f7";
    F8 = 0x41, "f8";
    F9 = 0x42, "f9";
    F10 = 0x43, "f10";
    F11 = 0x44, "f11";
    F12 = 0x45, "f12";
    PrintScreen = 0x46, "print_screen";
    ScrollLock = 0x47, "scroll_lock";
    Pause = 0x48, "pause";
    Backquote = 0x35, "backquote";
    Digit1 = 0x1E, "1";
    Digit2 = 0x1F, "2";
    Digit3 = 0x20, "3";
    Digit4 = 0x21, "4";
    Digit5 = 0x22, "5";
    Digit6 = 0x23, "6";
    Digit7 = 0x24, "7";
    Digit8 = 0x25, "8";
    Digit9 = 0x26, "9";
    Digit0 = 0x27, "0";
    Minus = 0x2D, "minus";
    Equal = 0x2E, "equal";
    Backspace = 0x2A, "backspace";
    Tab = 0x2B, "tab";
    KeyA = 0x04, "a";
    KeyB = 0x05, "b";
    KeyC = 0x06, "c";
    KeyD = 0x07, "d";
    KeyE = 0x08, "e";
    KeyF = 0x09, "f";
    KeyG = 0x0A, "g";
    KeyH = 0x0B, "h";
    KeyI = 0x0C, "i";
    KeyJ = 0x0D, "j";
    KeyK = 0x0E, "k";
    KeyL = 0x0F, "l";
    KeyM = 0x10, "m";
    KeyN = 0x11, "n";
    KeyO = 0x12, "o";
    KeyP = 0x13, "p";
    KeyQ = 0x14, "q";
    KeyR = 0x15, "r";
    KeyS = 0x16, "s";
    KeyT = 0x17, "t";
    KeyU = 0x18, "u";
    KeyV = 0x19, "v";
    KeyW = 0x1A, "w";
    KeyX = 0x1B, "x";
    KeyY = 0x1C, "y";
    KeyZ = 0x1D, "z";
    BracketLeft = 0x2F, "bracket_left";
    BracketRight = 0x30, "bracket_right";
    Backslash = 0x31, "backslash";
    CapsLock = 0x39, "caps_lock";
    Semicolon = 0x33, "semicolon";
    Quote = 0x34, "quote";
    Enter = 0x28, "enter";
    ShiftLeft = 0xE1, "shift_left";
    Comma = 0x36, "comma";
    Period = 0x37, "period";
    Slash = 0x38, "slash";
    ShiftRight = 0xE5, "shift_right";
    ControlLeft = 0xE0, "ctrl_left";
    MetaLeft = 0xE3, "super_left";
    AltLeft = 0xE2, "alt_left";
    Space = 0x2C, "space";
    AltRight = 0xE6, "alt_right";
    MetaRight = 0xE7, "super_right";
    ContextMenu = 0x65, "menu";
    ControlRight = 0xE4, "ctrl_right";
    Insert = 0x49, "insert";
    Home = 0x4A, "home";
    PageUp = 0x4B, "page_up";
    Delete = 0x4C, "delete";
    End = 0x4D, "end";
    PageDown = 0x4E, "page_down";
    ArrowUp = 0x52, "up";
    ArrowLeft = 0x50, "left";
    ArrowDown = 0x51, "down";
    ArrowRight = 0x4F, "right";
    NumLock = 0x53, "num_lock";
    NumpadDivide = 0x54, "kp_divide";
    NumpadMultiply = 0x55, "kp_multiply";
    NumpadSubtract = 0x56, "kp_subtract";
    NumpadAdd = 0x57, "kp_add";
    NumpadEnter = 0x58, "kp_enter";
    Numpad1 = 0x59, "kp_1";
    Numpad2 = 0x5A, "kp_2";
    Numpad3 = 0x5B, "kp_3";
    Numpad4 = 0x5C, "kp_4";
    Numpad5 = 0x5D, "kp_5";
    Numpad6 = 0x5E, "kp_6";
    Numpad7 = 0x5F, "kp_7";
    Numpad8 = 0x60, "kp_8";
    Numpad9 = 0x61, "kp_9";
    Numpad0 = 0x62, "kp_0";
    NumpadDecimal = 0x63, "kp_decimal";
}

impl Key {
    pub const fn id(self) -> DeviceButtonId {
        self as DeviceButtonId
    }

    /// Looks a key up by button id.
    pub fn from_id(id: DeviceButtonId) -> Option<Key> {
        Key::ALL.get(id as usize).copied()
    }

    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Key::ControlLeft
                | Key::ControlRight
                | Key::ShiftLeft
                | Key::ShiftRight
                | Key::AltLeft
                | Key::AltRight
                | Key::MetaLeft
                | Key::MetaRight
        )
    }
}

impl From<Key> for DeviceButtonId {
    fn from(key: Key) -> Self {
        key.id()
    }
}

impl BuiltInDevice for Keyboard {
    const DEVICE_TYPE: DeviceType = DeviceType::Keyboard;

    fn kind() -> DeviceKind {
        DeviceKind::Keyboard
    }
}
