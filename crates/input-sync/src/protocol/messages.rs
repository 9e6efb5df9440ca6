//! Device state sync message types.
//!
//! Every message is one length-prefixed frame:
//!
//! ```text
//! [len:1][command:1][payload:len-1]
//! ```
//!
//! `len` counts the command byte and the payload, so a frame is at most 256
//! bytes on the wire.  All multi-byte integers are big-endian.

use input_core::{ButtonValue, DeviceButtonId, DeviceType};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Version carried in [`SyncMessage::Hello`].  Peers with a different value
/// are disconnected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Library version as `major << 16 | minor << 8 | patch`.
pub const LIB_VERSION: u32 = 0x00_01_00;

/// Largest `len` prefix a frame may carry.
pub const MAX_FRAME_LEN: usize = u8::MAX as usize;

/// Tag byte preceding a button value.
pub const VALUE_TAG_BOOL: u8 = 0x00;
pub const VALUE_TAG_FLOAT: u8 = 0x01;

// ── Command codes ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Hello = 0x01,
    Ping = 0x02,
    StartDeviceSync = 0x03,
    SetDeviceButton = 0x04,
}

impl TryFrom<u8> for Command {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(Command::Hello),
            0x02 => Ok(Command::Ping),
            0x03 => Ok(Command::StartDeviceSync),
            0x04 => Ok(Command::SetDeviceButton),
            _ => Err(()),
        }
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// One sync command.  Devices are addressed by type and per-type index,
/// never by id: ids are local to each peer's manager.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncMessage {
    /// First message on every connection.
    Hello {
        protocol_version: u32,
        lib_version: u32,
    },
    /// Keep-alive.  Carries no payload.
    Ping,
    /// The sender is about to mirror this device.  The receiver marks its
    /// matching device synced.
    StartDeviceSync { device_type: DeviceType, index: u8 },
    /// A committed button value on a mirrored device.
    SetDeviceButton {
        device_type: DeviceType,
        index: u8,
        button: DeviceButtonId,
        value: ButtonValue,
    },
}

impl SyncMessage {
    /// The handshake this build sends.
    pub const fn hello() -> Self {
        SyncMessage::Hello {
            protocol_version: PROTOCOL_VERSION,
            lib_version: LIB_VERSION,
        }
    }

    pub const fn command(&self) -> Command {
        match self {
            SyncMessage::Hello { .. } => Command::Hello,
            SyncMessage::Ping => Command::Ping,
            SyncMessage::StartDeviceSync { .. } => Command::StartDeviceSync,
            SyncMessage::SetDeviceButton { .. } => Command::SetDeviceButton,
        }
    }
}
