//! Binary codec for sync messages.
//!
//! Payload layouts (after the `[len][command]` prefix):
//!
//! ```text
//! Hello            [protocol_version:4][lib_version:4]
//! Ping             (empty)
//! StartDeviceSync  [device_type:1][index:1]
//! SetDeviceButton  [device_type:1][index:1][button:4][tag:1][value:1 or 4]
//! ```
//!
//! A bool value is one byte (any non-zero byte reads as `true`); a float is
//! an IEEE-754 `f32` in big-endian order.

use input_core::{ButtonValue, DeviceType};
use thiserror::Error;

use crate::protocol::messages::{
    Command, SyncMessage, MAX_FRAME_LEN, VALUE_TAG_BOOL, VALUE_TAG_FLOAT,
};

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the frame it starts.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The command byte is not a recognized value.
    #[error("unknown command: 0x{0:02X}")]
    UnknownCommand(u8),

    /// The payload could not be parsed (wrong length, unknown tag, etc.).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The encoded body does not fit the one-byte length prefix.
    #[error("message too large: {0} bytes exceeds the {max}-byte frame limit", max = MAX_FRAME_LEN)]
    MessageTooLarge(usize),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`SyncMessage`] into one length-prefixed frame.
///
/// # Errors
///
/// Returns [`ProtocolError::MessageTooLarge`] if the body exceeds
/// [`MAX_FRAME_LEN`].
///
/// # Examples
///
/// ```rust
/// use input_sync::protocol::{decode_message, encode_message, SyncMessage};
///
/// let bytes = encode_message(&SyncMessage::Ping).unwrap();
/// assert_eq!(bytes, [0x01, 0x02]);
/// let (decoded, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(decoded, SyncMessage::Ping);
/// assert_eq!(consumed, 2);
/// ```
pub fn encode_message(msg: &SyncMessage) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::with_capacity(16);
    buf.push(0x00); // length, patched below
    buf.push(msg.command() as u8);
    match *msg {
        SyncMessage::Hello {
            protocol_version,
            lib_version,
        } => {
            buf.extend_from_slice(&protocol_version.to_be_bytes());
            buf.extend_from_slice(&lib_version.to_be_bytes());
        }
        SyncMessage::Ping => {}
        SyncMessage::StartDeviceSync { device_type, index } => {
            buf.push(device_type.as_u8());
            buf.push(index);
        }
        SyncMessage::SetDeviceButton {
            device_type,
            index,
            button,
            value,
        } => {
            buf.push(device_type.as_u8());
            buf.push(index);
            buf.extend_from_slice(&button.to_be_bytes());
            write_value(&mut buf, value);
        }
    }

    let body_len = buf.len() - 1;
    let len = u8::try_from(body_len).map_err(|_| ProtocolError::MessageTooLarge(body_len))?;
    buf[0] = len;
    Ok(buf)
}

/// Decodes one frame from the beginning of `bytes`.
///
/// Returns the message and the number of bytes consumed (prefix included),
/// so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the frame is incomplete or malformed.
pub fn decode_message(bytes: &[u8]) -> Result<(SyncMessage, usize), ProtocolError> {
    let Some(&len) = bytes.first() else {
        return Err(ProtocolError::InsufficientData {
            needed: 1,
            available: 0,
        });
    };
    let total = 1 + usize::from(len);
    if bytes.len() < total {
        return Err(ProtocolError::InsufficientData {
            needed: total,
            available: bytes.len(),
        });
    }
    let msg = decode_frame_body(&bytes[1..total])?;
    Ok((msg, total))
}

/// Decodes a frame body (command byte plus payload) whose length prefix has
/// already been read.  Used by the stream reader.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the body is empty or malformed.
pub fn decode_frame_body(body: &[u8]) -> Result<SyncMessage, ProtocolError> {
    let Some((&cmd, payload)) = body.split_first() else {
        return Err(ProtocolError::MalformedPayload("empty frame".to_string()));
    };
    let command = Command::try_from(cmd).map_err(|_| ProtocolError::UnknownCommand(cmd))?;
    match command {
        Command::Hello => {
            require_len(payload, 8, "Hello")?;
            Ok(SyncMessage::Hello {
                protocol_version: read_u32(payload, 0)?,
                lib_version: read_u32(payload, 4)?,
            })
        }
        Command::Ping => Ok(SyncMessage::Ping),
        Command::StartDeviceSync => {
            require_len(payload, 2, "StartDeviceSync")?;
            Ok(SyncMessage::StartDeviceSync {
                device_type: read_device_type(payload[0])?,
                index: payload[1],
            })
        }
        Command::SetDeviceButton => {
            // 1 (type) + 1 (index) + 4 (button) + 1 (tag) + at least 1 (value)
            require_len(payload, 8, "SetDeviceButton")?;
            Ok(SyncMessage::SetDeviceButton {
                device_type: read_device_type(payload[0])?,
                index: payload[1],
                button: read_u32(payload, 2)?,
                value: read_value(&payload[6..])?,
            })
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn write_value(buf: &mut Vec<u8>, value: ButtonValue) {
    match value {
        ButtonValue::Bool(b) => {
            buf.push(VALUE_TAG_BOOL);
            buf.push(u8::from(b));
        }
        ButtonValue::Float(f) => {
            buf.push(VALUE_TAG_FLOAT);
            buf.extend_from_slice(&f.to_be_bytes());
        }
    }
}

fn read_value(p: &[u8]) -> Result<ButtonValue, ProtocolError> {
    match p[0] {
        VALUE_TAG_BOOL => {
            require_len(p, 2, "bool value")?;
            Ok(ButtonValue::Bool(p[1] != 0))
        }
        VALUE_TAG_FLOAT => {
            require_len(p, 5, "float value")?;
            Ok(ButtonValue::Float(f32::from_be_bytes([p[1], p[2], p[3], p[4]])))
        }
        tag => Err(ProtocolError::MalformedPayload(format!(
            "unknown value tag: 0x{tag:02X}"
        ))),
    }
}

fn read_device_type(byte: u8) -> Result<DeviceType, ProtocolError> {
    DeviceType::from_u8(byte).ok_or_else(|| {
        ProtocolError::MalformedPayload(format!("unknown device type: {byte}"))
    })
}

fn require_len(buf: &[u8], needed: usize, context: &str) -> Result<(), ProtocolError> {
    if buf.len() < needed {
        Err(ProtocolError::MalformedPayload(format!(
            "{context}: need {needed} bytes, got {}",
            buf.len()
        )))
    } else {
        Ok(())
    }
}

fn read_u32(buf: &[u8], offset: usize) -> Result<u32, ProtocolError> {
    if buf.len() < offset + 4 {
        return Err(ProtocolError::InsufficientData {
            needed: offset + 4,
            available: buf.len(),
        });
    }
    Ok(u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{LIB_VERSION, PROTOCOL_VERSION};

    #[test]
    fn test_set_device_button_float_wire_layout() {
        // Arrange
        let msg = SyncMessage::SetDeviceButton {
            device_type: DeviceType::Mouse,
            index: 2,
            button: 0x0102_0304,
            value: ButtonValue::Float(1.0),
        };

        // Act
        let bytes = encode_message(&msg).unwrap();

        // Assert
        assert_eq!(
            bytes,
            [
                12,   // len: command + 11 payload bytes
                0x04, // SetDeviceButton
                DeviceType::Mouse.as_u8(),
                2,
                0x01, 0x02, 0x03, 0x04, // button
                VALUE_TAG_FLOAT,
                0x3F, 0x80, 0x00, 0x00, // 1.0f32
            ]
        );
    }

    #[test]
    fn test_hello_wire_layout() {
        // Act
        let bytes = encode_message(&SyncMessage::hello()).unwrap();

        // Assert
        assert_eq!(bytes[0], 9);
        assert_eq!(bytes[1], Command::Hello as u8);
        assert_eq!(&bytes[2..6], &PROTOCOL_VERSION.to_be_bytes());
        assert_eq!(&bytes[6..10], &LIB_VERSION.to_be_bytes());
    }

    #[test]
    fn test_decode_reports_consumed_bytes_for_back_to_back_frames() {
        // Arrange
        let mut stream = encode_message(&SyncMessage::StartDeviceSync {
            device_type: DeviceType::Keyboard,
            index: 0,
        })
        .unwrap();
        stream.extend(encode_message(&SyncMessage::Ping).unwrap());

        // Act
        let (first, n) = decode_message(&stream).unwrap();
        let (second, m) = decode_message(&stream[n..]).unwrap();

        // Assert
        assert_eq!(
            first,
            SyncMessage::StartDeviceSync {
                device_type: DeviceType::Keyboard,
                index: 0
            }
        );
        assert_eq!(second, SyncMessage::Ping);
        assert_eq!(n + m, stream.len());
    }

    #[test]
    fn test_decode_truncated_frame_is_insufficient_data() {
        // Arrange
        let bytes = encode_message(&SyncMessage::hello()).unwrap();

        // Act
        let result = decode_message(&bytes[..5]);

        // Assert
        assert_eq!(
            result,
            Err(ProtocolError::InsufficientData {
                needed: 10,
                available: 5
            })
        );
    }

    #[test]
    fn test_decode_empty_input_is_insufficient_data() {
        assert!(matches!(
            decode_message(&[]),
            Err(ProtocolError::InsufficientData { needed: 1, .. })
        ));
    }

    #[test]
    fn test_decode_unknown_command() {
        assert_eq!(
            decode_message(&[0x01, 0x7F]),
            Err(ProtocolError::UnknownCommand(0x7F))
        );
    }

    #[test]
    fn test_decode_zero_length_frame_is_malformed() {
        assert!(matches!(
            decode_message(&[0x00]),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_unknown_device_type_is_malformed() {
        assert!(matches!(
            decode_message(&[0x03, 0x03, 0xEE, 0x00]),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_unknown_value_tag_is_malformed() {
        // Arrange: SetDeviceButton for keyboard 0, button 5, tag 0x09
        let bytes = [9, 0x04, DeviceType::Keyboard.as_u8(), 0, 0, 0, 0, 5, 0x09, 0x01];

        // Act / Assert
        assert!(matches!(
            decode_message(&bytes),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_nonzero_bool_byte_reads_as_true() {
        // Arrange
        let bytes = [9, 0x04, DeviceType::Pad.as_u8(), 1, 0, 0, 0, 7, VALUE_TAG_BOOL, 0xFF];

        // Act
        let (msg, _) = decode_message(&bytes).unwrap();

        // Assert
        assert_eq!(
            msg,
            SyncMessage::SetDeviceButton {
                device_type: DeviceType::Pad,
                index: 1,
                button: 7,
                value: ButtonValue::Bool(true),
            }
        );
    }
}
