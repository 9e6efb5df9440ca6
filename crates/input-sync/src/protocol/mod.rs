//! Protocol module containing the sync message types and the binary codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_frame_body, decode_message, encode_message, ProtocolError};
pub use messages::*;
