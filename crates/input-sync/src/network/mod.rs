//! Network state sync.
//!
//! Architecture:
//! - [`StateSyncClient`] connects to a peer and mirrors the committed changes
//!   of selected local devices.  It is an input listener on the sending
//!   manager; a writer task owns the socket.
//! - [`StateSyncServer`] accepts peers.  Reader tasks decode frames into a
//!   change queue, and a device state modifier on the receiving manager
//!   drains it once per frame, so mirrored input enters the frame at the
//!   same point as every other modifier output.

pub mod client;
pub mod server;

use std::net::SocketAddr;

use input_core::DeviceId;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::protocol::{decode_frame_body, ProtocolError, SyncMessage};

pub use client::StateSyncClient;
pub use server::StateSyncServer;

/// Default TCP port for state sync.
pub const DEFAULT_PORT: u16 = 1211;

/// Errors that can occur in the sync network layer.
#[derive(Debug, Error)]
pub enum SyncError {
    /// TCP connection to the peer failed.
    #[error("failed to connect to peer at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// Binding the listening socket failed.
    #[error("bind failed on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// An I/O error occurred on an established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A frame could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// The device is not registered with the manager.
    #[error("unknown device: {0}")]
    UnknownDevice(DeviceId),
    /// Gestures are derived locally on each peer and are never mirrored.
    #[error("{0} is a gesture and cannot be synced")]
    GestureNotSyncable(DeviceId),
    /// The wire addresses devices with a one-byte index.
    #[error("{device} has index {index}, which does not fit the sync protocol")]
    IndexOutOfRange { device: DeviceId, index: u32 },
    /// The connection's writer task has stopped.
    #[error("not connected")]
    NotConnected,
}

/// Reads one frame.  Returns `Ok(None)` when the peer closed the stream
/// cleanly between frames.
pub(crate) async fn read_message<R>(reader: &mut R) -> Result<Option<SyncMessage>, SyncError>
where
    R: AsyncRead + Unpin,
{
    let mut len = [0u8; 1];
    match reader.read_exact(&mut len).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let mut body = vec![0u8; usize::from(len[0])];
    reader.read_exact(&mut body).await?;
    Ok(Some(decode_frame_body(&body)?))
}
