//! input-sync library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does input-sync do? (for beginners)
//!
//! `input-core` keeps a manager's devices consistent within one process.
//! This crate mirrors devices between two processes over TCP:
//!
//! 1. The sending peer connects and says `Hello`.
//! 2. For each device it wants to mirror it sends `StartDeviceSync` followed
//!    by the device's complete current state.
//! 3. From then on every committed change of that device is forwarded as a
//!    `SetDeviceButton` message.
//! 4. The receiving peer marks the matching local device synced, so its own
//!    backend cannot fight the remote input, and applies the changes inside
//!    its normal frame update.
//!
//! Devices are matched by type and per-type index, never by id.

/// TOML configuration file.
pub mod config;

/// TCP client and server for state sync.
pub mod network;

/// Frame pacing and device setup shared by both CLI modes.
pub mod peer;

/// Wire format.
pub mod protocol;

pub use network::{StateSyncClient, StateSyncServer, SyncError, DEFAULT_PORT};
pub use protocol::{ProtocolError, SyncMessage};
