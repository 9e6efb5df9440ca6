//! Platform capture plug-in point.
//!
//! A [`DeviceBackend`] is whatever actually talks to the OS for one device: a
//! Win32 raw-input pump, an evdev reader, a HID callback.  The core never
//! depends on platform headers; a new platform plugs in purely by
//! implementing this trait and attaching it with `attach_backend`.
//!
//! # Foreign-thread capture
//!
//! Many platforms deliver input on a thread the application does not own (HID
//! report callbacks, sensor listeners).  Such code must never touch a state
//! buffer.  [`ChannelBackend`] gives it a [`ButtonFeed`] instead: the capture
//! thread pushes `(button, value)` pairs into a device-local queue, and the
//! backend applies them on the owning thread when the device updates.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::devices::{DeviceStatus, DeviceUpdate};
use crate::domain::ids::DeviceButtonId;
use crate::domain::value::ButtonValue;
use crate::queue::{ChangeProducer, ChangeQueue};

/// Source of platform input for one device.
///
/// `poll` runs on the manager's thread inside the device's update and must
/// not block.  Capture that can stall belongs on its own thread, feeding a
/// queue.
pub trait DeviceBackend: Send {
    fn status(&self) -> DeviceStatus {
        DeviceStatus::Ok
    }

    fn poll(&mut self, update: &mut DeviceUpdate<'_>);
}

const STATUS_OK: u8 = 0;
const STATUS_LOW_BATTERY: u8 = 1;
const STATUS_UNAVAILABLE: u8 = 2;

fn encode_status(status: DeviceStatus) -> u8 {
    match status {
        DeviceStatus::Ok => STATUS_OK,
        DeviceStatus::LowBattery => STATUS_LOW_BATTERY,
        DeviceStatus::Unavailable => STATUS_UNAVAILABLE,
    }
}

fn decode_status(raw: u8) -> DeviceStatus {
    match raw {
        STATUS_OK => DeviceStatus::Ok,
        STATUS_LOW_BATTERY => DeviceStatus::LowBattery,
        _ => DeviceStatus::Unavailable,
    }
}

/// Backend that applies values pushed from another thread.
#[derive(Debug)]
pub struct ChannelBackend {
    queue: ChangeQueue<(DeviceButtonId, ButtonValue)>,
    status: Arc<AtomicU8>,
}

/// Thread-safe handle a capture thread uses to feed a [`ChannelBackend`].
#[derive(Debug, Clone)]
pub struct ButtonFeed {
    producer: ChangeProducer<(DeviceButtonId, ButtonValue)>,
    status: Arc<AtomicU8>,
}

impl ChannelBackend {
    /// Creates the backend and the feed that drives it.
    pub fn new() -> (Self, ButtonFeed) {
        let queue = ChangeQueue::new();
        let status = Arc::new(AtomicU8::new(STATUS_OK));
        let feed = ButtonFeed {
            producer: queue.producer(),
            status: Arc::clone(&status),
        };
        (Self { queue, status }, feed)
    }
}

impl DeviceBackend for ChannelBackend {
    fn status(&self) -> DeviceStatus {
        decode_status(self.status.load(Ordering::Relaxed))
    }

    fn poll(&mut self, update: &mut DeviceUpdate<'_>) {
        for (button, value) in self.queue.drain() {
            update.set(button, value);
        }
    }
}

impl ButtonFeed {
    /// Queues a value.  Returns `false` once the backend has been dropped.
    pub fn push(&self, button: impl Into<DeviceButtonId>, value: ButtonValue) -> bool {
        self.producer.push((button.into(), value))
    }

    pub fn push_bool(&self, button: impl Into<DeviceButtonId>, value: bool) -> bool {
        self.push(button, ButtonValue::Bool(value))
    }

    pub fn push_float(&self, button: impl Into<DeviceButtonId>, value: f32) -> bool {
        self.push(button, ButtonValue::Float(value))
    }

    /// Reports hardware status, e.g. `Unavailable` after an unplug.
    pub fn set_status(&self, status: DeviceStatus) {
        self.status.store(encode_status(status), Ordering::Relaxed);
    }
}
