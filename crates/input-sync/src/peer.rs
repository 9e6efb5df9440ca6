//! Pieces shared by both ends of the `input-sync` binary.
//!
//! Sync addresses devices by `(type, index)`, so a sender and a receiver
//! only agree on which device is which if both create the same devices in
//! the same order.  [`create_configured_devices`] does that from the
//! `[devices]` config section.  [`FrameTicker`] drives the frame loop at the
//! configured rate and measures the real delta handed to
//! `InputManager::update`.

use std::time::{Duration, Instant};

use input_core::{
    BuiltInSensors, DeviceId, DeviceIndex, DeviceVariant, InputManager, Keyboard, Mouse, Pad,
    Touch,
};
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::info;

use crate::config::DevicesConfig;

/// Creates the devices listed in `devices`, in a fixed order, so two peers
/// with the same configuration agree on every device's type and index.
pub fn create_configured_devices(manager: &mut InputManager, devices: &DevicesConfig) -> Vec<DeviceId> {
    let mut ids = Vec::new();
    if devices.keyboard {
        ids.push(manager.create_device::<Keyboard>(DeviceIndex::Auto, DeviceVariant::Standard));
    }
    if devices.mouse {
        ids.push(manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard));
    }
    if devices.raw_mouse {
        ids.push(manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Raw));
    }
    for _ in 0..devices.pads {
        ids.push(manager.create_device::<Pad>(DeviceIndex::Auto, DeviceVariant::Standard));
    }
    if devices.touch {
        ids.push(manager.create_device::<Touch>(DeviceIndex::Auto, DeviceVariant::Standard));
    }
    if devices.builtin {
        ids.push(manager.create_device::<BuiltInSensors>(DeviceIndex::Auto, DeviceVariant::Standard));
    }
    info!(count = ids.len(), "created configured devices");
    ids
}

/// Time between frames at `rate_hz`.  A rate of 0 is treated as 1.
pub fn frame_period(rate_hz: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1)))
}

/// Paces the frame loop and measures the real time between frames.
#[derive(Debug)]
pub struct FrameTicker {
    interval: Interval,
    last: Option<Instant>,
}

impl FrameTicker {
    pub fn new(rate_hz: u32) -> Self {
        let mut interval = time::interval(frame_period(rate_hz));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            last: None,
        }
    }

    /// Waits for the next frame and returns the seconds since the previous
    /// one (0 for the first frame).
    pub async fn tick(&mut self) -> f32 {
        self.interval.tick().await;
        let now = Instant::now();
        let delta = self
            .last
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last = Some(now);
        delta
    }
}
