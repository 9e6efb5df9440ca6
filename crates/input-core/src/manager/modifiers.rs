//! Post-pass modifiers.
//!
//! A modifier runs once per update, after every regular device has updated
//! and the frame's queued changes have been applied.  It reads the
//! registry and writes derived state by pushing [`Change`]s; the manager
//! applies those right after the modifier returns, before the next modifier
//! runs.  Unlike listeners, modifiers cannot stop each other: all of them run,
//! in descending priority order.

use crate::devices::InputDevice;
use crate::domain::change::Change;
use crate::domain::ids::{DeviceButtonId, DeviceId, ModifierId};
use crate::manager::clock::FrameTime;
use crate::manager::listeners::PriorityList;
use crate::manager::registry::DeviceRegistry;
use crate::queue::ChangeQueue;

pub trait DeviceStateModifier: Send {
    fn update(&mut self, ctx: &mut ModifierContext<'_>);

    fn priority(&self) -> i32 {
        0
    }
}

/// Registry mutations a modifier asked for.  Applied by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModifierRequest {
    SetSynced(DeviceId, bool),
    RemoveDevice(DeviceId),
}

/// What a modifier may see and do during its pass.
pub struct ModifierContext<'a> {
    devices: &'a DeviceRegistry,
    queue: &'a ChangeQueue,
    requests: &'a mut Vec<ModifierRequest>,
    time: FrameTime,
}

impl<'a> ModifierContext<'a> {
    pub(crate) fn new(
        devices: &'a DeviceRegistry,
        queue: &'a ChangeQueue,
        requests: &'a mut Vec<ModifierRequest>,
        time: FrameTime,
    ) -> Self {
        Self {
            devices,
            queue,
            requests,
            time,
        }
    }

    pub fn devices(&self) -> &'a DeviceRegistry {
        self.devices
    }

    pub fn device(&self, id: DeviceId) -> Option<&'a InputDevice> {
        self.devices.get(id)
    }

    pub fn delta_time(&self) -> f32 {
        self.time.delta_time
    }

    /// Manager time in milliseconds at the start of this update.
    pub fn time_ms(&self) -> u64 {
        self.time.time_ms
    }

    /// Queues a change.  It is applied and dispatched as soon as this
    /// modifier returns, synced or not.
    pub fn push(&mut self, change: Change) {
        self.queue.push(change.injected());
    }

    pub fn set_bool(&mut self, device: DeviceId, button: impl Into<DeviceButtonId>, value: bool) {
        self.push(Change::bool(device, button, value));
    }

    pub fn set_float(&mut self, device: DeviceId, button: impl Into<DeviceButtonId>, value: f32) {
        self.push(Change::float(device, button, value));
    }

    /// Marks a device as mirrored (or no longer mirrored).
    pub fn set_synced(&mut self, device: DeviceId, synced: bool) {
        self.requests.push(ModifierRequest::SetSynced(device, synced));
    }

    /// Requests removal.  The device stays visible until the end of the
    /// current update.
    pub fn remove_device(&mut self, device: DeviceId) {
        self.requests.push(ModifierRequest::RemoveDevice(device));
    }
}

#[derive(Default)]
pub struct ModifierRegistry {
    list: PriorityList<dyn DeviceStateModifier>,
}

impl ModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, modifier: Box<dyn DeviceStateModifier>) -> ModifierId {
        let priority = modifier.priority();
        ModifierId(self.list.insert(modifier, priority))
    }

    pub fn remove(&mut self, id: ModifierId) -> Option<Box<dyn DeviceStateModifier>> {
        self.list.remove(id.0)
    }

    pub fn reorder(&mut self) {
        self.list.reprioritize(|m| m.priority());
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn DeviceStateModifier + 'static)> {
        self.list.iter_mut()
    }
}

impl std::fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModifierRegistry")
            .field("modifiers", &self.len())
            .finish()
    }
}
