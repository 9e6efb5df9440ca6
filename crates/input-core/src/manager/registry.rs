//! Device registry: id allocation, lookup and two-phase removal.
//!
//! Devices live in a slot table indexed by [`DeviceId`].  Ids are never
//! reused, so the table only grows; a removed device leaves an empty slot.
//!
//! # Removal (two phases)
//!
//! `remove` notifies the device listener immediately but leaves the device in
//! place.  The manager calls `apply_removals` at a safe point at the end of
//! its update, which moves the device out of the table and into the
//! *detached* set.  The registry never destroys a device: the owner can take
//! it back with `take_detached` and later re-register it under the same id
//! with `add`.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::devices::{
    DeviceEvent, DeviceKind, DeviceListener, DeviceType, DeviceVariant, InputDevice,
};
use crate::domain::ids::{DeviceId, DeviceIndex};

/// Misuse of [`DeviceRegistry::add`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{0} is already registered")]
    AlreadyRegistered(DeviceId),

    #[error("{0} was not allocated by this manager")]
    ForeignDevice(DeviceId),
}

#[derive(Default)]
pub struct DeviceRegistry {
    slots: Vec<Option<InputDevice>>,
    pending_removal: Vec<DeviceId>,
    detached: HashMap<DeviceId, InputDevice>,
    listener: Option<Box<dyn DeviceListener>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    pub fn get(&self, id: DeviceId) -> Option<&InputDevice> {
        self.slots.get(id.slot()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: DeviceId) -> Option<&mut InputDevice> {
        self.slots.get_mut(id.slot()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.get(id).is_some()
    }

    /// Registered devices in id order.
    pub fn iter(&self) -> impl Iterator<Item = &InputDevice> {
        self.slots.iter().flatten()
    }

    /// Number of registered devices, including those pending removal.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn find_device_id(&self, device_type: DeviceType, index: u32) -> Option<DeviceId> {
        self.iter()
            .find(|d| d.device_type() == device_type && d.index() == index)
            .map(InputDevice::id)
    }

    pub fn find_device_id_by_name(&self, type_name: &str, index: u32) -> Option<DeviceId> {
        self.iter()
            .find(|d| d.type_name() == type_name && d.index() == index)
            .map(InputDevice::id)
    }

    pub fn device_count_by_type(&self, device_type: DeviceType) -> u32 {
        self.iter()
            .filter(|d| d.device_type() == device_type)
            .count() as u32
    }

    pub fn is_pending_removal(&self, id: DeviceId) -> bool {
        self.pending_removal.contains(&id)
    }

    // ── Registration ──────────────────────────────────────────────────────────

    pub(crate) fn create(
        &mut self,
        kind: DeviceKind,
        index: DeviceIndex,
        variant: DeviceVariant,
    ) -> DeviceId {
        self.create_and_get(kind, index, variant).id()
    }

    pub(crate) fn create_and_get(
        &mut self,
        kind: DeviceKind,
        index: DeviceIndex,
        variant: DeviceVariant,
    ) -> &mut InputDevice {
        let device_type = kind.device_type();
        let index = match index {
            DeviceIndex::Fixed(i) => i,
            DeviceIndex::Auto => self.device_count_by_type(device_type),
        };
        let id = DeviceId::from_raw(self.slots.len() as u32);
        info!(device = %id, %device_type, index, ?variant, "device created");
        self.slots.push(None);
        let device = self.slots[id.slot()].insert(InputDevice::new(id, index, variant, kind));
        notify(&mut self.listener, id, DeviceEvent::Added);
        device
    }

    /// Re-registers a device previously taken out with [`take_detached`].
    ///
    /// [`take_detached`]: DeviceRegistry::take_detached
    pub(crate) fn add(&mut self, device: InputDevice) -> Result<DeviceId, RegistryError> {
        let id = device.id();
        let slot = self
            .slots
            .get_mut(id.slot())
            .ok_or(RegistryError::ForeignDevice(id))?;
        if slot.is_some() {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        *slot = Some(device);
        info!(device = %id, "device re-added");
        self.notify(id, DeviceEvent::Added);
        Ok(id)
    }

    /// Marks `id` for removal.  No-op for unknown ids and repeated calls.
    pub(crate) fn remove(&mut self, id: DeviceId) -> bool {
        if !self.contains(id) || self.is_pending_removal(id) {
            return false;
        }
        self.notify(id, DeviceEvent::Removed);
        self.pending_removal.push(id);
        true
    }

    /// Detaches every device marked for removal.  Returns how many moved.
    pub(crate) fn apply_removals(&mut self) -> usize {
        let mut moved = 0;
        for id in std::mem::take(&mut self.pending_removal) {
            if let Some(device) = self.slots.get_mut(id.slot()).and_then(Option::take) {
                info!(device = %id, "device removed");
                self.detached.insert(id, device);
                moved += 1;
            }
        }
        moved
    }

    /// Hands ownership of a removed device back to the caller.
    pub fn take_detached(&mut self, id: DeviceId) -> Option<InputDevice> {
        self.detached.remove(&id)
    }

    pub fn detached_count(&self) -> usize {
        self.detached.len()
    }

    // ── Device listener ───────────────────────────────────────────────────────

    pub(crate) fn set_listener(&mut self, listener: Option<Box<dyn DeviceListener>>) {
        self.listener = listener;
    }

    fn notify(&mut self, id: DeviceId, event: DeviceEvent) {
        notify(&mut self.listener, id, event);
    }

    // ── Update support ────────────────────────────────────────────────────────

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Moves a device out of its slot so it can update while the rest of the
    /// registry stays readable.  Must be paired with [`restore_slot`].
    ///
    /// [`restore_slot`]: DeviceRegistry::restore_slot
    pub(crate) fn take_slot(&mut self, slot: usize) -> Option<InputDevice> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    pub(crate) fn restore_slot(&mut self, device: InputDevice) {
        let slot = device.id().slot();
        if let Some(entry) = self.slots.get_mut(slot) {
            debug_assert!(entry.is_none(), "slot {slot} restored twice");
            *entry = Some(device);
        }
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut InputDevice> {
        self.slots.iter_mut().flatten()
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.len())
            .field("pending_removal", &self.pending_removal)
            .field("detached", &self.detached.len())
            .finish()
    }
}

fn notify(listener: &mut Option<Box<dyn DeviceListener>>, id: DeviceId, event: DeviceEvent) {
    if let Some(listener) = listener.as_mut() {
        debug!(device = %id, ?event, "notifying device listener");
        listener.on_device_event(id, event);
    }
}
