//! The input manager: device ownership and the per-frame update.
//!
//! # One frame (for beginners)
//!
//! [`InputManager::update`] is called once per frame on the thread that owns
//! the manager.  It runs these steps, in this order, every time:
//!
//! 1. **Snapshot**: every device copies current state into previous state.
//! 2. **Regular devices**: each device that is not a late-update device
//!    updates in id order (resets pulses, polls its backend).
//! 3. **Queued changes**: everything pushed through a [`ChangeProducer`]
//!    since the last frame is applied and dispatched, in arrival order.
//! 4. **Modifiers**: each modifier runs in priority order; the changes it
//!    pushes are applied before the next modifier starts.
//! 5. **Late devices**: devices that depend on the modifiers' output, such
//!    as gesture recognizers.
//! 6. **Removals**: devices removed during the frame are detached.
//! 7. **Clock**: manager time advances by the frame's delta.
//!
//! Listeners are notified as each step commits a change, so a listener always
//! sees a value that is already in the device's current state, and always
//! after that device's previous state was snapshotted for the frame.
//!
//! # Threads
//!
//! Only the owning thread touches devices and listeners.  Any other thread
//! writes input by cloning a [`ChangeProducer`] from
//! [`InputManager::change_producer`] and pushing [`Change`]s.
//!
//! While a device is synced, local changes for it are dropped when applied.
//! Changes pushed by modifiers (network sync, playback) are injected and
//! still apply.

pub mod clock;
pub mod listeners;
pub mod modifiers;
pub mod registry;

use tracing::{debug, trace, warn};

use crate::config::ManagerConfig;
use crate::devices::{
    BuiltInDevice, CustomDevice, DeviceBackend, DeviceKind, DeviceListener, DeviceType,
    DeviceVariant, InputDevice,
};
use crate::domain::change::Change;
use crate::domain::delta::DeltaState;
use crate::domain::state::StateBuffer;
use crate::domain::ids::{
    DeviceButtonId, DeviceButtonSpec, DeviceId, DeviceIndex, ListenerId, ModifierId,
};
use crate::domain::value::ButtonValue;
use crate::queue::{ChangeProducer, ChangeQueue};

use clock::{Clock, FrameClock, FrameTime};
use listeners::{InputListener, ListenerRegistry};
use modifiers::{DeviceStateModifier, ModifierContext, ModifierRegistry, ModifierRequest};
use registry::{DeviceRegistry, RegistryError};

#[derive(Debug)]
pub struct InputManager {
    config: ManagerConfig,
    registry: DeviceRegistry,
    listeners: ListenerRegistry,
    modifiers: ModifierRegistry,
    queue: ChangeQueue,
    delta: DeltaState,
    requests: Vec<ModifierRequest>,
    clock: FrameClock,
    display_size: (u32, u32),
    frame: u64,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            display_size: (config.display_width, config.display_height),
            config,
            registry: DeviceRegistry::new(),
            listeners: ListenerRegistry::new(),
            modifiers: ModifierRegistry::new(),
            queue: ChangeQueue::new(),
            delta: DeltaState::new(),
            requests: Vec::new(),
            clock: FrameClock::default(),
            frame: 0,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // ── Devices ───────────────────────────────────────────────────────────────

    /// Creates a built-in device and returns its id.
    ///
    /// ```rust
    /// use input_core::{DeviceIndex, DeviceVariant, InputManager, Keyboard, Mouse};
    ///
    /// let mut manager = InputManager::new();
    /// let keyboard = manager.create_device::<Keyboard>(DeviceIndex::Auto, DeviceVariant::Standard);
    /// let mouse = manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
    /// assert_eq!((keyboard.as_u32(), mouse.as_u32()), (0, 1));
    /// ```
    pub fn create_device<T: BuiltInDevice>(
        &mut self,
        index: impl Into<DeviceIndex>,
        variant: DeviceVariant,
    ) -> DeviceId {
        self.registry.create(T::kind(), index.into(), variant)
    }

    pub fn create_and_get_device<T: BuiltInDevice>(
        &mut self,
        index: impl Into<DeviceIndex>,
        variant: DeviceVariant,
    ) -> &mut InputDevice {
        self.registry.create_and_get(T::kind(), index.into(), variant)
    }

    pub fn create_custom_device(
        &mut self,
        index: impl Into<DeviceIndex>,
        device: impl CustomDevice,
    ) -> DeviceId {
        self.registry.create(
            DeviceKind::Custom(Box::new(device)),
            index.into(),
            DeviceVariant::Standard,
        )
    }

    /// Attaches a platform backend.  Returns `false` for an unknown id.
    pub fn attach_backend(&mut self, id: DeviceId, backend: impl DeviceBackend + 'static) -> bool {
        match self.registry.get_mut(id) {
            Some(device) => {
                device.set_backend(Box::new(backend));
                true
            }
            None => false,
        }
    }

    /// Notifies the device listener now and detaches the device at the end
    /// of the next update.  No-op for unknown ids.
    pub fn remove_device(&mut self, id: DeviceId) -> bool {
        self.registry.remove(id)
    }

    /// Re-registers a device previously detached by [`remove_device`].
    ///
    /// [`remove_device`]: InputManager::remove_device
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the id is still registered or was not
    /// allocated by this manager.
    pub fn add_device(&mut self, device: InputDevice) -> Result<DeviceId, RegistryError> {
        self.registry.add(device)
    }

    pub fn take_detached_device(&mut self, id: DeviceId) -> Option<InputDevice> {
        self.registry.take_detached(id)
    }

    pub fn get_device(&self, id: DeviceId) -> Option<&InputDevice> {
        self.registry.get(id)
    }

    pub fn get_device_mut(&mut self, id: DeviceId) -> Option<&mut InputDevice> {
        self.registry.get_mut(id)
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn find_device_id(&self, device_type: DeviceType, index: u32) -> Option<DeviceId> {
        self.registry.find_device_id(device_type, index)
    }

    pub fn find_device_id_by_name(&self, type_name: &str, index: u32) -> Option<DeviceId> {
        self.registry.find_device_id_by_name(type_name, index)
    }

    pub fn device_count(&self) -> usize {
        self.registry.len()
    }

    pub fn device_count_by_type(&self, device_type: DeviceType) -> u32 {
        self.registry.device_count_by_type(device_type)
    }

    /// Installs the device add/remove observer, replacing any previous one.
    pub fn set_device_listener(&mut self, listener: impl DeviceListener + 'static) {
        self.registry.set_listener(Some(Box::new(listener)));
    }

    pub fn clear_device_listener(&mut self) {
        self.registry.set_listener(None);
    }

    /// Marks a device as mirrored from a remote peer.
    pub fn set_synced(&mut self, id: DeviceId, synced: bool) -> bool {
        match self.registry.get_mut(id) {
            Some(device) => {
                device.set_synced(synced);
                true
            }
            None => false,
        }
    }

    // ── Listeners and modifiers ───────────────────────────────────────────────

    pub fn add_listener(&mut self, listener: impl InputListener + 'static) -> ListenerId {
        self.listeners.add(Box::new(listener))
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id).is_some()
    }

    /// Re-sorts listeners after their priorities changed.
    pub fn reorder_listeners(&mut self) {
        self.listeners.reorder();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn add_device_state_modifier(
        &mut self,
        modifier: impl DeviceStateModifier + 'static,
    ) -> ModifierId {
        self.modifiers.add(Box::new(modifier))
    }

    pub fn remove_device_state_modifier(&mut self, id: ModifierId) -> bool {
        self.modifiers.remove(id).is_some()
    }

    pub fn reorder_device_state_modifiers(&mut self) {
        self.modifiers.reorder();
    }

    pub fn device_state_modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    // ── Changes ───────────────────────────────────────────────────────────────

    /// Returns a handle other threads use to push changes.
    pub fn change_producer(&self) -> ChangeProducer {
        self.queue.producer()
    }

    /// Queues a change from the owning thread.  Applied in the next update.
    pub fn push_change(&self, change: Change) {
        self.queue.push(change);
    }

    /// Queues native input for the device addressed by `(device_type, index)`.
    ///
    /// Returns `false` without queuing when no such device exists or it is
    /// synced.  The change is re-checked when applied, so input queued just
    /// before a device becomes synced is dropped too.
    pub fn handle_device_input(
        &self,
        device_type: DeviceType,
        index: u32,
        button: impl Into<DeviceButtonId>,
        value: ButtonValue,
    ) -> bool {
        let Some(device) = self
            .registry
            .find_device_id(device_type, index)
            .and_then(|id| self.registry.get(id))
        else {
            return false;
        };
        if device.is_synced() {
            return false;
        }
        self.queue.push(Change::new(device.id(), button, value));
        true
    }

    pub fn pending_changes(&self) -> usize {
        self.queue.pending()
    }

    // ── Frame ─────────────────────────────────────────────────────────────────

    /// Runs one frame.  `delta_time` is in seconds.
    pub fn update(&mut self, delta_time: f32) {
        let time = FrameTime {
            delta_time,
            time_ms: self.clock.now_ms(),
        };

        for device in self.registry.iter_mut() {
            device.snapshot();
        }

        self.update_devices(false, time);

        let applied = self.apply_queued();
        trace!(frame = self.frame, applied, "applied queued changes");

        self.run_modifiers(time);

        self.update_devices(true, time);

        let removed = self.registry.apply_removals();
        if removed > 0 {
            debug!(frame = self.frame, removed, "detached removed devices");
        }

        self.clock.advance(delta_time);
        self.frame += 1;
    }

    /// Manager time in milliseconds.
    pub fn time_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Shareable read handle to manager time.
    pub fn clock(&self) -> Clock {
        self.clock.handle()
    }

    /// Number of completed updates.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn set_display_size(&mut self, width: u32, height: u32) {
        self.display_size = (width, height);
    }

    pub fn display_size(&self) -> (u32, u32) {
        self.display_size
    }

    // ── Queries and bulk operations ───────────────────────────────────────────

    /// Appends up to `max` held boolean buttons across all devices to `out`
    /// and returns how many were appended.
    pub fn get_any_button_down(&self, out: &mut Vec<DeviceButtonSpec>, max: usize) -> usize {
        let mut found = 0;
        for device in self.registry.iter() {
            for button in device.buttons_down() {
                if found == max {
                    return found;
                }
                out.push(DeviceButtonSpec {
                    device_id: device.id(),
                    button_id: button,
                });
                found += 1;
            }
        }
        found
    }

    /// Releases every button and zeroes every axis of one device.
    ///
    /// The current-state reset is dispatched to listeners; the previous state
    /// is reset silently so the next frame does not report a release.
    pub fn clear_all_states(&mut self, id: DeviceId) -> bool {
        let Some(device) = self.registry.get(id) else {
            return false;
        };
        let resets = |state: &StateBuffer| -> Vec<Change> {
            state
                .iter()
                .filter(|(_, value)| !value.is_default())
                .map(|(button, value)| Change::new(id, button, value.button_type().default_value()))
                .collect()
        };
        let current = resets(device.current_state());
        let previous: Vec<Change> = resets(device.previous_state())
            .into_iter()
            .map(Change::to_previous)
            .collect();
        let resets = current.into_iter().chain(previous).map(Change::injected);
        let observed = self.observed();
        for change in resets {
            apply_change(&mut self.registry, observed.then_some(&mut self.delta), change);
        }
        flush(&mut self.delta, &mut self.listeners);
        true
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn observed(&self) -> bool {
        !self.listeners.is_empty() || self.config.record_deltas_without_listeners
    }

    fn update_devices(&mut self, late: bool, time: FrameTime) {
        let observed = self.observed();
        for slot in 0..self.registry.slot_count() {
            let Some(mut device) = self.registry.take_slot(slot) else {
                continue;
            };
            if device.is_late_update() == late {
                device.update(&self.registry, observed.then_some(&mut self.delta), time);
            }
            self.registry.restore_slot(device);
            flush(&mut self.delta, &mut self.listeners);
        }
    }

    fn apply_queued(&mut self) -> usize {
        let observed = self.observed();
        let mut applied = 0;
        for change in self.queue.drain() {
            applied += 1;
            apply_change(&mut self.registry, observed.then_some(&mut self.delta), change);
            flush(&mut self.delta, &mut self.listeners);
        }
        if applied > self.config.queue_warn_threshold {
            warn!(
                applied,
                threshold = self.config.queue_warn_threshold,
                "large change backlog applied in one frame"
            );
        }
        applied
    }

    fn run_modifiers(&mut self, time: FrameTime) {
        if self.modifiers.is_empty() {
            return;
        }
        let mut modifiers = std::mem::take(&mut self.modifiers);
        for modifier in modifiers.iter_mut() {
            {
                let mut ctx =
                    ModifierContext::new(&self.registry, &self.queue, &mut self.requests, time);
                modifier.update(&mut ctx);
            }
            self.apply_requests();
            self.apply_queued();
        }
        self.modifiers = modifiers;
    }

    fn apply_requests(&mut self) {
        let mut requests = std::mem::take(&mut self.requests);
        for request in requests.drain(..) {
            match request {
                ModifierRequest::SetSynced(id, synced) => {
                    self.set_synced(id, synced);
                }
                ModifierRequest::RemoveDevice(id) => {
                    self.registry.remove(id);
                }
            }
        }
        self.requests = requests;
    }
}

/// Writes one change into its target buffer and logs the transition.
///
/// Invalid changes are programmer errors on the producer side; they are
/// dropped with a warning rather than aborting the frame.
fn apply_change(registry: &mut DeviceRegistry, delta: Option<&mut DeltaState>, change: Change) -> bool {
    let Some(device) = registry.get_mut(change.device) else {
        warn!(device = %change.device, button = change.button, "dropping change for unknown device");
        return false;
    };
    if change.is_local() && device.is_synced() {
        trace!(device = %change.device, button = change.button, "dropping local input for synced device");
        return false;
    }
    let state = device.state_mut(change.target);
    let old = match state.get(change.button) {
        Ok(old) => old,
        Err(e) => {
            warn!(device = %change.device, "dropping change: {e}");
            return false;
        }
    };
    if let Err(e) = state.set(change.button, change.value) {
        warn!(device = %change.device, "dropping change: {e}");
        return false;
    }
    if change.record && old != change.value {
        if let Some(delta) = delta {
            delta.add_change(change.device, change.button, old, change.value);
        }
    }
    true
}

fn flush(delta: &mut DeltaState, listeners: &mut ListenerRegistry) {
    for change in delta.drain() {
        listeners.dispatch(&change);
    }
}
