//! The device model.
//!
//! # Built-in kinds and custom devices
//!
//! The platform device set is closed: keyboard, mouse, pad, touch and the
//! built-in sensors are variants of [`DeviceKind`] and share the layouts in
//! the submodules.  Anything else, such as gesture recognizers or emulated
//! devices, is a [`CustomDevice`] trait object stored in
//! [`DeviceKind::Custom`].
//!
//! Platform capture is not part of a device's kind.  It plugs in separately
//! as a [`DeviceBackend`], so the same keyboard model works whether it is fed
//! by a Win32 hook, an X11 event pump, the network receiver or a test.
//!
//! # Updating
//!
//! During its update a device only ever writes through a [`DeviceUpdate`],
//! which forwards every real change into the frame's delta log.  The update
//! context also gives read access to all *other* devices, which is what
//! gesture recognizers build on.

pub mod backend;
pub mod builtin;
pub mod keyboard;
pub mod mouse;
pub mod pad;
pub mod touch;

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use backend::{ButtonFeed, ChannelBackend, DeviceBackend};

use crate::domain::change::StateTarget;
use crate::domain::delta::DeltaState;
use crate::domain::ids::{DeviceButtonId, DeviceId};
use crate::domain::state::StateBuffer;
use crate::domain::value::{ButtonInfo, ButtonType, ButtonValue};
use crate::manager::clock::FrameTime;
use crate::manager::registry::DeviceRegistry;

// ── Classification ────────────────────────────────────────────────────────────

/// Broad device category, used for lookups and on the sync wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Mouse,
    Keyboard,
    Pad,
    Touch,
    BuiltIn,
    Gesture,
    Custom,
}

impl DeviceType {
    pub const ALL: [DeviceType; 7] = [
        DeviceType::Mouse,
        DeviceType::Keyboard,
        DeviceType::Pad,
        DeviceType::Touch,
        DeviceType::BuiltIn,
        DeviceType::Gesture,
        DeviceType::Custom,
    ];

    /// Default type name, as matched by `find_device_id_by_name`.
    pub const fn name(self) -> &'static str {
        match self {
            DeviceType::Mouse => "mouse",
            DeviceType::Keyboard => "keyboard",
            DeviceType::Pad => "pad",
            DeviceType::Touch => "touch",
            DeviceType::BuiltIn => "builtin",
            DeviceType::Gesture => "gesture",
            DeviceType::Custom => "custom",
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a device reports its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceVariant {
    #[default]
    Standard,
    /// Unfiltered, relative data (raw mouse motion).
    Raw,
    /// A placeholder with nothing behind it.  Always unavailable.
    Null,
}

/// Health of a device as reported to the application.
///
/// `Unavailable` is an ordinary state, not an error: the device keeps its id
/// and simply reads as released/zero until hardware appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    Ok,
    LowBattery,
    Unavailable,
}

/// Notification passed to a [`DeviceListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    Added,
    Removed,
}

/// Observer of device registration, installed with `set_device_listener`.
pub trait DeviceListener: Send {
    fn on_device_event(&mut self, device: DeviceId, event: DeviceEvent);
}

impl<F> DeviceListener for F
where
    F: FnMut(DeviceId, DeviceEvent) + Send,
{
    fn on_device_event(&mut self, device: DeviceId, event: DeviceEvent) {
        self(device, event)
    }
}

// ── Extension points ──────────────────────────────────────────────────────────

/// A platform device kind that `create_device::<T>()` can build.
pub trait BuiltInDevice {
    const DEVICE_TYPE: DeviceType;

    #[doc(hidden)]
    fn kind() -> DeviceKind;
}

/// A software-defined device with its own layout and update logic.
pub trait CustomDevice: Send + 'static {
    fn device_type(&self) -> DeviceType {
        DeviceType::Custom
    }

    fn type_name(&self) -> &str {
        self.device_type().name()
    }

    /// The device's button layout.  Must not change after creation.
    fn buttons(&self) -> &[ButtonInfo];

    /// Late devices update after the frame's modifiers have run.
    fn is_late_update(&self) -> bool {
        false
    }

    fn status(&self) -> DeviceStatus {
        DeviceStatus::Ok
    }

    fn update(&mut self, update: &mut DeviceUpdate<'_>);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// What a device is.
pub enum DeviceKind {
    Keyboard,
    Mouse,
    Pad,
    Touch,
    BuiltIn,
    Custom(Box<dyn CustomDevice>),
}

impl fmt::Debug for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Keyboard => f.write_str("Keyboard"),
            DeviceKind::Mouse => f.write_str("Mouse"),
            DeviceKind::Pad => f.write_str("Pad"),
            DeviceKind::Touch => f.write_str("Touch"),
            DeviceKind::BuiltIn => f.write_str("BuiltIn"),
            DeviceKind::Custom(c) => write!(f, "Custom({})", c.type_name()),
        }
    }
}

impl DeviceKind {
    pub(crate) fn device_type(&self) -> DeviceType {
        match self {
            DeviceKind::Keyboard => DeviceType::Keyboard,
            DeviceKind::Mouse => DeviceType::Mouse,
            DeviceKind::Pad => DeviceType::Pad,
            DeviceKind::Touch => DeviceType::Touch,
            DeviceKind::BuiltIn => DeviceType::BuiltIn,
            DeviceKind::Custom(c) => c.device_type(),
        }
    }

    fn layout(&self) -> &[ButtonInfo] {
        match self {
            DeviceKind::Keyboard => keyboard::LAYOUT,
            DeviceKind::Mouse => mouse::LAYOUT,
            DeviceKind::Pad => pad::LAYOUT,
            DeviceKind::Touch => touch::LAYOUT,
            DeviceKind::BuiltIn => builtin::LAYOUT,
            DeviceKind::Custom(c) => c.buttons(),
        }
    }
}

// ── InputDevice ───────────────────────────────────────────────────────────────

/// A registered device: identity, two state buffers and its behaviour.
pub struct InputDevice {
    id: DeviceId,
    index: u32,
    variant: DeviceVariant,
    synced: bool,
    current: StateBuffer,
    previous: StateBuffer,
    kind: DeviceKind,
    backend: Option<Box<dyn DeviceBackend>>,
}

impl fmt::Debug for InputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputDevice")
            .field("id", &self.id)
            .field("index", &self.index)
            .field("variant", &self.variant)
            .field("kind", &self.kind)
            .field("synced", &self.synced)
            .field("has_backend", &self.backend.is_some())
            .finish()
    }
}

impl InputDevice {
    pub(crate) fn new(id: DeviceId, index: u32, variant: DeviceVariant, kind: DeviceKind) -> Self {
        let current = StateBuffer::from_layout(kind.layout());
        Self {
            id,
            index,
            variant,
            synced: false,
            previous: current.clone(),
            current,
            kind,
            backend: None,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Index among devices of the same type.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn device_type(&self) -> DeviceType {
        self.kind.device_type()
    }

    pub fn type_name(&self) -> &str {
        match &self.kind {
            DeviceKind::Custom(c) => c.type_name(),
            other => other.device_type().name(),
        }
    }

    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    pub fn status(&self) -> DeviceStatus {
        if self.variant == DeviceVariant::Null {
            return DeviceStatus::Unavailable;
        }
        if let Some(backend) = &self.backend {
            return backend.status();
        }
        match &self.kind {
            DeviceKind::BuiltIn => DeviceStatus::Unavailable,
            DeviceKind::Custom(c) => c.status(),
            _ => DeviceStatus::Ok,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status() != DeviceStatus::Unavailable
    }

    pub fn is_late_update(&self) -> bool {
        match &self.kind {
            DeviceKind::Custom(c) => c.is_late_update(),
            _ => false,
        }
    }

    /// A synced device mirrors a remote peer; input from its own backend is
    /// discarded.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn set_synced(&mut self, synced: bool) {
        self.synced = synced;
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub(crate) fn set_backend(&mut self, backend: Box<dyn DeviceBackend>) {
        self.backend = Some(backend);
    }

    // ── Layout ────────────────────────────────────────────────────────────────

    pub fn button_count(&self) -> usize {
        self.current.len()
    }

    pub fn is_valid_button(&self, button: DeviceButtonId) -> bool {
        self.current.is_valid(button)
    }

    pub fn button_type(&self, button: DeviceButtonId) -> Option<ButtonType> {
        self.current.value_type(button).ok()
    }

    pub fn button_name(&self, button: DeviceButtonId) -> Option<&str> {
        self.kind.layout().get(button as usize).map(|info| info.name)
    }

    pub fn button_by_name(&self, name: &str) -> Option<DeviceButtonId> {
        self.kind
            .layout()
            .iter()
            .position(|info| info.name == name)
            .map(|i| i as DeviceButtonId)
    }

    // ── State access ──────────────────────────────────────────────────────────

    pub fn current_state(&self) -> &StateBuffer {
        &self.current
    }

    pub fn previous_state(&self) -> &StateBuffer {
        &self.previous
    }

    pub(crate) fn state_mut(&mut self, target: StateTarget) -> &mut StateBuffer {
        match target {
            StateTarget::Current => &mut self.current,
            StateTarget::Previous => &mut self.previous,
        }
    }

    pub fn get(&self, button: impl Into<DeviceButtonId>) -> Option<ButtonValue> {
        self.current.get(button.into()).ok()
    }

    pub fn get_bool(&self, button: impl Into<DeviceButtonId>) -> bool {
        self.current.get_bool(button.into())
    }

    pub fn get_float(&self, button: impl Into<DeviceButtonId>) -> f32 {
        self.current.get_float(button.into())
    }

    pub fn get_bool_previous(&self, button: impl Into<DeviceButtonId>) -> bool {
        self.previous.get_bool(button.into())
    }

    pub fn get_float_previous(&self, button: impl Into<DeviceButtonId>) -> f32 {
        self.previous.get_float(button.into())
    }

    /// Down now, up last frame.
    pub fn get_bool_is_new(&self, button: impl Into<DeviceButtonId>) -> bool {
        let button = button.into();
        self.get_bool(button) && !self.get_bool_previous(button)
    }

    /// Up now, down last frame.
    pub fn get_bool_was_down(&self, button: impl Into<DeviceButtonId>) -> bool {
        let button = button.into();
        !self.get_bool(button) && self.get_bool_previous(button)
    }

    /// Ids of every boolean button currently held.
    pub fn buttons_down(&self) -> impl Iterator<Item = DeviceButtonId> + '_ {
        self.current
            .iter()
            .filter(|(_, value)| matches!(value, ButtonValue::Bool(true)))
            .map(|(id, _)| id)
    }

    /// Downcasts a custom device to its concrete type.
    pub fn custom<T: CustomDevice>(&self) -> Option<&T> {
        match &self.kind {
            DeviceKind::Custom(c) => c.as_any().downcast_ref(),
            _ => None,
        }
    }

    pub fn custom_mut<T: CustomDevice>(&mut self) -> Option<&mut T> {
        match &mut self.kind {
            DeviceKind::Custom(c) => c.as_any_mut().downcast_mut(),
            _ => None,
        }
    }

    // ── Frame hooks (manager only) ────────────────────────────────────────────

    pub(crate) fn snapshot(&mut self) {
        self.previous.clone_from(&self.current);
    }

    pub(crate) fn update(
        &mut self,
        devices: &DeviceRegistry,
        delta: Option<&mut DeltaState>,
        time: FrameTime,
    ) {
        let mut update = DeviceUpdate {
            device: self.id,
            state: &mut self.current,
            previous: &self.previous,
            delta,
            devices,
            time,
            muted: false,
        };
        match &mut self.kind {
            DeviceKind::Mouse => mouse::begin_update(self.variant, &mut update),
            DeviceKind::Custom(custom) => custom.update(&mut update),
            _ => {}
        }
        if self.variant == DeviceVariant::Null {
            return;
        }
        if let Some(backend) = self.backend.as_mut() {
            // A synced device still drains its backend so local input does
            // not pile up, but none of it is written.
            update.muted = self.synced;
            backend.poll(&mut update);
        }
    }
}

// ── DeviceUpdate ──────────────────────────────────────────────────────────────

/// Write access to one device's current state during its update.
pub struct DeviceUpdate<'a> {
    device: DeviceId,
    state: &'a mut StateBuffer,
    previous: &'a StateBuffer,
    delta: Option<&'a mut DeltaState>,
    devices: &'a DeviceRegistry,
    time: FrameTime,
    muted: bool,
}

impl<'a> DeviceUpdate<'a> {
    /// The device being updated.
    pub fn device_id(&self) -> DeviceId {
        self.device
    }

    /// All other registered devices.  The device being updated is absent.
    pub fn devices(&self) -> &'a DeviceRegistry {
        self.devices
    }

    /// Seconds since the previous frame.
    pub fn delta_time(&self) -> f32 {
        self.time.delta_time
    }

    /// Manager time in milliseconds at the start of this frame.
    pub fn time_ms(&self) -> u64 {
        self.time.time_ms
    }

    pub fn get(&self, button: impl Into<DeviceButtonId>) -> Option<ButtonValue> {
        self.state.get(button.into()).ok()
    }

    pub fn get_bool(&self, button: impl Into<DeviceButtonId>) -> bool {
        self.state.get_bool(button.into())
    }

    pub fn get_float(&self, button: impl Into<DeviceButtonId>) -> f32 {
        self.state.get_float(button.into())
    }

    pub fn previous(&self) -> &StateBuffer {
        self.previous
    }

    /// Writes `value`, logging the transition only when the value changes.
    ///
    /// Returns `true` when the stored value changed.  Invalid writes are
    /// dropped with a warning.
    pub fn set(&mut self, button: impl Into<DeviceButtonId>, value: ButtonValue) -> bool {
        let button = button.into();
        if self.muted {
            return false;
        }
        debug_assert_eq!(
            self.state.value_type(button).ok(),
            Some(value.button_type()),
            "{}: invalid write to button {button}",
            self.device
        );
        let old = match self.state.get(button) {
            Ok(old) => old,
            Err(e) => {
                warn!(device = %self.device, "dropping device write: {e}");
                return false;
            }
        };
        if let Err(e) = self.state.set(button, value) {
            warn!(device = %self.device, "dropping device write: {e}");
            return false;
        }
        if old == value {
            return false;
        }
        if let Some(delta) = self.delta.as_deref_mut() {
            delta.add_change(self.device, button, old, value);
        }
        true
    }

    pub fn set_bool(&mut self, button: impl Into<DeviceButtonId>, value: bool) -> bool {
        self.set(button, ButtonValue::Bool(value))
    }

    pub fn set_float(&mut self, button: impl Into<DeviceButtonId>, value: f32) -> bool {
        self.set(button, ButtonValue::Float(value))
    }
}
