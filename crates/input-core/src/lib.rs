//! # input-core
//!
//! Device-agnostic input layer: devices expose their state as flat button
//! buffers, the [`InputManager`] advances them once per frame, and every
//! committed change is delivered to prioritized listeners.
//!
//! # Architecture overview (for beginners)
//!
//! - **`domain`** – Plain value types with no behaviour beyond bookkeeping:
//!   button values, state buffers, per-frame deltas and the [`Change`]
//!   record producers hand to the manager.
//!
//! - **`queue`** – The multi-producer queue other threads use to write input
//!   without touching the manager.
//!
//! - **`devices`** – The device model.  Built-in kinds (keyboard, mouse, pad,
//!   touch, sensors) carry a fixed button layout; custom devices bring their
//!   own.  A device reads raw input from an optional [`DeviceBackend`].
//!
//! - **`manager`** – Owns the devices, listeners and modifiers and runs the
//!   per-frame update.
//!
//! - **`gestures`** – Recognizers that are themselves devices, computed from
//!   other devices' state late in the frame.
//!
//! - **`recording`** – Capture the change stream, serialize it and replay it.
//!
//! The crate does no I/O of its own.  Network mirroring lives in
//! `input-sync`.

pub mod config;
pub mod devices;
pub mod domain;
pub mod gestures;
pub mod manager;
pub mod queue;
pub mod recording;

pub use config::ManagerConfig;
pub use devices::builtin::{BuiltInSensors, SensorAxis};
pub use devices::keyboard::{Key, Keyboard};
pub use devices::mouse::{Mouse, MouseButton};
pub use devices::pad::{Pad, PadButton};
pub use devices::touch::{touch_button, Touch, TouchField, MAX_TOUCHES};
pub use devices::{
    BuiltInDevice, ButtonFeed, ChannelBackend, CustomDevice, DeviceBackend, DeviceEvent,
    DeviceKind, DeviceListener, DeviceStatus, DeviceType, DeviceUpdate, DeviceVariant,
    InputDevice,
};
pub use domain::change::{Change, ChangeSource, StateTarget};
pub use domain::delta::{ButtonDelta, DeltaState};
pub use domain::ids::{
    DeviceButtonId, DeviceButtonSpec, DeviceId, DeviceIndex, ListenerId, ModifierId,
};
pub use domain::state::{StateBuffer, StateError};
pub use domain::value::{ButtonInfo, ButtonType, ButtonValue};
pub use gestures::{HoldButton, HoldGesture, SimultaneouslyDownButton, SimultaneouslyDownGesture};
pub use manager::clock::{Clock, FrameTime};
pub use manager::listeners::{InputListener, ListenerResponse, LoggingListener};
pub use manager::modifiers::{DeviceStateModifier, ModifierContext};
pub use manager::registry::{DeviceRegistry, RegistryError};
pub use manager::InputManager;
pub use queue::{ChangeProducer, ChangeQueue};
pub use recording::{
    InputPlayer, InputRecorder, InputRecording, RecordedChange, RecordingError, RecordingRef,
    RECORDING_FORMAT_VERSION,
};
