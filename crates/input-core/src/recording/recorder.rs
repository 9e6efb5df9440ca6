//! Recording live input.

use std::collections::HashSet;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::ids::{DeviceButtonId, DeviceId, ListenerId};
use crate::domain::value::ButtonValue;
use crate::manager::clock::Clock;
use crate::manager::listeners::{InputListener, ListenerResponse};
use crate::manager::InputManager;
use crate::recording::recording::InputRecording;

#[derive(Debug, Default)]
struct RecorderState {
    recording: InputRecording,
    active: bool,
    start_ms: u64,
    /// Empty means "every device".
    devices: HashSet<DeviceId>,
}

/// Listener half of the recorder.  Sees every transition, including ones a
/// listener ahead of it consumed, and never consumes.
struct RecorderTap {
    shared: Arc<Mutex<RecorderState>>,
    clock: Clock,
}

impl RecorderTap {
    fn record(&self, device: DeviceId, button: DeviceButtonId, value: ButtonValue) {
        let mut state = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.active || (!state.devices.is_empty() && !state.devices.contains(&device)) {
            return;
        }
        let time_ms = self.clock.now_ms().saturating_sub(state.start_ms);
        state.recording.add_change(time_ms, device, button, value);
    }
}

impl InputListener for RecorderTap {
    fn on_device_button_bool(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        _old: bool,
        new: bool,
    ) -> ListenerResponse {
        self.record(device, button, ButtonValue::Bool(new));
        ListenerResponse::Continue
    }

    fn on_device_button_float(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        _old: f32,
        new: f32,
    ) -> ListenerResponse {
        self.record(device, button, ButtonValue::Float(new));
        ListenerResponse::Continue
    }

    fn priority(&self) -> i32 {
        i32::MAX
    }

    fn observes_consumed(&self) -> bool {
        true
    }
}

/// Records every change committed while started.
///
/// ```rust
/// use input_core::{Change, DeviceIndex, DeviceVariant, InputManager, InputRecorder, Mouse, MouseButton};
///
/// let mut manager = InputManager::new();
/// let mouse = manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
/// let recorder = InputRecorder::new(&mut manager);
/// recorder.start();
/// manager.push_change(Change::bool(mouse, MouseButton::Left, true));
/// manager.update(0.016);
/// recorder.stop();
/// assert_eq!(recorder.recording().len(), 1);
/// ```
#[derive(Debug)]
pub struct InputRecorder {
    shared: Arc<Mutex<RecorderState>>,
    clock: Clock,
    listener: ListenerId,
}

impl InputRecorder {
    /// Creates a stopped recorder hooked into `manager`'s listener chain.
    pub fn new(manager: &mut InputManager) -> Self {
        let shared = Arc::new(Mutex::new(RecorderState::default()));
        let clock = manager.clock();
        let listener = manager.add_listener(RecorderTap {
            shared: Arc::clone(&shared),
            clock: clock.clone(),
        });
        Self {
            shared,
            clock,
            listener,
        }
    }

    fn state(&self) -> MutexGuard<'_, RecorderState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Discards any previous recording and starts a new one at the current
    /// manager time.
    pub fn start(&self) {
        let mut state = self.state();
        state.recording.clear();
        state.start_ms = self.clock.now_ms();
        state.active = true;
    }

    pub fn stop(&self) {
        self.state().active = false;
    }

    pub fn is_recording(&self) -> bool {
        self.state().active
    }

    /// Restricts recording to the given devices.  With none added, every
    /// device is recorded.
    pub fn add_device_to_record(&self, device: DeviceId) {
        self.state().devices.insert(device);
    }

    pub fn remove_device_to_record(&self, device: DeviceId) {
        self.state().devices.remove(&device);
    }

    /// Read-only view of the recording so far.
    pub fn recording(&self) -> RecordingRef<'_> {
        RecordingRef(self.state())
    }

    /// Takes the recording out, leaving an empty one.
    pub fn take_recording(&self) -> InputRecording {
        std::mem::take(&mut self.state().recording)
    }

    /// Unhooks the recorder from `manager`.
    pub fn detach(self, manager: &mut InputManager) -> InputRecording {
        manager.remove_listener(self.listener);
        self.take_recording()
    }
}

/// Borrowed, read-only access to a recorder's log.
pub struct RecordingRef<'a>(MutexGuard<'a, RecorderState>);

impl Deref for RecordingRef<'_> {
    type Target = InputRecording;

    fn deref(&self) -> &InputRecording {
        &self.0.recording
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::keyboard::{Key, Keyboard};
    use crate::devices::mouse::{Mouse, MouseButton};
    use crate::devices::DeviceVariant;
    use crate::domain::change::Change;
    use crate::domain::ids::DeviceIndex;

    #[test]
    fn test_records_relative_times_while_active() {
        // Arrange
        let mut manager = InputManager::new();
        let mouse = manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
        manager.update(0.5);
        let recorder = InputRecorder::new(&mut manager);

        // Act
        recorder.start();
        manager.push_change(Change::bool(mouse, MouseButton::Left, true));
        manager.update(0.25);
        manager.push_change(Change::bool(mouse, MouseButton::Left, false));
        manager.update(0.25);
        recorder.stop();
        manager.push_change(Change::bool(mouse, MouseButton::Left, true));
        manager.update(0.25);

        // Assert
        let recording = recorder.recording();
        assert_eq!(recording.len(), 2);
        assert_eq!(recording.get(0).unwrap().time_ms, 0);
        assert_eq!(recording.get(1).unwrap().time_ms, 250);
        assert_eq!(recording.get(1).unwrap().value, ButtonValue::Bool(false));
    }

    #[test]
    fn test_device_filter_limits_recorded_devices() {
        // Arrange
        let mut manager = InputManager::new();
        let keyboard = manager.create_device::<Keyboard>(DeviceIndex::Auto, DeviceVariant::Standard);
        let mouse = manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
        let recorder = InputRecorder::new(&mut manager);
        recorder.add_device_to_record(keyboard);

        // Act
        recorder.start();
        manager.push_change(Change::bool(keyboard, Key::KeyB, true));
        manager.push_change(Change::bool(mouse, MouseButton::Left, true));
        manager.update(0.016);

        // Assert
        let recording = recorder.recording();
        assert_eq!(recording.len(), 1);
        assert_eq!(recording.get(0).unwrap().device, keyboard);
    }

    #[test]
    fn test_recorder_sees_changes_consumed_by_other_listeners() {
        // Arrange
        struct Swallow;
        impl InputListener for Swallow {
            fn on_device_button_bool(
                &mut self,
                _: DeviceId,
                _: DeviceButtonId,
                _: bool,
                _: bool,
            ) -> ListenerResponse {
                ListenerResponse::Consumed
            }

            fn priority(&self) -> i32 {
                1000
            }
        }
        let mut manager = InputManager::new();
        let mouse = manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
        manager.add_listener(Swallow);
        let recorder = InputRecorder::new(&mut manager);

        // Act
        recorder.start();
        manager.push_change(Change::bool(mouse, MouseButton::Right, true));
        manager.update(0.016);

        // Assert
        assert_eq!(recorder.recording().len(), 1);
    }

    #[test]
    fn test_recorder_sees_changes_consumed_at_equal_priority() {
        // Arrange: registered first at the recorder's own priority, so it
        // runs ahead of the recorder
        struct Greedy;
        impl InputListener for Greedy {
            fn on_device_button_bool(
                &mut self,
                _: DeviceId,
                _: DeviceButtonId,
                _: bool,
                _: bool,
            ) -> ListenerResponse {
                ListenerResponse::Consumed
            }

            fn priority(&self) -> i32 {
                i32::MAX
            }
        }
        let mut manager = InputManager::new();
        let keyboard = manager.create_device::<Keyboard>(DeviceIndex::Auto, DeviceVariant::Standard);
        manager.add_listener(Greedy);
        let recorder = InputRecorder::new(&mut manager);

        // Act
        recorder.start();
        manager.push_change(Change::bool(keyboard, Key::Escape, true));
        manager.update(0.016);

        // Assert
        let recording = recorder.recording();
        assert_eq!(recording.len(), 1);
        assert_eq!(recording.get(0).unwrap().button, Key::Escape.id());
    }

    #[test]
    fn test_restart_discards_previous_recording() {
        // Arrange
        let mut manager = InputManager::new();
        let mouse = manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
        let recorder = InputRecorder::new(&mut manager);
        recorder.start();
        manager.push_change(Change::bool(mouse, MouseButton::Left, true));
        manager.update(0.016);

        // Act
        recorder.start();

        // Assert
        assert!(recorder.recording().is_empty());
        assert!(recorder.is_recording());
    }

    #[test]
    fn test_detach_removes_listener_and_returns_recording() {
        // Arrange
        let mut manager = InputManager::new();
        let mouse = manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
        let recorder = InputRecorder::new(&mut manager);
        recorder.start();
        manager.push_change(Change::bool(mouse, MouseButton::Left, true));
        manager.update(0.016);

        // Act
        let recording = recorder.detach(&mut manager);

        // Assert
        assert_eq!(recording.len(), 1);
        assert_eq!(manager.listener_count(), 0);
    }
}
