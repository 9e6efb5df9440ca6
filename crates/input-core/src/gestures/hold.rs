//! "Button held for at least N milliseconds".

use std::any::Any;

use crate::devices::{CustomDevice, DeviceType, DeviceUpdate};
use crate::domain::ids::{DeviceButtonId, DeviceId};
use crate::domain::value::ButtonInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum HoldButton {
    Triggered = 0,
}

impl From<HoldButton> for DeviceButtonId {
    fn from(button: HoldButton) -> Self {
        button as DeviceButtonId
    }
}

const BUTTONS: &[ButtonInfo] = &[ButtonInfo::bool("hold_triggered")];

/// Reports [`HoldButton::Triggered`] while a source button has been down
/// for at least `hold_ms`.
///
/// In one-shot mode the trigger is down for a single frame per hold instead.
#[derive(Debug, Clone)]
pub struct HoldGesture {
    source: DeviceId,
    button: DeviceButtonId,
    hold_ms: u64,
    one_shot: bool,
    first_down_ms: Option<u64>,
    fired: bool,
}

impl HoldGesture {
    pub fn new(source: DeviceId, button: impl Into<DeviceButtonId>, hold_ms: u64) -> Self {
        Self {
            source,
            button: button.into(),
            hold_ms,
            one_shot: false,
            first_down_ms: None,
            fired: false,
        }
    }

    pub fn one_shot(mut self, one_shot: bool) -> Self {
        self.one_shot = one_shot;
        self
    }
}

impl CustomDevice for HoldGesture {
    fn device_type(&self) -> DeviceType {
        DeviceType::Gesture
    }

    fn buttons(&self) -> &[ButtonInfo] {
        BUTTONS
    }

    fn is_late_update(&self) -> bool {
        true
    }

    fn update(&mut self, update: &mut DeviceUpdate<'_>) {
        let down = update
            .devices()
            .get(self.source)
            .map_or(false, |d| d.get_bool(self.button));
        if !down {
            self.first_down_ms = None;
            self.fired = false;
            update.set_bool(HoldButton::Triggered, false);
            return;
        }

        let now = update.time_ms();
        let start = *self.first_down_ms.get_or_insert(now);
        let held = now.saturating_sub(start) >= self.hold_ms;
        let triggered = held && !(self.one_shot && self.fired);
        if held {
            self.fired = true;
        }
        update.set_bool(HoldButton::Triggered, triggered);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::keyboard::{Key, Keyboard};
    use crate::devices::DeviceVariant;
    use crate::domain::change::Change;
    use crate::domain::ids::DeviceIndex;
    use crate::manager::InputManager;

    // 125 ms per frame, exact in binary.
    const DT: f32 = 0.125;

    fn setup(one_shot: bool) -> (InputManager, DeviceId, DeviceId) {
        let mut manager = InputManager::new();
        let keyboard = manager.create_device::<Keyboard>(DeviceIndex::Auto, DeviceVariant::Standard);
        let gesture = manager.create_custom_device(
            DeviceIndex::Auto,
            HoldGesture::new(keyboard, Key::Space, 200).one_shot(one_shot),
        );
        (manager, keyboard, gesture)
    }

    fn triggered(manager: &InputManager, gesture: DeviceId) -> bool {
        manager.get_device(gesture).unwrap().get_bool(HoldButton::Triggered)
    }

    #[test]
    fn test_hold_triggers_after_hold_time() {
        // Arrange
        let (mut manager, keyboard, gesture) = setup(false);
        manager.push_change(Change::bool(keyboard, Key::Space, true));

        // Act / Assert: t=0 press, t=125 still short, t=250 held long enough
        manager.update(DT);
        assert!(!triggered(&manager, gesture));
        manager.update(DT);
        assert!(!triggered(&manager, gesture));
        manager.update(DT);
        assert!(triggered(&manager, gesture));
        manager.update(DT);
        assert!(triggered(&manager, gesture), "stays triggered while held");
    }

    #[test]
    fn test_release_resets_hold() {
        // Arrange
        let (mut manager, keyboard, gesture) = setup(false);
        manager.push_change(Change::bool(keyboard, Key::Space, true));
        for _ in 0..3 {
            manager.update(DT);
        }

        // Act
        manager.push_change(Change::bool(keyboard, Key::Space, false));
        manager.update(DT);

        // Assert
        assert!(!triggered(&manager, gesture));
    }

    #[test]
    fn test_one_shot_fires_for_a_single_frame() {
        // Arrange
        let (mut manager, keyboard, gesture) = setup(true);
        manager.push_change(Change::bool(keyboard, Key::Space, true));
        manager.update(DT);
        manager.update(DT);

        // Act
        manager.update(DT);
        let first = triggered(&manager, gesture);
        manager.update(DT);
        let second = triggered(&manager, gesture);

        // Assert
        assert!(first);
        assert!(!second);
    }
}
