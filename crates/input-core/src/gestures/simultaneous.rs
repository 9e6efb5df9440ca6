//! "All of these buttons are down at once".

use std::any::Any;

use crate::devices::{CustomDevice, DeviceType, DeviceUpdate};
use crate::domain::ids::{DeviceButtonId, DeviceId};
use crate::domain::value::ButtonInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SimultaneouslyDownButton {
    AllDown = 0,
}

impl From<SimultaneouslyDownButton> for DeviceButtonId {
    fn from(button: SimultaneouslyDownButton) -> Self {
        button as DeviceButtonId
    }
}

const BUTTONS: &[ButtonInfo] = &[ButtonInfo::bool("simultaneously_down")];

/// Down while every configured (device, button) pair is down.  With no
/// buttons configured it never triggers.
#[derive(Debug, Clone, Default)]
pub struct SimultaneouslyDownGesture {
    inputs: Vec<(DeviceId, DeviceButtonId)>,
}

impl SimultaneouslyDownGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_button(mut self, device: DeviceId, button: impl Into<DeviceButtonId>) -> Self {
        self.add_button(device, button);
        self
    }

    pub fn add_button(&mut self, device: DeviceId, button: impl Into<DeviceButtonId>) {
        self.inputs.push((device, button.into()));
    }

    pub fn clear_buttons(&mut self) {
        self.inputs.clear();
    }
}

impl CustomDevice for SimultaneouslyDownGesture {
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
        let devices = update.devices();
        let all_down = !self.inputs.is_empty()
            && self
                .inputs
                .iter()
                .all(|&(device, button)| devices.get(device).map_or(false, |d| d.get_bool(button)));
        update.set_bool(SimultaneouslyDownButton::AllDown, all_down);
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
    use crate::devices::mouse::{Mouse, MouseButton};
    use crate::devices::DeviceVariant;
    use crate::domain::change::Change;
    use crate::domain::ids::DeviceIndex;
    use crate::manager::InputManager;

    #[test]
    fn test_triggers_only_when_all_buttons_down() {
        // Arrange
        let mut manager = InputManager::new();
        let keyboard = manager.create_device::<Keyboard>(DeviceIndex::Auto, DeviceVariant::Standard);
        let mouse = manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
        let gesture = manager.create_custom_device(
            DeviceIndex::Auto,
            SimultaneouslyDownGesture::new()
                .with_button(keyboard, Key::ControlLeft)
                .with_button(mouse, MouseButton::Left),
        );
        let all_down = |m: &InputManager| {
            m.get_device(gesture)
                .unwrap()
                .get_bool(SimultaneouslyDownButton::AllDown)
        };

        // Act / Assert
        manager.push_change(Change::bool(keyboard, Key::ControlLeft, true));
        manager.update(0.016);
        assert!(!all_down(&manager));

        manager.push_change(Change::bool(mouse, MouseButton::Left, true));
        manager.update(0.016);
        assert!(all_down(&manager));

        manager.push_change(Change::bool(keyboard, Key::ControlLeft, false));
        manager.update(0.016);
        assert!(!all_down(&manager));
    }

    #[test]
    fn test_buttons_can_be_added_after_creation() {
        // Arrange
        let mut manager = InputManager::new();
        let keyboard = manager.create_device::<Keyboard>(DeviceIndex::Auto, DeviceVariant::Standard);
        let gesture = manager.create_custom_device(DeviceIndex::Auto, SimultaneouslyDownGesture::new());
        manager.push_change(Change::bool(keyboard, Key::KeyG, true));
        manager.update(0.016);
        assert!(!manager.get_device(gesture).unwrap().get_bool(SimultaneouslyDownButton::AllDown));

        // Act
        manager
            .get_device_mut(gesture)
            .and_then(|d| d.custom_mut::<SimultaneouslyDownGesture>())
            .unwrap()
            .add_button(keyboard, Key::KeyG);
        manager.update(0.016);

        // Assert
        assert!(manager.get_device(gesture).unwrap().get_bool(SimultaneouslyDownButton::AllDown));
        assert_eq!(manager.get_device(gesture).unwrap().type_name(), "gesture");
    }
}
