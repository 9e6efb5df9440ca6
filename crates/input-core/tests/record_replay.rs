//! Integration tests for recording a session and replaying it elsewhere.

use input_core::{
    Change, DeviceId, DeviceIndex, DeviceVariant, InputManager, InputPlayer, InputRecorder,
    InputRecording, Key, Keyboard, Mouse, MouseButton, RecordingError,
};

const DT: f32 = 0.016;

fn manager_with_devices() -> (InputManager, DeviceId, DeviceId) {
    let mut manager = InputManager::new();
    let keyboard = manager.create_device::<Keyboard>(DeviceIndex::Auto, DeviceVariant::Standard);
    let mouse = manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
    (manager, keyboard, mouse)
}

/// Four frames of input: press and move, idle, move, release.
fn record_session() -> (InputManager, InputRecording) {
    let (mut manager, keyboard, mouse) = manager_with_devices();
    let recorder = InputRecorder::new(&mut manager);
    recorder.start();

    manager.push_change(Change::bool(mouse, MouseButton::Left, true));
    manager.push_change(Change::float(mouse, MouseButton::AxisX, 10.0));
    manager.update(DT);
    manager.update(DT);
    manager.push_change(Change::float(mouse, MouseButton::AxisX, 15.5));
    manager.push_change(Change::bool(keyboard, Key::KeyW, true));
    manager.update(DT);
    manager.push_change(Change::bool(mouse, MouseButton::Left, false));
    manager.update(DT);

    recorder.stop();
    let recording = recorder.take_recording();
    (manager, recording)
}

#[test]
fn test_replay_reproduces_recorded_session() {
    // Arrange
    let (source, original) = record_session();
    let bytes = original.serialize(&source).expect("serialize must succeed");

    let (mut target, _, _) = manager_with_devices();
    let loaded = InputRecording::deserialize(&bytes, &target).expect("deserialize must succeed");
    let player = InputPlayer::new(&mut target);
    let rerecorder = InputRecorder::new(&mut target);
    player.set_recording(loaded);

    // Act
    player.start();
    rerecorder.start();
    for _ in 0..6 {
        target.update(DT);
    }

    // Assert
    assert!(!player.is_playing());
    let replayed = rerecorder.take_recording();
    assert_eq!(replayed.len(), original.len());
    for (a, b) in replayed.iter().zip(original.iter()) {
        assert_eq!(a, b);
    }
    for id in source.devices().iter().map(|d| d.id()) {
        assert_eq!(
            source.get_device(id).unwrap().current_state(),
            target.get_device(id).unwrap().current_state()
        );
    }
}

#[test]
fn test_recording_fails_to_load_without_matching_devices() {
    // Arrange
    let (source, original) = record_session();
    let bytes = original.serialize(&source).expect("serialize must succeed");
    let mut target = InputManager::new();
    target.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);

    // Act
    let result = InputRecording::deserialize(&bytes, &target);

    // Assert
    assert!(matches!(result, Err(RecordingError::MissingDevice { .. })));
}

#[test]
fn test_recorded_session_has_expected_shape() {
    // Act
    let (_, recording) = record_session();

    // Assert
    assert_eq!(recording.len(), 5);
    assert_eq!(recording.get(0).unwrap().time_ms, 0);
    assert_eq!(recording.duration_ms(), recording.get(4).unwrap().time_ms);
    assert_eq!(recording.devices().len(), 2);
}
