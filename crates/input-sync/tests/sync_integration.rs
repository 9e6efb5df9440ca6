//! Integration tests for TCP state sync over localhost.
//!
//! Each test runs a sending and a receiving manager in the same process.  The
//! receiving manager is updated in a polling loop until the expected state
//! arrives or a deadline passes.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use input_core::{
    Change, DeviceId, DeviceIndex, DeviceVariant, HoldGesture, InputManager, Key, Keyboard, Mouse,
    MouseButton,
};
use input_sync::{StateSyncClient, StateSyncServer, SyncError};

const DT: f32 = 0.016;
const DEADLINE: Duration = Duration::from_secs(5);

fn any_local() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

fn keyboard_and_mouse() -> (InputManager, DeviceId, DeviceId) {
    let mut manager = InputManager::new();
    let keyboard = manager.create_device::<Keyboard>(DeviceIndex::Auto, DeviceVariant::Standard);
    let mouse = manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
    (manager, keyboard, mouse)
}

/// Updates `manager` until `done` holds.  Returns false on timeout.
async fn update_until(manager: &mut InputManager, mut done: impl FnMut(&InputManager) -> bool) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < DEADLINE {
        manager.update(DT);
        if done(manager) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

async fn receiving_peer() -> (InputManager, DeviceId, DeviceId, StateSyncServer) {
    let (mut manager, keyboard, mouse) = keyboard_and_mouse();
    let mut server = StateSyncServer::bind(any_local()).await.expect("bind");
    server.attach(&mut manager);
    (manager, keyboard, mouse, server)
}

#[tokio::test]
async fn test_committed_changes_are_mirrored_to_peer() {
    // Arrange
    let (mut receiver, _, remote_mouse, server) = receiving_peer().await;
    let (mut sender, _, mouse) = keyboard_and_mouse();
    let mut client = StateSyncClient::connect(server.local_addr(), 64)
        .await
        .expect("connect");
    client.attach(&mut sender);
    client.start_device_sync(&sender, mouse).await.expect("start sync");

    // Act
    sender.push_change(Change::bool(mouse, MouseButton::Left, true));
    sender.push_change(Change::float(mouse, MouseButton::AxisX, 320.0));
    sender.update(DT);
    let arrived = update_until(&mut receiver, |m| {
        let device = m.get_device(remote_mouse).unwrap();
        device.get_bool(MouseButton::Left) && device.get_float(MouseButton::AxisX) == 320.0
    })
    .await;

    // Assert
    assert!(arrived, "mirrored state did not arrive in time");
    assert!(receiver.get_device(remote_mouse).unwrap().is_synced());
}

#[tokio::test]
async fn test_start_sync_sends_current_state_first() {
    // Arrange: the key is already down before sync starts
    let (mut receiver, remote_keyboard, _, server) = receiving_peer().await;
    let (mut sender, keyboard, _) = keyboard_and_mouse();
    sender.push_change(Change::bool(keyboard, Key::KeyQ, true));
    sender.update(DT);
    let client = StateSyncClient::connect(server.local_addr(), 256)
        .await
        .expect("connect");

    // Act
    client
        .start_device_sync(&sender, keyboard)
        .await
        .expect("start sync");
    let arrived = update_until(&mut receiver, |m| {
        m.get_device(remote_keyboard).unwrap().get_bool(Key::KeyQ)
    })
    .await;

    // Assert
    assert!(arrived, "initial state did not arrive in time");
}

#[tokio::test]
async fn test_unsynced_devices_are_not_forwarded() {
    // Arrange
    let (mut receiver, remote_keyboard, remote_mouse, server) = receiving_peer().await;
    let (mut sender, keyboard, mouse) = keyboard_and_mouse();
    let mut client = StateSyncClient::connect(server.local_addr(), 256)
        .await
        .expect("connect");
    client.attach(&mut sender);
    client.start_device_sync(&sender, mouse).await.expect("start sync");

    // Act: the keyboard press is sent before the click on the same socket
    sender.push_change(Change::bool(keyboard, Key::Enter, true));
    sender.update(DT);
    sender.push_change(Change::bool(mouse, MouseButton::Right, true));
    sender.update(DT);
    let arrived = update_until(&mut receiver, |m| {
        m.get_device(remote_mouse).unwrap().get_bool(MouseButton::Right)
    })
    .await;

    // Assert
    assert!(arrived);
    let keyboard_state = receiver.get_device(remote_keyboard).unwrap();
    assert!(!keyboard_state.get_bool(Key::Enter));
    assert!(!keyboard_state.is_synced());
}

#[tokio::test]
async fn test_disconnect_releases_synced_devices() {
    // Arrange
    let (mut receiver, _, remote_mouse, server) = receiving_peer().await;
    let (mut sender, _, mouse) = keyboard_and_mouse();
    let mut client = StateSyncClient::connect(server.local_addr(), 64)
        .await
        .expect("connect");
    client.attach(&mut sender);
    client.start_device_sync(&sender, mouse).await.expect("start sync");
    assert!(
        update_until(&mut receiver, |m| m.get_device(remote_mouse).unwrap().is_synced()).await
    );

    // Act
    client.close(&mut sender).await;
    let released =
        update_until(&mut receiver, |m| !m.get_device(remote_mouse).unwrap().is_synced()).await;

    // Assert
    assert!(released, "device stayed synced after the peer left");
    assert_eq!(sender.listener_count(), 0);
}

#[tokio::test]
async fn test_device_stays_synced_while_another_peer_mirrors_it() {
    // Arrange: two peers mirror the same receiving mouse
    let (mut receiver, _, remote_mouse, server) = receiving_peer().await;
    let (mut first, _, first_mouse) = keyboard_and_mouse();
    let (mut second, _, second_mouse) = keyboard_and_mouse();
    let mut first_client = StateSyncClient::connect(server.local_addr(), 64)
        .await
        .expect("connect first");
    let mut second_client = StateSyncClient::connect(server.local_addr(), 64)
        .await
        .expect("connect second");
    first_client.attach(&mut first);
    second_client.attach(&mut second);

    first_client
        .start_device_sync(&first, first_mouse)
        .await
        .expect("first sync");
    first.push_change(Change::float(first_mouse, MouseButton::AxisX, 1.0));
    first.update(DT);
    assert!(
        update_until(&mut receiver, |m| {
            m.get_device(remote_mouse).unwrap().get_float(MouseButton::AxisX) == 1.0
        })
        .await
    );
    second_client
        .start_device_sync(&second, second_mouse)
        .await
        .expect("second sync");
    second.push_change(Change::float(second_mouse, MouseButton::AxisY, 2.0));
    second.update(DT);
    assert!(
        update_until(&mut receiver, |m| {
            m.get_device(remote_mouse).unwrap().get_float(MouseButton::AxisY) == 2.0
        })
        .await
    );

    // Act: the first peer leaves
    first_client.close(&mut first).await;
    assert!(update_until(&mut receiver, |_| server.connection_count() == 1).await);
    receiver.update(DT);

    // Assert
    assert!(receiver.get_device(remote_mouse).unwrap().is_synced());
    assert_eq!(server.mirrored_device_count(), 1);
    second_client.close(&mut second).await;
    let released =
        update_until(&mut receiver, |m| !m.get_device(remote_mouse).unwrap().is_synced()).await;
    assert!(released, "device stayed synced after the last peer left");
    assert_eq!(server.mirrored_device_count(), 0);
}

#[tokio::test]
async fn test_shutdown_closes_peer_connections() {
    // Arrange: a raw peer that never sends anything
    let (mut receiver, _, _, server) = receiving_peer().await;
    let mut raw = TcpStream::connect(server.local_addr()).await.expect("connect");
    assert!(update_until(&mut receiver, |_| server.connection_count() == 1).await);

    // Act
    server.shutdown(&mut receiver).await;
    let mut buf = [0u8; 8];
    let read = tokio::time::timeout(Duration::from_secs(2), raw.read(&mut buf)).await;

    // Assert: EOF or reset, never a read that hangs
    assert!(
        matches!(read, Ok(Ok(0)) | Ok(Err(_))),
        "peer socket still open after shutdown: {read:?}"
    );
    assert_eq!(receiver.device_state_modifier_count(), 0);
}

#[tokio::test]
async fn test_shutdown_releases_mirrored_devices() {
    // Arrange
    let (mut receiver, _, remote_mouse, server) = receiving_peer().await;
    let (mut sender, _, mouse) = keyboard_and_mouse();
    let mut client = StateSyncClient::connect(server.local_addr(), 64)
        .await
        .expect("connect");
    client.attach(&mut sender);
    client.start_device_sync(&sender, mouse).await.expect("start sync");
    assert!(
        update_until(&mut receiver, |m| m.get_device(remote_mouse).unwrap().is_synced()).await
    );

    // Act
    server.shutdown(&mut receiver).await;

    // Assert
    assert!(!receiver.get_device(remote_mouse).unwrap().is_synced());
    client.close(&mut sender).await;
}

#[tokio::test]
async fn test_gesture_devices_cannot_be_synced() {
    // Arrange
    let (_receiver, _, _, server) = receiving_peer().await;
    let (mut sender, keyboard, _) = keyboard_and_mouse();
    let gesture = sender.create_custom_device(
        DeviceIndex::Auto,
        HoldGesture::new(keyboard, Key::Space, 500),
    );
    let client = StateSyncClient::connect(server.local_addr(), 64)
        .await
        .expect("connect");

    // Act
    let result = client.start_device_sync(&sender, gesture).await;

    // Assert
    assert!(matches!(result, Err(SyncError::GestureNotSyncable(id)) if id == gesture));
    assert!(!client.is_device_synced(gesture));
}

#[tokio::test]
async fn test_unknown_device_is_rejected() {
    // Arrange
    let (_receiver, _, _, server) = receiving_peer().await;
    let (sender, _, _) = keyboard_and_mouse();
    let client = StateSyncClient::connect(server.local_addr(), 64)
        .await
        .expect("connect");
    let missing = DeviceId::from_raw(42);

    // Act
    let result = client.start_device_sync(&sender, missing).await;

    // Assert
    assert!(matches!(result, Err(SyncError::UnknownDevice(id)) if id == missing));
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    // Arrange: bind and immediately drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind(any_local()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    // Act
    let result = StateSyncClient::connect(addr, 8).await;

    // Assert
    assert!(matches!(result, Err(SyncError::Connect { .. })));
}
