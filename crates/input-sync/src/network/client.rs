//! Sending side of state sync.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use input_core::{
    ButtonValue, DeviceButtonId, DeviceId, DeviceType, InputListener, InputManager, ListenerId,
    ListenerResponse,
};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::network::SyncError;
use crate::protocol::{encode_message, SyncMessage};

/// Wire address of each mirrored device.
type SyncedDevices = Arc<Mutex<HashMap<DeviceId, (DeviceType, u8)>>>;

/// Forwards committed changes of mirrored devices to the writer task.
struct OutboundListener {
    devices: SyncedDevices,
    outbound: mpsc::Sender<SyncMessage>,
}

impl OutboundListener {
    fn forward(&self, device: DeviceId, button: DeviceButtonId, value: ButtonValue) {
        let address = self
            .devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&device)
            .copied();
        let Some((device_type, index)) = address else {
            return;
        };
        let msg = SyncMessage::SetDeviceButton {
            device_type,
            index,
            button,
            value,
        };
        match self.outbound.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(%device, button, "sync outbound queue full; dropping change");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%device, button, "sync connection closed; dropping change");
            }
        }
    }
}

impl InputListener for OutboundListener {
    fn on_device_button_bool(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        _old: bool,
        new: bool,
    ) -> ListenerResponse {
        self.forward(device, button, ButtonValue::Bool(new));
        ListenerResponse::Continue
    }

    fn on_device_button_float(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        _old: f32,
        new: f32,
    ) -> ListenerResponse {
        self.forward(device, button, ButtonValue::Float(new));
        ListenerResponse::Continue
    }

    /// Just below a recorder, above application listeners.
    fn priority(&self) -> i32 {
        i32::MAX - 1
    }

    /// The peer mirrors committed state, consumed or not.
    fn observes_consumed(&self) -> bool {
        true
    }
}

/// A connection that mirrors local devices to a remote manager.
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), input_sync::network::SyncError> {
/// use input_core::{DeviceIndex, DeviceVariant, InputManager, Mouse};
/// use input_sync::network::StateSyncClient;
///
/// let mut manager = InputManager::new();
/// let mouse = manager.create_device::<Mouse>(DeviceIndex::Auto, DeviceVariant::Standard);
/// let mut client = StateSyncClient::connect("127.0.0.1:1211".parse().unwrap(), 1024).await?;
/// client.attach(&mut manager);
/// client.start_device_sync(&manager, mouse).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StateSyncClient {
    peer: SocketAddr,
    outbound: mpsc::Sender<SyncMessage>,
    devices: SyncedDevices,
    listener: Option<ListenerId>,
    writer: JoinHandle<()>,
}

impl StateSyncClient {
    /// Connects to `peer` and sends the handshake.
    ///
    /// `capacity` bounds the number of encoded-but-unsent messages; changes
    /// committed while the queue is full are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Connect`] if the TCP connection fails.
    pub async fn connect(peer: SocketAddr, capacity: usize) -> Result<Self, SyncError> {
        let stream = TcpStream::connect(peer)
            .await
            .map_err(|source| SyncError::Connect { addr: peer, source })?;
        stream.set_nodelay(true)?;
        info!("connected to sync peer at {peer}");

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let writer = tokio::spawn(write_loop(stream, rx, peer));
        tx.send(SyncMessage::hello())
            .await
            .map_err(|_| SyncError::NotConnected)?;

        Ok(Self {
            peer,
            outbound: tx,
            devices: SyncedDevices::default(),
            listener: None,
            writer,
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// True while the writer task is running.
    pub fn is_connected(&self) -> bool {
        !self.outbound.is_closed()
    }

    /// Installs the outbound listener on `manager`.  Idempotent.
    pub fn attach(&mut self, manager: &mut InputManager) -> ListenerId {
        if let Some(id) = self.listener {
            return id;
        }
        let id = manager.add_listener(OutboundListener {
            devices: Arc::clone(&self.devices),
            outbound: self.outbound.clone(),
        });
        self.listener = Some(id);
        id
    }

    /// Removes the outbound listener from `manager`.
    pub fn detach(&mut self, manager: &mut InputManager) {
        if let Some(id) = self.listener.take() {
            manager.remove_listener(id);
        }
    }

    /// Starts mirroring `device`: announces it to the peer, then sends its
    /// complete current state.  Starting an already mirrored device is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// - [`SyncError::UnknownDevice`] if `device` is not registered.
    /// - [`SyncError::GestureNotSyncable`] for gesture devices.
    /// - [`SyncError::IndexOutOfRange`] if the device index exceeds 255.
    /// - [`SyncError::NotConnected`] if the connection is gone.
    pub async fn start_device_sync(
        &self,
        manager: &InputManager,
        device: DeviceId,
    ) -> Result<(), SyncError> {
        let messages = {
            let input = manager
                .get_device(device)
                .ok_or(SyncError::UnknownDevice(device))?;
            let device_type = input.device_type();
            if device_type == DeviceType::Gesture {
                return Err(SyncError::GestureNotSyncable(device));
            }
            let index = u8::try_from(input.index()).map_err(|_| SyncError::IndexOutOfRange {
                device,
                index: input.index(),
            })?;

            let mut devices = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
            if devices.contains_key(&device) {
                return Ok(());
            }
            devices.insert(device, (device_type, index));

            std::iter::once(SyncMessage::StartDeviceSync { device_type, index })
                .chain(input.current_state().iter().map(|(button, value)| {
                    SyncMessage::SetDeviceButton {
                        device_type,
                        index,
                        button,
                        value,
                    }
                }))
                .collect::<Vec<_>>()
        };

        info!(%device, buttons = messages.len() - 1, "starting device sync with {}", self.peer);
        for msg in messages {
            self.outbound
                .send(msg)
                .await
                .map_err(|_| SyncError::NotConnected)?;
        }
        Ok(())
    }

    /// Stops forwarding changes of `device`.  The peer keeps its last state.
    pub fn stop_device_sync(&self, device: DeviceId) -> bool {
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&device)
            .is_some()
    }

    pub fn is_device_synced(&self, device: DeviceId) -> bool {
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&device)
    }

    /// Queues a keep-alive without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotConnected`] once the writer task has stopped.
    pub fn ping(&self) -> Result<(), SyncError> {
        match self.outbound.try_send(SyncMessage::Ping) {
            Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Closed(_)) => Err(SyncError::NotConnected),
        }
    }

    /// Detaches from `manager`, flushes queued messages and closes the
    /// connection.
    pub async fn close(mut self, manager: &mut InputManager) {
        self.detach(manager);
        let Self {
            outbound, writer, ..
        } = self;
        drop(outbound);
        if let Err(e) = writer.await {
            error!("sync writer task failed: {e}");
        }
    }
}

/// Owns the socket.  Ends when every sender is gone or a write fails.
async fn write_loop(mut stream: TcpStream, mut rx: mpsc::Receiver<SyncMessage>, peer: SocketAddr) {
    while let Some(msg) = rx.recv().await {
        let bytes = match encode_message(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("failed to encode sync message: {e}");
                continue;
            }
        };
        if let Err(e) = stream.write_all(&bytes).await {
            error!("failed to send to sync peer {peer}: {e}");
            break;
        }
    }
    if let Err(e) = stream.shutdown().await {
        debug!("shutdown of sync connection to {peer} failed: {e}");
    }
    info!("sync connection to {peer} closed");
}
