//! Receiving side of state sync.
//!
//! Each accepted connection gets a reader task that decodes frames and hands
//! them to the manager's thread through a [`ChangeQueue`].  The
//! [`InboundModifier`] drains that queue once per frame, resolves the wire
//! address `(type, index)` to a local device id and pushes ordinary
//! [`Change`]s.  A device stays synced while at least one connected peer
//! is mirroring it.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use input_core::{
    Change, ChangeProducer, ChangeQueue, DeviceId, DeviceStateModifier, InputManager,
    ModifierContext, ModifierId,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, trace, warn};

use crate::network::{read_message, SyncError};
use crate::protocol::{SyncMessage, PROTOCOL_VERSION};

/// What a reader task reports to the manager thread.
#[derive(Debug, Clone, Copy, PartialEq)]
enum InboundEvent {
    Message { peer: SocketAddr, msg: SyncMessage },
    Closed { peer: SocketAddr },
}

/// Peers mirroring each local device.  A device stays synced while its set
/// is non-empty.
type Mirrors = HashMap<DeviceId, HashSet<SocketAddr>>;

fn lock(mirrors: &Mutex<Mirrors>) -> std::sync::MutexGuard<'_, Mirrors> {
    mirrors.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Applies inbound sync traffic inside the frame.
struct InboundModifier {
    queue: ChangeQueue<InboundEvent>,
    mirrors: Arc<Mutex<Mirrors>>,
}

/// Applies one inbound event from a reader task.
fn handle(mirrors: &mut Mirrors, ctx: &mut ModifierContext<'_>, event: InboundEvent) {
    let (peer, msg) = match event {
        InboundEvent::Message { peer, msg } => (peer, msg),
        InboundEvent::Closed { peer } => {
            mirrors.retain(|&device, peers| {
                if !peers.remove(&peer) {
                    return true;
                }
                if peers.is_empty() {
                    ctx.set_synced(device, false);
                    info!(%peer, %device, "released mirrored device");
                    return false;
                }
                debug!(%peer, %device, remaining = peers.len(), "device still mirrored");
                true
            });
            return;
        }
    };
    match msg {
        SyncMessage::Hello {
            protocol_version,
            lib_version,
        } => {
            info!(%peer, protocol_version, lib_version, "sync peer said hello");
        }
        SyncMessage::Ping => trace!(%peer, "ping"),
        SyncMessage::StartDeviceSync { device_type, index } => {
            let Some(device) = ctx.devices().find_device_id(device_type, u32::from(index)) else {
                warn!(%peer, "peer started sync of {device_type} {index}, which does not exist here");
                return;
            };
            mirrors.entry(device).or_default().insert(peer);
            ctx.set_synced(device, true);
            info!(%peer, %device, "mirroring {device_type} {index}");
        }
        SyncMessage::SetDeviceButton {
            device_type,
            index,
            button,
            value,
        } => {
            let Some(device) = ctx.devices().find_device_id(device_type, u32::from(index)) else {
                debug!(%peer, button, "dropping change for missing {device_type} {index}");
                return;
            };
            ctx.push(Change::new(device, button, value));
        }
    }
}

impl DeviceStateModifier for InboundModifier {
    fn update(&mut self, ctx: &mut ModifierContext<'_>) {
        let mut mirrors = lock(&self.mirrors);
        for event in self.queue.drain() {
            handle(&mut mirrors, ctx, event);
        }
    }
}

/// Accepts sync peers and feeds their input into a manager.
#[derive(Debug)]
pub struct StateSyncServer {
    local_addr: SocketAddr,
    queue: Option<ChangeQueue<InboundEvent>>,
    modifier: Option<ModifierId>,
    mirrors: Arc<Mutex<Mirrors>>,
    connections: Arc<AtomicUsize>,
    stop: oneshot::Sender<()>,
    accept: JoinHandle<()>,
}

impl StateSyncServer {
    /// Binds `addr` and starts accepting connections in the background.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Bind`] if the socket cannot be bound.
    pub async fn bind(addr: SocketAddr) -> Result<Self, SyncError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| SyncError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;
        info!("state sync listening on {local_addr}");

        let queue = ChangeQueue::<InboundEvent>::new();
        let connections = Arc::new(AtomicUsize::new(0));
        let (stop, stopped) = oneshot::channel();
        let accept = tokio::spawn(accept_loop(
            listener,
            queue.producer(),
            Arc::clone(&connections),
            stopped,
        ));

        Ok(Self {
            local_addr,
            queue: Some(queue),
            modifier: None,
            mirrors: Arc::new(Mutex::new(HashMap::new())),
            connections,
            stop,
            accept,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of peers currently connected.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Acquire)
    }

    /// Number of local devices at least one peer is mirroring.
    pub fn mirrored_device_count(&self) -> usize {
        lock(&self.mirrors).len()
    }

    /// Installs the inbound modifier on `manager`.  Only the first call
    /// installs; later calls return the same id.
    pub fn attach(&mut self, manager: &mut InputManager) -> Option<ModifierId> {
        if let Some(queue) = self.queue.take() {
            let id = manager.add_device_state_modifier(InboundModifier {
                queue,
                mirrors: Arc::clone(&self.mirrors),
            });
            self.modifier = Some(id);
        }
        self.modifier
    }

    /// Stops accepting, closes every peer connection and releases the
    /// devices peers were mirroring.  Returns once all connection tasks have
    /// finished.
    pub async fn shutdown(self, manager: &mut InputManager) {
        // A send error means the accept task already ended.
        let _ = self.stop.send(());
        if let Err(e) = self.accept.await {
            error!("sync accept task failed: {e}");
        }
        if let Some(id) = self.modifier {
            manager.remove_device_state_modifier(id);
        }
        for (device, _) in lock(&self.mirrors).drain() {
            manager.set_synced(device, false);
        }
        info!("state sync on {} stopped", self.local_addr);
    }
}

async fn accept_loop(
    listener: TcpListener,
    producer: ChangeProducer<InboundEvent>,
    connections: Arc<AtomicUsize>,
    mut stopped: oneshot::Receiver<()>,
) {
    let mut readers = JoinSet::new();
    loop {
        tokio::select! {
            _ = &mut stopped => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    info!("sync peer connected from {peer}");
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("set_nodelay failed for {peer}: {e}");
                    }
                    connections.fetch_add(1, Ordering::AcqRel);
                    let producer = producer.clone();
                    let connections = Arc::clone(&connections);
                    readers.spawn(async move {
                        read_loop(stream, peer, &producer).await;
                        producer.push(InboundEvent::Closed { peer });
                        connections.fetch_sub(1, Ordering::AcqRel);
                        info!("sync peer {peer} disconnected");
                    });
                }
                Err(e) => {
                    error!("accept failed: {e}");
                }
            },
            Some(finished) = readers.join_next(), if !readers.is_empty() => {
                if let Err(e) = finished {
                    error!("sync connection task failed: {e}");
                }
            }
        }
    }
    let open = readers.len();
    // Aborts every reader; dropping their streams closes the sockets.
    readers.shutdown().await;
    connections.store(0, Ordering::Release);
    debug!(open, "closed sync connections");
}

async fn read_loop(mut stream: TcpStream, peer: SocketAddr, producer: &ChangeProducer<InboundEvent>) {
    loop {
        let msg = match read_message(&mut stream).await {
            Ok(Some(msg)) => msg,
            Ok(None) => break,
            Err(e) => {
                warn!("dropping sync peer {peer}: {e}");
                break;
            }
        };
        if let SyncMessage::Hello {
            protocol_version, ..
        } = msg
        {
            if protocol_version != PROTOCOL_VERSION {
                warn!(
                    "sync peer {peer} speaks protocol {protocol_version}, expected {PROTOCOL_VERSION}"
                );
                break;
            }
        }
        if !producer.push(InboundEvent::Message { peer, msg }) {
            // The modifier was removed; nobody will read further input.
            break;
        }
    }
}
