use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::broadcast;
use tracing::trace;

use voca_types::events::GatewayEvent;

/// Capacity of the broadcast ring; slow clients beyond this skip events.
const BROADCAST_CAPACITY: usize = 1024;

/// Fans gateway events out to every connected client.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    broadcast_tx: broadcast::Sender<GatewayEvent>,
    connected: AtomicUsize,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                connected: AtomicUsize::new(0),
            }),
        }
    }

    /// Subscribe to gateway events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event to all connected clients. Fire-and-forget: having
    /// no listeners is not an error.
    pub fn broadcast(&self, event: GatewayEvent) {
        if self.inner.broadcast_tx.send(event).is_err() {
            trace!("No gateway clients connected, event dropped");
        }
    }

    /// Returns the number of connected clients including the new one.
    pub fn client_connected(&self) -> usize {
        self.inner.connected.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns the number of clients still connected.
    pub fn client_disconnected(&self) -> usize {
        self.inner
            .connected
            .fetch_sub(1, Ordering::Relaxed)
            .saturating_sub(1)
    }

    pub fn connected(&self) -> usize {
        self.inner.connected.load(Ordering::Relaxed)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_without_listeners_is_fine() {
        let dispatcher = Dispatcher::new();
        dispatcher.broadcast(GatewayEvent::hello());
    }

    #[tokio::test]
    async fn subscribers_receive_broadcasts() {
        let dispatcher = Dispatcher::new();
        let mut a = dispatcher.subscribe();
        let mut b = dispatcher.clone().subscribe();

        dispatcher.broadcast(GatewayEvent::hello());

        assert_eq!(a.recv().await.unwrap(), GatewayEvent::hello());
        assert_eq!(b.recv().await.unwrap(), GatewayEvent::hello());
    }

    #[test]
    fn connection_count_tracks_clients() {
        let dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.client_connected(), 1);
        assert_eq!(dispatcher.client_connected(), 2);
        assert_eq!(dispatcher.client_disconnected(), 1);
        assert_eq!(dispatcher.connected(), 1);
    }
}
