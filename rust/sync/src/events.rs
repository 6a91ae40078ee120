use crate::room::{RoomCode, RoomState};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;

/// Default per-subscriber buffer. A subscriber that falls this far behind is
/// disconnected and has to resynchronise from the store.
pub const DEFAULT_EVENT_BUFFER: usize = 1000;

pub type ChangeSender = mpsc::Sender<RoomState>;
pub type ChangeReceiver = mpsc::Receiver<RoomState>;

/// Change notifications for one room, in commit order.
///
/// The stream ends when the subscriber was disconnected for being too slow or
/// the room was closed.
pub struct RoomSubscription {
    bus: EventBus,
    room_code: RoomCode,
    subscriber_id: usize,
    receiver: ChangeReceiver,
}

impl RoomSubscription {
    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    pub async fn recv(&mut self) -> Option<RoomState> {
        self.receiver.recv().await
    }

    /// Next buffered change, without waiting.
    pub fn try_recv(&mut self) -> Result<RoomState, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

impl Stream for RoomSubscription {
    type Item = RoomState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<RoomState>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.room_code, self.subscriber_id);
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug)]
struct EventBusInner {
    subscribers: RwLock<HashMap<RoomCode, Vec<(usize, ChangeSender)>>>,
    next_id: AtomicUsize,
    buffer: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_buffer(DEFAULT_EVENT_BUFFER)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            inner: Arc::new(EventBusInner {
                subscribers: RwLock::new(HashMap::new()),
                next_id: AtomicUsize::new(0),
                buffer: buffer.max(1),
            }),
        }
    }

    pub fn subscribe(&self, room_code: RoomCode) -> RoomSubscription {
        let (subscriber_id, receiver) = self.subscribe_raw(room_code.clone());
        RoomSubscription {
            bus: self.clone(),
            room_code,
            subscriber_id,
            receiver,
        }
    }

    fn subscribe_raw(&self, room_code: RoomCode) -> (usize, ChangeReceiver) {
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        let id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.entry(room_code.clone()).or_default().push((id, tx));

        tracing::info!(
            room_code = %room_code,
            subscriber_id = id,
            "client subscribed to room changes"
        );

        (id, rx)
    }

    /// Delivers `state` to every subscriber of its room.
    ///
    /// Callers hold the room's write lock, so deliveries for one room are
    /// never interleaved.
    pub fn broadcast(&self, state: &RoomState) {
        let room_code = &state.room_code;
        tracing::debug!(
            room_code = %room_code,
            version = state.version,
            "broadcasting room change"
        );

        let subscribers = {
            let guard = self
                .inner
                .subscribers
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.get(room_code).cloned()
        };

        let Some(list) = subscribers else {
            tracing::trace!(room_code = %room_code, "no subscribers for room");
            return;
        };

        let mut failed = Vec::new();
        for (id, sender) in list {
            // Never block the committer: a full or closed channel loses the
            // subscriber, whose stream then ends.
            if let Err(e) = sender.try_send(state.clone()) {
                tracing::warn!(
                    room_code = %room_code,
                    subscriber_id = id,
                    version = state.version,
                    error = %e,
                    "disconnecting room subscriber"
                );
                failed.push(id);
            }
        }
        if !failed.is_empty() {
            self.remove_subscribers(room_code, &failed);
        }
    }

    pub fn unsubscribe(&self, room_code: &str, subscriber_id: usize) {
        self.remove_subscribers(room_code, &[subscriber_id]);
    }

    /// Ends every stream for `room_code`.
    pub fn drop_room(&self, room_code: &str) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.remove(room_code);
    }

    pub fn subscriber_count(&self) -> usize {
        let guard = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.values().map(|list| list.len()).sum()
    }

    fn remove_subscribers(&self, room_code: &str, ids: &[usize]) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(list) = guard.get_mut(room_code) {
            list.retain(|(id, _)| !ids.contains(id));
            if list.is_empty() {
                guard.remove(room_code);
            }
        }
    }
}
