//! Debounced event delivery.
//!
//! Emits of one event name are coalesced: each emit merges its changes into
//! the pending payload and reschedules delivery. When the delay passes
//! without another emit, listeners receive the union of the whole burst.
//! Deliveries of the same name never interleave; a later burst waits until
//! every listener of the earlier one has finished.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use verity_types::FieldSet;

pub type ListenerFut = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type Listener = Arc<dyn Fn(FieldSet) -> ListenerFut + Send + Sync>;

#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    delay: Duration,
    channels: Mutex<HashMap<String, Channel>>,
}

#[derive(Default)]
struct Channel {
    generation: u64,
    pending: FieldSet,
    listeners: Vec<Listener>,
    delivery: Arc<tokio::sync::Mutex<()>>,
}

impl EventBus {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: Arc::new(BusInner {
                delay,
                channels: Mutex::default(),
            }),
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    pub fn subscribe(&self, name: &str, listener: Listener) {
        self.inner
            .lock()
            .entry(name.to_string())
            .or_default()
            .listeners
            .push(listener);
    }

    /// Merge `changes` into the pending payload of `name` and restart its
    /// delay. Must be called from within a tokio runtime.
    pub fn emit(&self, name: &str, changes: &FieldSet) {
        let generation = {
            let mut channels = self.inner.lock();
            let channel = channels.entry(name.to_string()).or_default();
            channel.pending.merge(changes);
            channel.generation += 1;
            channel.generation
        };

        let inner = Arc::clone(&self.inner);
        let name = name.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            inner.deliver(&name, generation).await;
        });
    }
}

impl BusInner {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Channel>> {
        self.channels
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn deliver(&self, name: &str, generation: u64) {
        let (payload, listeners, delivery) = {
            let mut channels = self.lock();
            let Some(channel) = channels.get_mut(name) else {
                return;
            };
            // A later emit rescheduled this burst.
            if channel.generation != generation {
                return;
            }
            (
                std::mem::take(&mut channel.pending),
                channel.listeners.clone(),
                Arc::clone(&channel.delivery),
            )
        };

        let _turn = delivery.lock().await;
        tracing::trace!(event = name, fields = payload.len(), "delivering");
        for listener in listeners {
            listener(payload.clone()).await;
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("delay", &self.inner.delay)
            .finish_non_exhaustive()
    }
}
