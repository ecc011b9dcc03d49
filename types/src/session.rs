use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Accounting session of one coordinator.
///
/// The id is generated once per coordinator lifetime; the counter counts
/// billable remote calls since the last accounting flush.
#[derive(Debug)]
pub struct Session {
    id: Mutex<Option<String>>,
    counter: AtomicU64,
}

impl Session {
    /// Start a session with a fresh id.
    #[must_use]
    pub fn start() -> Self {
        Self {
            id: Mutex::new(Some(Uuid::new_v4().to_string())),
            counter: AtomicU64::new(0),
        }
    }

    /// A session without id. Calls made under it are never counted.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            id: Mutex::new(None),
            counter: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.id
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn counter(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Count one billable call. No-op without a session id.
    pub fn record_call(&self) -> u64 {
        if self.id().is_none() {
            return self.counter();
        }
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Subtract the `sent` calls an accounting flush reported. Calls counted
    /// while the flush was in flight stay for the next one.
    pub fn mark_accounted(&self, sent: u64) {
        // The closure never returns None.
        let _ = self
            .counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                Some(count.saturating_sub(sent))
            });
    }

    /// Issue a new id and zero the counter.
    pub fn reset(&self) {
        let mut id = self
            .id
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *id = Some(Uuid::new_v4().to_string());
        self.counter.store(0, Ordering::SeqCst);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::start()
    }
}
