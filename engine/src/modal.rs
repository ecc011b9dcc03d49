use std::sync::Arc;

use tokio::sync::Mutex;

use crate::sink::{ModalDeclined, ModalRequest, ModalSelection, ModalSink};

/// Serializes prompts across coordinators: one modal at a time, in request
/// order.
pub struct ModalQueue {
    sink: Arc<dyn ModalSink>,
    turn: Mutex<()>,
}

impl ModalQueue {
    pub fn new(sink: Arc<dyn ModalSink>) -> Self {
        Self {
            sink,
            turn: Mutex::new(()),
        }
    }

    pub async fn present(&self, request: ModalRequest) -> Result<ModalSelection, ModalDeclined> {
        let _turn = self.turn.lock().await;
        tracing::debug!(
            entity = %request.entity,
            source = %request.source,
            kind = ?request.kind,
            predictions = request.predictions.len(),
            "presenting modal"
        );
        self.sink.present(request).await
    }
}

impl std::fmt::Debug for ModalQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalQueue").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use verity_core::StatusMessages;
    use verity_types::{EntityKind, FieldSet};

    use super::*;
    use crate::sink::{ModalFut, ModalKind};

    /// Records the peak number of modals open at once.
    #[derive(Default)]
    struct Slow {
        open: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ModalSink for Slow {
        fn present(&self, _request: ModalRequest) -> ModalFut<'_> {
            Box::pin(async move {
                let now = self.open.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                self.open.fetch_sub(1, Ordering::SeqCst);
                Ok(ModalSelection::KeepOriginal)
            })
        }
    }

    fn request(source: &str) -> ModalRequest {
        ModalRequest {
            entity: EntityKind::Address,
            source: source.to_string(),
            kind: ModalKind::ConfirmInput,
            original: FieldSet::new(),
            predictions: Vec::new(),
            messages: StatusMessages::default(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn modals_never_overlap() {
        let sink = Arc::new(Slow::default());
        let queue = ModalQueue::new(sink.clone());

        let (a, b, c) = tokio::join!(
            queue.present(request("billing")),
            queue.present(request("shipping")),
            queue.present(request("other")),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(sink.peak.load(Ordering::SeqCst), 1);
    }
}
