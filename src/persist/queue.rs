use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use crate::model::PendingMutation;

/// Producer half of the persistence hand-off. Enqueue never blocks the
/// scan loop: the channel is unbounded and the worker is the only consumer.
#[derive(Clone)]
pub struct PersistenceQueue {
    tx: mpsc::UnboundedSender<PendingMutation>,
}

/// Consumer half, owned exclusively by the batch worker.
pub struct QueueDrain {
    rx: mpsc::UnboundedReceiver<PendingMutation>,
}

pub struct Drained {
    pub mutations: Vec<PendingMutation>,
    /// True once every producer has been dropped and the buffer is empty.
    pub closed: bool,
}

pub fn persistence_queue() -> (PersistenceQueue, QueueDrain) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PersistenceQueue { tx }, QueueDrain { rx })
}

impl PersistenceQueue {
    pub fn enqueue(&self, mutation: PendingMutation) {
        if self.tx.send(mutation).is_err() {
            // only possible after the worker stopped during shutdown
            warn!("persistence queue closed; dropping mutation");
        }
    }
}

impl QueueDrain {
    /// Number of mutations currently buffered.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Collect up to `max_items` mutations in FIFO order, waiting at most
    /// `max_wait` from the start of the call. Returns early with fewer
    /// items when the deadline passes or the channel closes.
    pub async fn drain(&mut self, max_items: usize, max_wait: Duration) -> Drained {
        let deadline = tokio::time::Instant::now() + max_wait;
        let mut mutations = Vec::new();
        let mut closed = false;

        while mutations.len() < max_items {
            tokio::select! {
                item = self.rx.recv() => match item {
                    Some(mutation) => mutations.push(mutation),
                    None => {
                        closed = true;
                        break;
                    }
                },
                _ = tokio::time::sleep_until(deadline) => break,
            }
        }

        Drained { mutations, closed }
    }
}
