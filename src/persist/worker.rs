use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::model::PendingMutation;
use crate::persist::{AttendanceStore, QueueDrain};

/// Attempts per batch before it is reported and dropped so one poisoned
/// batch cannot wedge the queue.
const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Single long-running consumer of the persistence queue. Coalesces
/// mutations into batches by size or elapsed time and commits them to the
/// store off the scan path. On shutdown (queue closed) it drains and
/// flushes everything outstanding before the task exits.
pub struct BatchWorker {
    drain: QueueDrain,
    store: Arc<dyn AttendanceStore>,
    batch_size: usize,
    batch_timeout: Duration,
}

impl BatchWorker {
    pub fn new(
        drain: QueueDrain,
        store: Arc<dyn AttendanceStore>,
        batch_size: usize,
        batch_timeout: Duration,
    ) -> Self {
        Self { drain, store, batch_size, batch_timeout }
    }

    pub async fn run(mut self) {
        let mut closed = false;

        loop {
            let drained = self.drain.drain(self.batch_size, self.batch_timeout).await;
            closed = closed || drained.closed;

            if !drained.mutations.is_empty() {
                self.commit_with_retry(drained.mutations).await;
            }

            if closed {
                break;
            }
        }

        info!("Batch worker drained and stopped");
    }

    /// Commit one batch, retrying transient failures with the batch held
    /// back. The cache stays authoritative throughout, so scan processing
    /// is unaffected by store trouble.
    async fn commit_with_retry(&self, batch: Vec<PendingMutation>) {
        let mut attempts = 0u32;

        loop {
            match self.store.commit_batch(&batch).await {
                Ok(()) => {
                    debug!(count = batch.len(), "Batch committed");
                    return;
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= MAX_COMMIT_ATTEMPTS {
                        error!(
                            error = %e,
                            dropped = batch.len(),
                            "Batch commit failed {MAX_COMMIT_ATTEMPTS} times; giving up on batch"
                        );
                        return;
                    }
                    warn!(error = %e, attempt = attempts, "Batch commit failed; retrying");
                    tokio::time::sleep(self.batch_timeout).await;
                }
            }
        }
    }
}
