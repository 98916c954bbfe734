use tracing::debug;

/// Fire-and-forget success/failure indicator (LED + buzzer on the real
/// device). Nothing in the pipeline consumes a return value from it.
pub trait FeedbackSink: Send + Sync {
    fn signal(&self, success: bool);
}

/// Default sink for headless runs: the outcome already lands in the log.
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn signal(&self, success: bool) {
        debug!(success, "Feedback signal");
    }
}
