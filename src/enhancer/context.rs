//! Operation context: cooperative cancellation and progress reporting

use tokio_util::sync::CancellationToken;

/// Receives progress updates while an enhancement runs
pub trait ProgressSink: Send + Sync {
    /// `increment` is the overall percentage reached so far
    fn report(&self, increment: u32, message: &str);
}

/// Progress sink that drops every update
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _increment: u32, _message: &str) {}
}

static NO_PROGRESS: NoProgress = NoProgress;

/// Context passed by reference into every enhancement call
pub struct OperationContext<'a> {
    cancel: CancellationToken,
    progress: &'a dyn ProgressSink,
}

impl<'a> OperationContext<'a> {
    pub fn new(cancel: CancellationToken, progress: &'a dyn ProgressSink) -> Self {
        Self { cancel, progress }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the caller cancels
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn report(&self, increment: u32, message: &str) {
        self.progress.report(increment, message);
    }
}

impl OperationContext<'static> {
    /// Context that is never cancelled and reports nowhere
    pub fn detached() -> Self {
        Self {
            cancel: CancellationToken::new(),
            progress: &NO_PROGRESS,
        }
    }
}
