//! Per-call operation state, progress reporting and cancellation.
//!
//! Every API call runs as one operation: `Pending -> InFlight -> {Completed,
//! Failed, Cancelled}`. Callbacks are delivered through a re-entrant gate so
//! that once `cancel()` returns, no progress or completion callback for that
//! operation can start, and a callback may itself call `cancel()`.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use cld_core::Result;
use parking_lot::ReentrantMutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Lifecycle of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationState {
    Pending = 0,
    InFlight = 1,
    Completed = 2,
    Failed = 3,
    Cancelled = 4,
}

impl OperationState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => OperationState::Pending,
            1 => OperationState::InFlight,
            2 => OperationState::Completed,
            3 => OperationState::Failed,
            _ => OperationState::Cancelled,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationState::Completed | OperationState::Failed | OperationState::Cancelled
        )
    }
}

/// Upload progress. `bytes_written` is the size of the latest chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub bytes_written: u64,
    pub total_bytes_written: u64,
    pub total_bytes_expected: u64,
}

pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

pub(crate) struct OperationShared {
    state: AtomicU8,
    gate: ReentrantMutex<()>,
    token: CancellationToken,
    progress: Option<ProgressCallback>,
    finished: watch::Sender<bool>,
}

impl OperationShared {
    pub(crate) fn new(progress: Option<ProgressCallback>) -> Arc<Self> {
        let (finished, _) = watch::channel(false);
        Arc::new(Self {
            state: AtomicU8::new(OperationState::Pending as u8),
            gate: ReentrantMutex::new(()),
            token: CancellationToken::new(),
            progress,
            finished,
        })
    }

    pub(crate) fn state(&self) -> OperationState {
        OperationState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: OperationState, to: OperationState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Pending -> InFlight. False when the operation was cancelled first.
    pub(crate) fn start(&self) -> bool {
        self.transition(OperationState::Pending, OperationState::InFlight)
    }

    pub(crate) fn report_progress(&self, progress: Progress) {
        let Some(callback) = &self.progress else {
            return;
        };
        let _gate = self.gate.lock();
        if self.state() == OperationState::InFlight {
            callback(progress);
        }
    }

    /// Deliver the outcome exactly once, unless the operation was cancelled.
    pub(crate) fn complete<T, C>(&self, result: Result<T>, completion: C)
    where
        C: FnOnce(Result<T>),
    {
        let _gate = self.gate.lock();
        let target = if result.is_ok() {
            OperationState::Completed
        } else {
            OperationState::Failed
        };
        if self.transition(OperationState::InFlight, target) {
            completion(result);
        }
    }

    pub(crate) fn cancel(&self) -> bool {
        let cancelled = self.transition(OperationState::Pending, OperationState::Cancelled)
            || self.transition(OperationState::InFlight, OperationState::Cancelled);
        if cancelled {
            self.token.cancel();
            // Wait out a callback running on another thread. Re-entrant, so a
            // callback cancelling its own operation does not block.
            drop(self.gate.lock());
        }
        cancelled
    }

    pub(crate) fn mark_finished(&self) {
        self.finished.send_replace(true);
    }
}

/// Tracks bytes sent for one operation, possibly across several requests.
#[derive(Clone)]
pub(crate) struct ProgressReporter {
    shared: Arc<OperationShared>,
    written: Arc<AtomicU64>,
    expected: u64,
}

impl ProgressReporter {
    pub(crate) fn new(shared: Arc<OperationShared>, expected: u64) -> Self {
        Self {
            shared,
            written: Arc::new(AtomicU64::new(0)),
            expected,
        }
    }

    pub(crate) fn advance(&self, bytes: u64) {
        if bytes == 0 {
            return;
        }
        let total = self.written.fetch_add(bytes, Ordering::AcqRel) + bytes;
        self.shared.report_progress(Progress {
            bytes_written: bytes,
            total_bytes_written: total,
            total_bytes_expected: self.expected,
        });
    }
}

/// Handle returned for every started operation. Cloning shares the same operation.
#[derive(Clone)]
pub struct OperationHandle {
    shared: Arc<OperationShared>,
    finished: watch::Receiver<bool>,
}

impl OperationHandle {
    pub(crate) fn new(shared: Arc<OperationShared>) -> Self {
        let finished = shared.finished.subscribe();
        Self { shared, finished }
    }

    /// Request cancellation. No callback for this operation starts after this
    /// returns. A no-op once the operation has completed or failed.
    pub fn cancel(&self) {
        if self.shared.cancel() {
            tracing::debug!("Operation cancelled");
        }
    }

    pub fn state(&self) -> OperationState {
        self.shared.state()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == OperationState::Cancelled
    }

    /// Resolves when the background task has exited, after any completion callback.
    pub async fn finished(&self) {
        let mut finished = self.finished.clone();
        // The sender lives in the shared state held by this handle and is
        // never dropped first. The task marks itself finished on every exit,
        // a panicking callback included.
        let _ = finished.wait_for(|done| *done).await;
    }
}

impl std::fmt::Debug for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// Cancels the operation when dropped, used by the async convenience methods
/// so dropping their future aborts the transfer.
pub(crate) struct CancelOnDrop(pub(crate) OperationHandle);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cld_core::CloudinaryError;
    use std::sync::Mutex;

    #[test]
    fn test_cancel_before_start_suppresses_everything() {
        let shared = OperationShared::new(None);
        let handle = OperationHandle::new(shared.clone());
        handle.cancel();
        assert!(!shared.start());

        let fired = Arc::new(Mutex::new(false));
        let f = fired.clone();
        shared.complete(Ok(()), move |_| *f.lock().unwrap() = true);
        assert!(!*fired.lock().unwrap());
        assert_eq!(handle.state(), OperationState::Cancelled);
    }

    #[test]
    fn test_completion_fires_once() {
        let shared = OperationShared::new(None);
        assert!(shared.start());
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        shared.complete(Ok(1), move |_| *c.lock().unwrap() += 1);
        let c = count.clone();
        shared.complete(Ok(2), move |_| *c.lock().unwrap() += 1);
        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(shared.state(), OperationState::Completed);
    }

    #[test]
    fn test_failure_state() {
        let shared = OperationShared::new(None);
        assert!(shared.start());
        shared.complete::<(), _>(Err(CloudinaryError::Transport("reset".into())), |r| {
            assert!(r.is_err())
        });
        assert_eq!(shared.state(), OperationState::Failed);
    }

    #[test]
    fn test_cancel_after_completion_is_noop() {
        let shared = OperationShared::new(None);
        let handle = OperationHandle::new(shared.clone());
        assert!(shared.start());
        shared.complete(Ok(()), |_| {});
        handle.cancel();
        assert_eq!(handle.state(), OperationState::Completed);
        assert!(!shared.token().is_cancelled());
    }

    #[test]
    fn test_progress_stops_after_cancel() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let shared = OperationShared::new(Some(Arc::new(move |p: Progress| {
            s.lock().unwrap().push(p.total_bytes_written)
        })));
        let handle = OperationHandle::new(shared.clone());
        let reporter = ProgressReporter::new(shared.clone(), 30);
        assert!(shared.start());

        reporter.advance(10);
        reporter.advance(10);
        handle.cancel();
        reporter.advance(10);

        assert_eq!(*seen.lock().unwrap(), vec![10, 20]);
        assert!(shared.token().is_cancelled());
    }

    #[test]
    fn test_cancel_from_inside_callback_does_not_deadlock() {
        let slot: Arc<Mutex<Option<OperationHandle>>> = Arc::new(Mutex::new(None));
        let s = slot.clone();
        let shared = OperationShared::new(Some(Arc::new(move |_p: Progress| {
            if let Some(handle) = s.lock().unwrap().as_ref() {
                handle.cancel();
            }
        })));
        let handle = OperationHandle::new(shared.clone());
        *slot.lock().unwrap() = Some(handle.clone());
        let reporter = ProgressReporter::new(shared.clone(), 5);
        assert!(shared.start());

        reporter.advance(5);
        assert_eq!(handle.state(), OperationState::Cancelled);
    }
}
