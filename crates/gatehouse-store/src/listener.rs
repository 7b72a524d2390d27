//! Live listener handles

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::StoreResult;

/// Buffer size between a listener task and its handle
pub(crate) const LISTENER_BUFFER: usize = 16;

/// Handle to a live listener
///
/// Yields a value every time the watched query or document changes. The
/// producing task is aborted when the handle is dropped, which releases the
/// server-side listener.
#[derive(Debug)]
pub struct Listener<T> {
    rx: mpsc::Receiver<StoreResult<T>>,
    task: JoinHandle<()>,
}

impl<T> Listener<T> {
    /// Wrap a receiver and the task feeding it
    pub fn new(rx: mpsc::Receiver<StoreResult<T>>, task: JoinHandle<()>) -> Self {
        Self { rx, task }
    }

    /// Wait for the next snapshot
    ///
    /// Returns `None` once the listener has stopped.
    pub async fn next(&mut self) -> Option<StoreResult<T>> {
        self.rx.recv().await
    }

    /// Stop listening
    pub fn dispose(self) {}

    /// Whether the producing task has stopped
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Drop for Listener<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
