//! # Background Worker Pool
//!
//! One process-wide tokio runtime, created on first use and never shut
//! down. Work is queued with `spawn_blocking`: the queue is unbounded and
//! jobs run in parallel, so two operations dispatched back to back may
//! finish in either order. There is no cancellation; dropping a [`Task`]
//! only discards its result.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::OnceLock;
use std::task::{Context, Poll};

use tokio::runtime::Runtime;
use tokio::sync::oneshot;

use crate::error::Error;

static POOL: OnceLock<Runtime> = OnceLock::new();

/// # Panics
///
/// Panics if the runtime cannot be built (thread spawn failure).
fn runtime() -> &'static Runtime {
    POOL.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .thread_name("cq-worker")
            .build()
            .expect("Failed to build background worker pool")
    })
}

/// Handle to an operation running on the pool.
///
/// Await it from async code, or call [`Task::wait`] from a plain thread.
pub struct Task<T> {
    receiver: oneshot::Receiver<Result<T, Error>>,
}

impl<T> Task<T> {
    /// Block the current thread until the operation finishes.
    ///
    /// Must not be called from within an async context.
    pub fn wait(self) -> Result<T, Error> {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(Error::TaskAborted))
    }
}

impl<T> Future for Task<T> {
    type Output = Result<T, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(Error::TaskAborted)))
    }
}

/// Run `work` on the pool.
pub fn spawn<T, F>(work: F) -> Task<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Error> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    runtime().spawn_blocking(move || {
        // Receiver may already be gone.
        let _ = tx.send(work());
    });
    Task { receiver: rx }
}

/// Run `work` on the pool and hand its outcome to `completion` on the same
/// worker thread. A panic in `work` reaches `completion` as
/// [`Error::TaskAborted`].
pub fn spawn_with<T, F, C>(work: F, completion: C)
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Error> + Send + 'static,
    C: FnOnce(Result<T, Error>) + Send + 'static,
{
    runtime().spawn_blocking(move || {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or(Err(Error::TaskAborted));
        completion(outcome);
    });
}
