//! Completion-callback to future bridge.
//!
//! Native operations report their outcome exactly once through a completion
//! callback. [`operation`] hands such an operation a [`Resolver`] and returns
//! an [`Operation`] future that yields the outcome. Callback style does not
//! leak past this point.
//!
//! # Example
//!
//! ```
//! use cartobind_core::{OperationAbandoned, operation};
//!
//! #[derive(Debug, PartialEq)]
//! struct Failed;
//!
//! impl From<OperationAbandoned> for Failed {
//!     fn from(_: OperationAbandoned) -> Self {
//!         Failed
//!     }
//! }
//!
//! let op = operation::<u32, Failed, _>(|resolver| {
//!     // A native API would call back later, on a thread of its own.
//!     std::thread::spawn(move || resolver.succeed(7));
//! });
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! assert_eq!(rt.block_on(op), Ok(7));
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::OperationAbandoned;
use crate::logging::targets;

/// A boxed completion callback, as native operations take them.
pub type Completion<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// The write side of an [`Operation`]. Consuming it delivers the outcome;
/// dropping it unused abandons the operation.
pub struct Resolver<T, E> {
    sender: Option<oneshot::Sender<Result<T, E>>>,
}

impl<T, E> Resolver<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Deliver the outcome.
    pub fn resolve(mut self, result: Result<T, E>) {
        if let Some(sender) = self.sender.take() {
            // The receiver may be gone; the result is discarded then.
            let _ = sender.send(result);
        }
    }

    /// Deliver a success.
    pub fn succeed(self, value: T) {
        self.resolve(Ok(value));
    }

    /// Deliver a failure.
    pub fn fail(self, error: E) {
        self.resolve(Err(error));
    }
}

impl<T, E> Drop for Resolver<T, E> {
    fn drop(&mut self) {
        if self.sender.is_some() {
            tracing::debug!(target: targets::ASYNC, "operation abandoned without a result");
        }
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("resolved", &self.sender.is_none())
            .finish()
    }
}

/// A single-resolution future over a native operation.
///
/// Resolves to the delivered outcome, or to `E::from(OperationAbandoned)` if
/// the [`Resolver`] was dropped without delivering one.
#[must_use = "operations do nothing observable unless awaited"]
pub struct Operation<T, E> {
    receiver: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Operation<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// An unresolved operation together with its resolver.
    fn pending() -> (Resolver<T, E>, Self) {
        let (sender, receiver) = oneshot::channel();
        (Resolver { sender: Some(sender) }, Self { receiver })
    }
}

impl<T, E> Future for Operation<T, E>
where
    E: From<OperationAbandoned>,
{
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(E::from(OperationAbandoned))))
    }
}

impl<T, E> fmt::Debug for Operation<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation").finish_non_exhaustive()
    }
}

/// Start a callback-style operation and return its future.
///
/// `start` runs immediately on the calling thread; it may resolve inline or
/// hand the resolver to another thread.
pub fn operation<T, E, F>(start: F) -> Operation<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    F: FnOnce(Resolver<T, E>),
{
    let (resolver, operation) = Operation::pending();
    start(resolver);
    operation
}

static_assertions::assert_impl_all!(Operation<u32, OperationAbandoned>: Send, Unpin);
static_assertions::assert_impl_all!(Resolver<u32, OperationAbandoned>: Send);
