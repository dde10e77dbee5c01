//! Single-resolution completion handles for callback-style collaborators.
//!
//! Native bridges and platform APIs report through callbacks that may fire
//! late, more than once, or never. [`pending`] returns a [`Resolver`] to hand
//! to the collaborator and a receiver to await with [`await_resolution`].
//! Only the first `resolve` is delivered; later ones return `false`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WaitError {
    #[error("no callback within {0:?}")]
    TimedOut(Duration),

    /// Every resolver was dropped without resolving.
    #[error("callback dropped without a value")]
    Abandoned,
}

/// Clonable completion handle. All clones share one slot.
pub struct Resolver<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> std::fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<T> Resolver<T> {
    /// Deliver `value` if nothing has been delivered yet.
    ///
    /// Returns `false` when the slot was already used or the waiter has
    /// given up (timed out or dropped).
    pub fn resolve(&self, value: T) -> bool {
        let sender = match self.slot.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        match self.slot.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }

    /// Resolved, or the waiter is gone so no value can be delivered.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        let guard = self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.as_ref().is_none_or(oneshot::Sender::is_closed)
    }
}

/// Create a resolver and the receiver it completes.
#[must_use]
pub fn pending<T>() -> (Resolver<T>, oneshot::Receiver<T>) {
    let (tx, rx) = oneshot::channel();
    let resolver = Resolver {
        slot: Arc::new(Mutex::new(Some(tx))),
    };
    (resolver, rx)
}

/// Wait for the first resolution, bounded by `timeout`.
///
/// The timer is dropped as soon as a value arrives. After a timeout the
/// receiver is dropped too, so late `resolve` calls become no-ops.
///
/// # Errors
///
/// [`WaitError::TimedOut`] if nothing arrived in time, [`WaitError::Abandoned`]
/// if all resolvers were dropped unresolved.
pub async fn await_resolution<T>(
    rx: oneshot::Receiver<T>,
    timeout: Duration,
) -> Result<T, WaitError> {
    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) => Err(WaitError::Abandoned),
        Err(_) => Err(WaitError::TimedOut(timeout)),
    }
}
