use core::fmt;

use thiserror::Error;

/// Error returned by an instrumentation hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which side of the queue a hook was attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The hook set with `set_on_enqueue`.
    Enqueue,
    /// The hook set with `set_on_dequeue`.
    Dequeue,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Enqueue => f.write_str("enqueue"),
            Stage::Dequeue => f.write_str("dequeue"),
        }
    }
}

/// Errors reported by [`PcQueue`](crate::PcQueue).
///
/// Every variant is fatal to the operation that produced it. The queue never
/// retries internally; a thread that sees one of these should stop taking
/// part in the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// A queue was requested with no slots.
    #[error("capacity must be greater than 0")]
    ZeroCapacity,

    /// A thread panicked while holding one of the queue's locks.
    #[error("{0} lock poisoned")]
    Poisoned(&'static str),

    /// An instrumentation hook rejected the item.
    #[error("{stage} hook failed")]
    Hook {
        /// The hook that failed.
        stage: Stage,
        /// What the hook returned.
        #[source]
        source: HookError,
    },

    /// `deregister_producer` was called with no producer registered.
    #[error("no registered producer to deregister")]
    NoProducers,

    /// A permit was held but the ring buffer disagreed with it.
    #[error("inconsistent queue state: {0}")]
    Inconsistent(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by [`PcQueue::try_enqueue`](crate::PcQueue::try_enqueue).
#[derive(Debug)]
pub enum TryEnqueueError<T> {
    /// No free slot was immediately available. The item is handed back.
    Full(T),
    /// The enqueue itself failed.
    Failed(Error),
}

impl<T> TryEnqueueError<T> {
    /// Returns the rejected item, if the queue was full.
    pub fn into_inner(self) -> Option<T> {
        match self {
            TryEnqueueError::Full(item) => Some(item),
            TryEnqueueError::Failed(_) => None,
        }
    }

    /// `true` for [`TryEnqueueError::Full`].
    pub fn is_full(&self) -> bool {
        matches!(self, TryEnqueueError::Full(_))
    }
}

impl<T> From<Error> for TryEnqueueError<T> {
    fn from(err: Error) -> Self {
        TryEnqueueError::Failed(err)
    }
}

impl<T> fmt::Display for TryEnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryEnqueueError::Full(_) => write!(f, "queue is full"),
            TryEnqueueError::Failed(err) => write!(f, "{err}"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for TryEnqueueError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TryEnqueueError::Full(_) => None,
            TryEnqueueError::Failed(err) => Some(err),
        }
    }
}
