use crate::error::{HookError, Result};
use crate::queue::{Entry, Hook, PcQueue};

/// Configures a [`PcQueue`] before it is shared.
///
/// ```
/// use pc_queue::{Entry, PcQueue};
///
/// let queue = PcQueue::<u64>::builder(16)
///     .on_enqueue(|entry: Entry<'_, u64>| {
///         if let Entry::Item(v) = entry {
///             log::trace!("enqueued {v}");
///         }
///         Ok(())
///     })
///     .build()
///     .unwrap();
/// assert_eq!(queue.capacity(), 16);
/// ```
pub struct Builder<T> {
    capacity: usize,
    on_enqueue: Option<Hook<T>>,
    on_dequeue: Option<Hook<T>>,
}

impl<T> Builder<T> {
    /// A builder for a queue with `capacity` slots and no hooks.
    pub fn new(capacity: usize) -> Self {
        Builder {
            capacity,
            on_enqueue: None,
            on_dequeue: None,
        }
    }

    /// Replaces the slot count.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// See [`PcQueue::set_on_enqueue`].
    pub fn on_enqueue<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Entry<'_, T>) -> std::result::Result<(), HookError> + Send + 'static,
    {
        self.on_enqueue = Some(Box::new(hook));
        self
    }

    /// See [`PcQueue::set_on_dequeue`].
    pub fn on_dequeue<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Entry<'_, T>) -> std::result::Result<(), HookError> + Send + 'static,
    {
        self.on_dequeue = Some(Box::new(hook));
        self
    }

    /// Fails with [`Error::ZeroCapacity`](crate::Error::ZeroCapacity) for a
    /// zero capacity.
    pub fn build(self) -> Result<PcQueue<T>> {
        PcQueue::with_hooks(self.capacity, self.on_enqueue, self.on_dequeue)
    }
}

impl<T> core::fmt::Debug for Builder<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Builder")
            .field("capacity", &self.capacity)
            .field("on_enqueue", &self.on_enqueue.is_some())
            .field("on_dequeue", &self.on_dequeue.is_some())
            .finish()
    }
}
