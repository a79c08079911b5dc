//! The blocking producer/consumer queue and its end-of-input protocol.

use core::fmt;
use std::sync::PoisonError;

use log::{debug, trace, warn};

use crate::error::{Error, HookError, Result, Stage, TryEnqueueError};
use crate::ring::RingBuffer;
use crate::semaphore::{Mutex, MutexGuard, Semaphore};

/// What a hook sees: a real payload or the end-of-input marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a, T> {
    /// A payload passed to `enqueue`.
    Item(&'a T),
    /// A marker left by a deregistering producer or a draining consumer.
    Eof,
}

pub(crate) type Hook<T> = Box<dyn FnMut(Entry<'_, T>) -> std::result::Result<(), HookError> + Send>;

/// Buffer slot. `Eof` is the sentinel a producer leaves behind when it
/// deregisters; it can never compare equal to a payload.
enum Slot<T> {
    Item(T),
    Eof,
}

impl<T> Slot<T> {
    fn entry(&self) -> Entry<'_, T> {
        match self {
            Slot::Item(item) => Entry::Item(item),
            Slot::Eof => Entry::Eof,
        }
    }
}

/// Everything guarded by the buffer lock.
struct State<T> {
    ring: RingBuffer<Slot<T>>,
    on_enqueue: Option<Hook<T>>,
    on_dequeue: Option<Hook<T>>,
}

/// Outcome of a single slot read.
enum Step<T> {
    Item(T),
    /// An end-of-input marker that did not mean global completion.
    Absorbed,
    Drained,
}

/// Bounded blocking MPMC queue.
///
/// Producers bracket their work with [`register_producer`] and
/// [`deregister_producer`]; each deregistration leaves one end-of-input marker
/// in the buffer. Consumers loop on [`dequeue`], which swallows markers until
/// it can prove that every producer is gone and the buffer is empty, and then
/// returns `Ok(None)`. The consumer that proves it puts a marker back before
/// leaving, so every other consumer blocked on the queue wakes up and reaches
/// the same conclusion, one at a time.
///
/// Share it between threads with `Arc` or scoped threads.
///
/// ```
/// use pc_queue::PcQueue;
/// use std::thread;
///
/// let queue = PcQueue::new(4).unwrap();
///
/// thread::scope(|s| {
///     queue.register_producer().unwrap();
///     s.spawn(|| {
///         for i in 0..10 {
///             queue.enqueue(i).unwrap();
///         }
///         queue.deregister_producer().unwrap();
///     });
///
///     let mut sum = 0;
///     while let Some(i) = queue.dequeue().unwrap() {
///         sum += i;
///     }
///     assert_eq!(sum, 45);
/// });
/// ```
///
/// [`register_producer`]: PcQueue::register_producer
/// [`deregister_producer`]: PcQueue::deregister_producer
/// [`dequeue`]: PcQueue::dequeue
pub struct PcQueue<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    free_slots: Semaphore,
    filled_slots: Semaphore,
    producers: Mutex<usize>,
}

impl<T> PcQueue<T> {
    /// Creates a queue with `capacity` slots and no hooks.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_hooks(capacity, None, None)
    }

    /// Starts a [`Builder`](crate::Builder) for a queue with `capacity` slots.
    pub fn builder(capacity: usize) -> crate::Builder<T> {
        crate::Builder::new(capacity)
    }

    pub(crate) fn with_hooks(
        capacity: usize,
        on_enqueue: Option<Hook<T>>,
        on_dequeue: Option<Hook<T>>,
    ) -> Result<Self> {
        if capacity == 0 {
            warn!("refusing to create a queue with zero capacity");
            return Err(Error::ZeroCapacity);
        }
        Ok(PcQueue {
            capacity,
            state: Mutex::new(State {
                ring: RingBuffer::new(capacity),
                on_enqueue,
                on_dequeue,
            }),
            free_slots: Semaphore::new("free_slots", capacity),
            filled_slots: Semaphore::new("filled_slots", 0),
            producers: Mutex::new(0),
        })
    }

    /// Installs the hook run under the buffer lock for every enqueued slot,
    /// end-of-input markers included. It must not block or touch the queue.
    pub fn set_on_enqueue<F>(&self, hook: F) -> Result<()>
    where
        F: FnMut(Entry<'_, T>) -> std::result::Result<(), HookError> + Send + 'static,
    {
        self.lock_state()?.on_enqueue = Some(Box::new(hook));
        Ok(())
    }

    /// Installs the hook run under the buffer lock for every dequeued slot.
    /// Same restrictions as [`set_on_enqueue`](PcQueue::set_on_enqueue).
    pub fn set_on_dequeue<F>(&self, hook: F) -> Result<()>
    where
        F: FnMut(Entry<'_, T>) -> std::result::Result<(), HookError> + Send + 'static,
    {
        self.lock_state()?.on_dequeue = Some(Box::new(hook));
        Ok(())
    }

    /// Adds `item` to the tail, blocking while the queue is full.
    pub fn enqueue(&self, item: T) -> Result<()> {
        self.put(Slot::Item(item))
    }

    /// Adds `item` only if a slot is free right now.
    pub fn try_enqueue(&self, item: T) -> std::result::Result<(), TryEnqueueError<T>> {
        if !self.free_slots.try_acquire()? {
            return Err(TryEnqueueError::Full(item));
        }
        self.commit(Slot::Item(item))?;
        Ok(())
    }

    /// Takes the next item, blocking while the queue is empty.
    ///
    /// Returns `Ok(None)` once every registered producer has deregistered and
    /// everything they enqueued has been handed out. From then on every call,
    /// from any thread, returns `Ok(None)` promptly.
    pub fn dequeue(&self) -> Result<Option<T>> {
        loop {
            match self.dequeue_one()? {
                Step::Item(item) => return Ok(Some(item)),
                Step::Absorbed => continue,
                Step::Drained => return Ok(None),
            }
        }
    }

    /// Iterates over dequeued items until the queue drains.
    ///
    /// An error is yielded once and ends the iteration.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            queue: self,
            done: false,
        }
    }

    /// Counts one more active producer.
    pub fn register_producer(&self) -> Result<()> {
        let mut producers = self.lock_producers()?;
        *producers += 1;
        trace!("producer registered ({} active)", *producers);
        Ok(())
    }

    /// Drops the producer count and leaves an end-of-input marker behind.
    ///
    /// The marker goes through an ordinary blocking enqueue, so this waits
    /// for a free slot like any other producer would.
    pub fn deregister_producer(&self) -> Result<()> {
        {
            let mut producers = self.lock_producers()?;
            if *producers == 0 {
                warn!("deregister_producer called with no registered producer");
                return Err(Error::NoProducers);
            }
            *producers -= 1;
            trace!("producer deregistered ({} active)", *producers);
        }
        self.put(Slot::Eof).inspect_err(|err| {
            warn!("failed to enqueue end-of-input marker: {err}");
        })
    }

    /// Registers a producer and returns a guard that deregisters it.
    pub fn producer(&self) -> Result<Producer<'_, T>> {
        self.register_producer()?;
        Ok(Producer {
            queue: self,
            finished: false,
        })
    }

    /// Number of currently registered producers.
    pub fn producers(&self) -> usize {
        *self.producers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Slot count fixed at creation.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Occupied slots, end-of-input markers included.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).ring.len()
    }

    /// `true` when no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the queue to its freshly created state, dropping anything
    /// still buffered and forgetting every producer. Hooks are kept.
    pub fn clear(&mut self) -> Result<()> {
        self.lock_state()?.ring.clear();
        *self.lock_producers()? = 0;
        self.free_slots.reset(self.capacity)?;
        self.filled_slots.reset(0)?;
        Ok(())
    }

    fn put(&self, slot: Slot<T>) -> Result<()> {
        self.free_slots.acquire().inspect_err(|err| {
            warn!("failed to wait for a free slot: {err}");
        })?;
        self.commit(slot)
    }

    /// Writes `slot` once a free-slot permit is already held.
    fn commit(&self, slot: Slot<T>) -> Result<()> {
        let mut state = self.lock_state()?;
        if let Some(hook) = state.on_enqueue.as_mut() {
            if let Err(source) = hook(slot.entry()) {
                drop(state);
                warn!("enqueue hook failed: {source}");
                self.free_slots.release()?;
                return Err(Error::Hook {
                    stage: Stage::Enqueue,
                    source,
                });
            }
        }
        if state.ring.push(slot).is_err() {
            drop(state);
            warn!("ring buffer full while holding a free slot permit");
            self.free_slots.release()?;
            return Err(Error::Inconsistent("ring full with a free slot permit held"));
        }
        drop(state);
        self.filled_slots.release()
    }

    fn dequeue_one(&self) -> Result<Step<T>> {
        self.filled_slots.acquire().inspect_err(|err| {
            warn!("failed to wait for a filled slot: {err}");
        })?;

        let mut state = self.lock_state()?;
        if let Err(err) = state.observe_head() {
            drop(state);
            warn!("{err}");
            if matches!(err, Error::Hook { .. }) {
                self.filled_slots.release()?;
            }
            return Err(err);
        }
        let slot = state
            .ring
            .pop()
            .map_err(|_| Error::Inconsistent("ring empty with a filled slot permit held"))?;

        let step = match slot {
            Slot::Item(item) => Step::Item(item),
            // The emptiness test and the producer count must be read in the
            // same buffer critical section, or two consumers can both miss
            // (or both claim) the final marker.
            Slot::Eof if state.ring.is_empty() && *self.lock_producers()? == 0 => Step::Drained,
            Slot::Eof => Step::Absorbed,
        };
        drop(state);
        self.free_slots.release()?;

        if let Step::Drained = step {
            // With no producer left, every outstanding free-slot permit
            // belongs to a marker on its way in, so a full buffer already
            // carries the signal forward and blocking here could never end.
            if self.free_slots.try_acquire()? {
                debug!("queue drained; passing end-of-input on");
                self.commit(Slot::Eof)?;
            } else {
                debug!("queue drained; end-of-input already queued");
            }
        }
        Ok(step)
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, State<T>>> {
        self.state.lock().map_err(|_| {
            warn!("buffer lock poisoned");
            Error::Poisoned("buffer")
        })
    }

    fn lock_producers(&self) -> Result<MutexGuard<'_, usize>> {
        self.producers.lock().map_err(|_| {
            warn!("producer count lock poisoned");
            Error::Poisoned("producers")
        })
    }

    #[cfg(all(test, not(loom)))]
    fn permits(&self) -> (usize, usize) {
        (self.free_slots.available(), self.filled_slots.available())
    }
}

impl<T> State<T> {
    /// Shows the head slot to the dequeue hook without removing it.
    fn observe_head(&mut self) -> Result<()> {
        let State { ring, on_dequeue, .. } = self;
        let head = ring
            .peek()
            .ok_or(Error::Inconsistent("ring empty with a filled slot permit held"))?;
        if let Some(hook) = on_dequeue.as_mut() {
            hook(head.entry()).map_err(|source| Error::Hook {
                stage: Stage::Dequeue,
                source,
            })?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for PcQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("producers", &self.producers())
            .finish()
    }
}

/// A registered producer. Deregisters when finished or dropped.
pub struct Producer<'a, T> {
    queue: &'a PcQueue<T>,
    finished: bool,
}

impl<T> Producer<'_, T> {
    /// Same as [`PcQueue::enqueue`].
    pub fn send(&self, item: T) -> Result<()> {
        self.queue.enqueue(item)
    }

    /// Deregisters now, reporting any failure.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.queue.deregister_producer()
    }
}

impl<T> Drop for Producer<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(err) = self.queue.deregister_producer() {
                warn!("producer deregistration on drop failed: {err}");
            }
        }
    }
}

impl<T> fmt::Debug for Producer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("finished", &self.finished)
            .finish()
    }
}

/// Iterator returned by [`PcQueue::iter`].
pub struct Iter<'a, T> {
    queue: &'a PcQueue<T>,
    done: bool,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.queue.dequeue() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<'a, T> IntoIterator for &'a PcQueue<T> {
    type Item = Result<T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
