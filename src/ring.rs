//! Fixed-capacity FIFO ring buffer.
//!
//! Purely sequential: every operation takes `&mut self`, so exclusive access
//! is the caller's problem. [`PcQueue`](crate::PcQueue) keeps one behind its
//! buffer lock.

use core::fmt;

/// Returned by [`RingBuffer::push`] when every slot is occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the rejected item.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ring buffer is full")
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}

/// Returned by [`RingBuffer::pop`] when no slot is occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Empty;

impl fmt::Display for Empty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ring buffer is empty")
    }
}

impl std::error::Error for Empty {}

/// Bounded FIFO store. `head` is the next slot to read, `tail` the next slot
/// to write; both wrap modulo capacity.
pub struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty ring with `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        let slots = (0..capacity).map(|_| None).collect::<Vec<_>>();
        RingBuffer {
            slots: slots.into_boxed_slice(),
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Appends at the tail.
    pub fn push(&mut self, item: T) -> Result<(), Full<T>> {
        if self.is_full() {
            return Err(Full(item));
        }
        self.slots[self.tail] = Some(item);
        self.tail = self.advance(self.tail);
        self.len += 1;
        Ok(())
    }

    /// Removes from the head.
    pub fn pop(&mut self) -> Result<T, Empty> {
        if self.is_empty() {
            return Err(Empty);
        }
        let item = self.slots[self.head].take().ok_or(Empty)?;
        self.head = self.advance(self.head);
        self.len -= 1;
        Ok(item)
    }

    /// The value the next `pop` would return.
    pub fn peek(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.head].as_ref()
    }

    /// Drops every stored value and rewinds both indices.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `true` when every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    #[inline]
    fn advance(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.slots.len() {
            0
        } else {
            next
        }
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .field("head", &self.head)
            .field("tail", &self.tail)
            .finish()
    }
}
