//! pc_queue - bounded blocking MPMC queue with end-of-input broadcast
//!
//! Producers and consumers share one fixed-capacity buffer guarded by a mutex
//! and two counting semaphores (free slots, filled slots). Producers block
//! while the buffer is full; consumers block while it is empty.
//!
//! Termination is discovered rather than announced. Each producer that
//! deregisters leaves one end-of-input marker in the buffer. A consumer that
//! pops a marker while the buffer is empty and no producer is registered
//! knows the stream is over; it puts a marker back for the next consumer and
//! returns `Ok(None)`. Every other marker is swallowed by
//! [`PcQueue::dequeue`], so callers never see one.
//!
//! ```
//! use pc_queue::PcQueue;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(PcQueue::new(8).unwrap());
//!
//! let producers: Vec<_> = (0..2)
//!     .map(|p| {
//!         let queue = queue.clone();
//!         queue.register_producer().unwrap();
//!         thread::spawn(move || {
//!             for i in 0..50 {
//!                 queue.enqueue(p * 100 + i).unwrap();
//!             }
//!             queue.deregister_producer().unwrap();
//!         })
//!     })
//!     .collect();
//!
//! let consumers: Vec<_> = (0..3)
//!     .map(|_| {
//!         let queue = queue.clone();
//!         thread::spawn(move || queue.iter().map(Result::unwrap).count())
//!     })
//!     .collect();
//!
//! for p in producers {
//!     p.join().unwrap();
//! }
//! let total: usize = consumers.into_iter().map(|c| c.join().unwrap()).sum();
//! assert_eq!(total, 100);
//! ```
#![warn(missing_docs)]

mod config;
mod error;
mod queue;
pub mod ring;
mod semaphore;

pub use config::Builder;
pub use error::{Error, HookError, Result, Stage, TryEnqueueError};
pub use queue::{Entry, Iter, PcQueue, Producer};
pub use ring::RingBuffer;
