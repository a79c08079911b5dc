//! Counting semaphore on top of a mutex and condition variable.

#[cfg(loom)]
pub(crate) use loom::sync::{Condvar, Mutex, MutexGuard};
#[cfg(not(loom))]
pub(crate) use std::sync::{Condvar, Mutex, MutexGuard};

use log::warn;

use crate::error::{Error, Result};

pub(crate) struct Semaphore {
    name: &'static str,
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    pub(crate) fn new(name: &'static str, permits: usize) -> Self {
        Semaphore {
            name,
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Takes one permit, blocking until one is released.
    pub(crate) fn acquire(&self) -> Result<()> {
        let mut permits = self.lock()?;
        while *permits == 0 {
            permits = self.available.wait(permits).map_err(|_| self.poisoned())?;
        }
        *permits -= 1;
        Ok(())
    }

    /// Takes one permit if one is free right now.
    pub(crate) fn try_acquire(&self) -> Result<bool> {
        let mut permits = self.lock()?;
        if *permits == 0 {
            return Ok(false);
        }
        *permits -= 1;
        Ok(true)
    }

    /// Returns one permit and wakes a single waiter.
    pub(crate) fn release(&self) -> Result<()> {
        let mut permits = self.lock()?;
        *permits += 1;
        drop(permits);
        self.available.notify_one();
        Ok(())
    }

    /// Overwrites the permit count. Must not race with waiters.
    pub(crate) fn reset(&self, permits: usize) -> Result<()> {
        *self.lock()? = permits;
        Ok(())
    }

    #[cfg(all(test, not(loom)))]
    pub(crate) fn available(&self) -> usize {
        self.lock().map(|permits| *permits).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, usize>> {
        self.permits.lock().map_err(|_| self.poisoned())
    }

    fn poisoned(&self) -> Error {
        warn!("semaphore {} poisoned", self.name);
        Error::Poisoned(self.name)
    }
}
