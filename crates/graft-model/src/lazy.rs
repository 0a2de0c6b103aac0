//! Lazily computed, shareable values.
//!
//! Two flavors exist because they protect against different hazards:
//!
//! - [`LockingLazy`] computes under an exclusive lock, so the value is built
//!   at most once per reset. The lock is not reentrant: the initializer must
//!   never touch the same cell, and must never wait on a lock that a thread
//!   blocked on this cell could hold.
//! - [`AtomicLazy`] computes without holding any lock and publishes the first
//!   finished value. Racing initializers may each compute once; losers drop
//!   their result. Use it for idempotent computations that may need
//!   project-level locks owned by other threads.
//!
//! Both publish a fully constructed `Arc<T>`; readers never observe a
//! partially built value.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

/// A resettable value computed at most once under an exclusive lock.
#[derive(Debug)]
pub struct LockingLazy<T> {
    cell: Mutex<Option<Arc<T>>>,
}

impl<T> LockingLazy<T> {
    /// Creates an uninitialized cell.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: Mutex::new(None),
        }
    }

    /// Returns the value, computing it with `init` on first access.
    ///
    /// A failed initialization leaves the cell empty.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `init`.
    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<Arc<T>, E> {
        let mut guard = self.cell.lock();
        if let Some(value) = guard.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(init()?);
        *guard = Some(Arc::clone(&value));
        Ok(value)
    }

    /// Returns the value if it has been computed.
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.lock().clone()
    }

    /// Drops the computed value; holders of a previous `Arc` keep it.
    pub fn reset(&self) -> Option<Arc<T>> {
        self.cell.lock().take()
    }
}

impl<T> Default for LockingLazy<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A value computed without locking; the first published result wins.
#[derive(Debug)]
pub struct AtomicLazy<T> {
    cell: OnceLock<Arc<T>>,
}

impl<T> AtomicLazy<T> {
    /// Creates an uninitialized cell.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Returns the value, computing it with `init` if nothing is published yet.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> Arc<T> {
        if let Some(value) = self.cell.get() {
            return Arc::clone(value);
        }
        let candidate = Arc::new(init());
        let _ = self.cell.set(Arc::clone(&candidate));
        self.cell.get().map_or(candidate, Arc::clone)
    }

    /// Returns whether a value has been published.
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Default for AtomicLazy<T> {
    fn default() -> Self {
        Self::new()
    }
}
