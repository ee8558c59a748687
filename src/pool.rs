//! Bounded object pools for allocation-free reuse across tessellation calls.

use core::fmt;
use core::ops;
use std::sync::{Arc, Mutex, MutexGuard};

/// An object that can live in a [`Pool`]: constructible on demand and
/// restorable to a blank, reusable state.
pub trait PoolItem: Default {
    /// Restores the object to a reusable state, keeping its allocations where
    /// possible. Called automatically when the object returns to its pool.
    fn reset(&mut self);
}

/// Sizing policy of a [`Pool`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolConfig {
    /// Maximum number of idle objects retained for reuse; objects returned
    /// beyond this bound are dropped.
    pub max_idle: usize,
    /// Maximum number of objects that may exist (idle plus borrowed) at once.
    /// Acquisition fails once this many are borrowed.
    pub max_total: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle: 10,
            max_total: 32,
        }
    }
}

/// Error from [`Pool::acquire()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, displaydoc::Display)]
#[non_exhaustive]
pub enum PoolError {
    /// object pool exhausted: all {max_total} objects are borrowed
    Exhausted {
        /// The pool's [`PoolConfig::max_total`] bound.
        max_total: usize,
    },
}

impl core::error::Error for PoolError {}

/// A bounded pool of reusable objects.
///
/// Borrowing hands out a [`Pooled`] guard which returns (and
/// [`reset`](PoolItem::reset)s) the object when dropped, on every exit path
/// including panics. The pool itself is shared behind an [`Arc`] so guards can
/// cross thread boundaries along with their objects.
///
/// Objects are created lazily with [`Default`] while the total is under
/// [`PoolConfig::max_total`]; past that bound, [`acquire()`](Self::acquire)
/// fails rather than blocking.
#[derive(Debug)]
pub struct Pool<T> {
    state: Mutex<PoolState<T>>,
    config: PoolConfig,
}

#[derive(Debug)]
struct PoolState<T> {
    idle: Vec<T>,
    /// Number of objects currently borrowed.
    borrowed: usize,
}

impl<T: PoolItem> Pool<T> {
    /// Constructs an empty pool with the given sizing policy.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                borrowed: 0,
            }),
            config,
        }
    }

    /// Borrows an object, reusing an idle one if available.
    ///
    /// Fails with [`PoolError::Exhausted`] if [`PoolConfig::max_total`]
    /// objects are already borrowed; that indicates a resource-management bug
    /// in the caller (too many borrows in flight), not a transient condition,
    /// so there is no retry or blocking.
    pub fn acquire(self: &Arc<Self>) -> Result<Pooled<T>, PoolError> {
        let mut state = self.lock();
        let object = match state.idle.pop() {
            Some(object) => object,
            None if state.borrowed < self.config.max_total => T::default(),
            None => {
                return Err(PoolError::Exhausted {
                    max_total: self.config.max_total,
                });
            }
        };
        state.borrowed += 1;
        drop(state);
        Ok(Pooled {
            object: Some(object),
            pool: Arc::clone(self),
        })
    }

    /// The number of idle objects currently retained.
    pub fn idle_count(&self) -> usize {
        self.lock().idle.len()
    }

    /// The number of objects currently borrowed.
    pub fn borrowed_count(&self) -> usize {
        self.lock().borrowed
    }

    fn release(&self, mut object: T) {
        object.reset();
        let mut state = self.lock();
        state.borrowed -= 1;
        if state.idle.len() < self.config.max_idle {
            state.idle.push(object);
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<T>> {
        // The state cannot be left inconsistent by a panic (it is only
        // touched under this lock in short, non-panicking sections), so a
        // poisoned mutex is still usable.
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

/// RAII guard for an object borrowed from a [`Pool`].
///
/// Dereferences to the object; dropping it resets the object and returns it
/// to the pool (or discards it if the pool already holds
/// [`PoolConfig::max_idle`] idle objects).
pub struct Pooled<T: PoolItem> {
    /// Always `Some` until dropped.
    object: Option<T>,
    pool: Arc<Pool<T>>,
}

impl<T: PoolItem> ops::Deref for Pooled<T> {
    type Target = T;
    #[inline]
    fn deref(&self) -> &T {
        match &self.object {
            Some(object) => object,
            None => unreachable!(),
        }
    }
}

impl<T: PoolItem> ops::DerefMut for Pooled<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.object {
            Some(object) => object,
            None => unreachable!(),
        }
    }
}

impl<T: PoolItem> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(object) = self.object.take() {
            self.pool.release(object);
        }
    }
}

impl<T: PoolItem + fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pooled").field(&**self).finish()
    }
}
