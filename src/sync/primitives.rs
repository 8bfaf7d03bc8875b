//! Interrupt-safe cell shared by the sampling and dispatch contexts.
//!
//! [`SharedPool`](super::SharedPool) and the queue wrappers keep their state
//! in a [`CriticalSectionCell`] so either context may reach it through a
//! `static`.

use core::cell::RefCell;
use critical_section::Mutex;

/// State reachable from thread and interrupt context.
///
/// Every access runs inside `critical_section::with`, so a closure passed to
/// [`with`](Self::with) must not wait on the other context.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Wrap `value`; usable in `static` initializers
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` on the contents with interrupts masked.
    ///
    /// # Panics
    ///
    /// If called again from inside `f` on the same cell.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Read-only variant of [`with`](Self::with)
    #[inline]
    pub fn with_ref<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        critical_section::with(|cs| f(&self.inner.borrow_ref(cs)))
    }
}

// SAFETY: the RefCell is only borrowed inside a critical section, which
// excludes every other context for the duration of the borrow.
unsafe impl<T: Send> Sync for CriticalSectionCell<T> {}

// =============================================================================
// Tests
// =============================================================================
