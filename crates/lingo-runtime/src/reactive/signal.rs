#![forbid(unsafe_code)]

//! Observed value cell with change notification and version tracking.
//!
//! # Design
//!
//! [`Signal<T>`] holds a value in shared, reference-counted storage
//! (`Rc<RefCell<..>>`). Mutations that actually change the value (by
//! `PartialEq`) bump a version counter and notify every live observer in
//! registration order. Observers are held weakly; a dropped
//! [`Subscription`] guard is all it takes to unsubscribe.
//!
//! The ambient locale state is one `Signal`; a watched root node is
//! another. Both get coalescing for free: while an
//! [`UpdateBatch`](super::batch::UpdateBatch) is open, notifications are
//! deferred and de-duplicated per observer, so a burst of mutations is
//! observed once, with only the final state visible.
//!
//! # Failure Modes
//!
//! - **Observer leak**: `Subscription` guards stored forever keep their
//!   callbacks alive. Dead weak entries are pruned lazily during
//!   notification.
//! - **Equal-value set**: a no-op; the version does not move and nobody is
//!   notified.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::info_span;
use web_time::Instant;

/// Observer callbacks live as strong `Rc`s inside [`Subscription`] guards;
/// the signal itself keeps only weak handles.
type ObserverRc<T> = Rc<dyn Fn(&T)>;
type ObserverWeak<T> = Weak<dyn Fn(&T)>;

struct SignalInner<T> {
    value: T,
    version: u64,
    /// Weak observer handles; dead entries are pruned on notify.
    observers: Vec<ObserverWeak<T>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning a `Signal` produces another handle to the **same** cell: both
/// see the same value, version, and observer list.
///
/// # Invariants
///
/// 1. The version increments by exactly 1 per value-changing mutation.
/// 2. `set(v)` where `v == current` does nothing.
/// 3. Observers run in registration order.
/// 4. Dropped observers are pruned lazily on the next notification.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("observer_count", &inner.observers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// A new signal at version 0 with no observers.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                value,
                version: 0,
                observers: Vec::new(),
            })),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Read the current value by reference, without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value. Notifies observers only when the new value
    /// differs from the current one.
    ///
    /// Safe to call from inside an observer callback: the interior borrow
    /// is released before callbacks run.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Mutate the value in place. Observers are notified only when the
    /// closure actually changed it (compared against a snapshot).
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.value.clone();
            f(&mut inner.value);
            if inner.value == before {
                false
            } else {
                inner.version += 1;
                true
            }
        };
        if changed {
            self.notify();
        }
    }

    /// Observe value changes. The callback receives the new value after
    /// each change.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes; the dead entry
    /// lingers in the observer list until the next notification prunes it.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: ObserverRc<T> = Rc::new(callback);
        let weak = Rc::downgrade(&strong);
        self.inner.borrow_mut().observers.push(weak);
        // Type-erase the strong Rc: `Rc<dyn Fn(&T)>` cannot coerce to
        // `Rc<dyn Any>`, but a box around it holds it alive just the same.
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Version counter: one increment per value-changing mutation. Handy
    /// for dirty checks without subscribing.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Observers currently registered, dead entries included until the
    /// next prune.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Notify live observers, pruning dead ones.
    ///
    /// While an [`UpdateBatch`](super::batch::UpdateBatch) is open the
    /// callbacks are deferred, keyed per observer so repeated mutations
    /// coalesce; each observer then sees only the latest value at flush.
    fn notify(&self) {
        // Collect live callbacks first so none runs under the borrow.
        let callbacks: Vec<ObserverRc<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.observers.retain(|w| w.strong_count() > 0);
            inner.observers.iter().filter_map(Weak::upgrade).collect()
        };

        if callbacks.is_empty() {
            return;
        }

        if super::batch::is_batching() {
            super::batch::record_update(1);
            for cb in callbacks {
                let key = Rc::as_ptr(&cb) as *const () as usize;
                let source = self.clone();
                super::batch::enqueue_or_run_keyed(key, move || {
                    let latest = source.get();
                    cb(&latest);
                });
            }
            return;
        }

        let observers = callbacks.len() as u64;
        let value = self.inner.borrow().value.clone();
        let started = Instant::now();
        let span = info_span!(
            "locale.signal",
            updates = 1_u64,
            observers,
            duration_us = tracing::field::Empty
        );
        let _entered = span.enter();

        for cb in &callbacks {
            cb(&value);
        }

        span.record("duration_us", started.elapsed().as_micros() as u64);
    }
}

/// RAII guard for one observer callback.
///
/// Holds the only strong reference to the callback; dropping the guard
/// makes the signal's weak handle dangle, so the observer is skipped and
/// pruned on the next notification.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
