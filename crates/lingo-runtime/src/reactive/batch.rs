#![forbid(unsafe_code)]

//! Update coalescing for [`Signal`](super::Signal) notifications.
//!
//! Hosts that mutate several locale-bearing attributes in one tick (say,
//! `lang` and `dir` on the root node, or a burst of registrations) would
//! otherwise trigger one re-render request per mutation. Opening an
//! [`UpdateBatch`] defers all signal notifications until the batch exits,
//! then fires each unique observer at most once with the final state.
//!
//! # Usage
//!
//! ```ignore
//! use lingo_runtime::reactive::UpdateBatch;
//!
//! let root = RootNode::new();
//!
//! {
//!     let _batch = UpdateBatch::new();
//!     root.set_locale("ar");      // notification deferred
//!     root.set_direction(Rtl);    // notification deferred
//! }  // observers fire here, once, seeing "ar" + Rtl together
//! ```
//!
//! # Invariants
//!
//! 1. Nested batches are supported; only the outermost scope flushes.
//! 2. Inside a batch, `Signal::get()` already returns the latest value.
//!    Only notifications are deferred, never the writes.
//! 3. After the batch exits, observers see the final state and none of the
//!    intermediate ones.
//! 4. Flush fires deferred callbacks in first-enqueue order, even when a
//!    keyed entry was replaced by a later mutation.
//!
//! # Failure Modes
//!
//! - **Callback panics during flush**: the remaining callbacks still run,
//!   the batch context is torn down, and the first panic resumes
//!   afterwards.
//! - **Mutation from inside a flush callback**: the context is already
//!   gone at that point, so the nested notification fires immediately
//!   rather than queueing into a dead batch.

use std::cell::RefCell;
use tracing::{info, info_span};
use web_time::Instant;

/// A deferred notification: a closure that fires one observer callback
/// with the latest value of its signal.
type DeferredNotify = Box<dyn FnOnce()>;

/// Queue entry, optionally keyed for in-batch coalescing.
struct Deferred {
    key: Option<usize>,
    notify: DeferredNotify,
}

impl Deferred {
    fn unkeyed(notify: DeferredNotify) -> Self {
        Self { key: None, notify }
    }

    fn keyed(key: usize, notify: DeferredNotify) -> Self {
        Self {
            key: Some(key),
            notify,
        }
    }
}

/// Thread-local batch context.
struct BatchContext {
    /// Nesting depth. The context is torn down when this reaches 0.
    depth: u32,
    /// Queued notifications to fire on flush.
    deferred: Vec<Deferred>,
    /// Signal mutations coalesced into this batch.
    updates: u64,
}

thread_local! {
    static BATCH_CTX: RefCell<Option<BatchContext>> = const { RefCell::new(None) };
}

/// Returns true if a batch is currently active on this thread.
pub fn is_batching() -> bool {
    BATCH_CTX.with(|ctx| ctx.borrow().is_some())
}

/// Enqueue a notification to fire when the current batch exits.
///
/// If no batch is active, the notification fires immediately.
///
/// Returns `true` if the notification was deferred, `false` if it fired
/// immediately.
pub fn enqueue_or_run(f: impl FnOnce() + 'static) -> bool {
    BATCH_CTX.with(|ctx| {
        let mut guard = ctx.borrow_mut();
        if let Some(ref mut batch) = *guard {
            batch.deferred.push(Deferred::unkeyed(Box::new(f)));
            true
        } else {
            drop(guard); // Release borrow before calling f.
            f();
            false
        }
    })
}

/// Enqueue a notification keyed by `key`.
///
/// If the key already exists in the current batch, the queued callback is
/// replaced so the latest one wins while keeping the original enqueue
/// order.
pub fn enqueue_or_run_keyed(key: usize, f: impl FnOnce() + 'static) -> bool {
    BATCH_CTX.with(|ctx| {
        let mut guard = ctx.borrow_mut();
        if let Some(ref mut batch) = *guard {
            if let Some(entry) = batch
                .deferred
                .iter_mut()
                .find(|entry| entry.key == Some(key))
            {
                entry.notify = Box::new(f);
            } else {
                batch.deferred.push(Deferred::keyed(key, Box::new(f)));
            }
            true
        } else {
            drop(guard); // Release borrow before calling f.
            f();
            false
        }
    })
}

/// Record signal mutations while a batch is active. No-op otherwise.
pub fn record_update(count: u64) {
    if count == 0 {
        return;
    }
    BATCH_CTX.with(|ctx| {
        if let Some(ref mut batch) = *ctx.borrow_mut() {
            batch.updates = batch.updates.saturating_add(count);
        }
    });
}

/// Number of deferred notifications queued in the current batch.
#[must_use]
pub fn pending_count() -> usize {
    BATCH_CTX.with(|ctx| ctx.borrow().as_ref().map_or(0, |b| b.deferred.len()))
}

/// Fire the notifications of a finished batch. Called by `UpdateBatch::drop`
/// after the context has been taken out of the thread-local slot.
fn flush(batch: BatchContext) {
    if batch.deferred.is_empty() {
        return;
    }

    let updates = batch.updates;
    let observers = batch.deferred.len() as u64;
    let propagation_start = Instant::now();
    let _span = info_span!(
        "locale.signal",
        updates,
        observers,
        duration_us = tracing::field::Empty
    )
    .entered();

    // Run every callback even if one panics; the first panic resumes after
    // the rest have been attempted.
    let mut first_panic: Option<Box<dyn std::any::Any + Send>> = None;
    for entry in batch.deferred {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(entry.notify));
        if let Err(payload) = result
            && first_panic.is_none()
        {
            first_panic = Some(payload);
        }
    }

    let duration_us = propagation_start.elapsed().as_micros() as u64;
    tracing::Span::current().record("duration_us", duration_us);
    info!(
        locale_propagation_duration_us = duration_us,
        updates, observers, "locale propagation duration histogram"
    );

    if let Some(payload) = first_panic {
        std::panic::resume_unwind(payload);
    }
}

/// RAII guard that begins a batch scope.
///
/// While an `UpdateBatch` is alive, all [`Signal`](super::Signal)
/// notifications on this thread are deferred. When the outermost
/// `UpdateBatch` drops, the queued notifications fire.
///
/// Nested `UpdateBatch`es are supported; only the outermost one flushes.
pub struct UpdateBatch {
    /// Whether this scope is the outermost (responsible for flush).
    is_root: bool,
}

impl UpdateBatch {
    /// Begin a new batch scope.
    ///
    /// If already inside a batch, this increments the nesting depth.
    #[must_use]
    pub fn new() -> Self {
        let is_root = BATCH_CTX.with(|ctx| {
            let mut guard = ctx.borrow_mut();
            match *guard {
                Some(ref mut batch) => {
                    batch.depth += 1;
                    false
                }
                None => {
                    *guard = Some(BatchContext {
                        depth: 1,
                        deferred: Vec::new(),
                        updates: 0,
                    });
                    true
                }
            }
        });
        Self { is_root }
    }

    /// Number of deferred notifications queued in the current batch.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        pending_count()
    }
}

impl Default for UpdateBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for UpdateBatch {
    fn drop(&mut self) {
        let finished = BATCH_CTX.with(|ctx| {
            let mut guard = ctx.borrow_mut();
            match *guard {
                Some(ref mut batch) if batch.depth > 1 => {
                    batch.depth -= 1;
                    None
                }
                // Take the context out before flushing so callbacks that
                // mutate signals run against a clean slate.
                Some(_) => guard.take(),
                None => None,
            }
        });

        if let Some(batch) = finished {
            flush(batch);
        }
    }
}

impl std::fmt::Debug for UpdateBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateBatch")
            .field("is_root", &self.is_root)
            .field("pending", &self.pending_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
