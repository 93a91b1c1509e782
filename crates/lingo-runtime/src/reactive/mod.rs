#![forbid(unsafe_code)]

//! Reactive primitives underneath the locale runtime.
//!
//! [`Signal`] is the version-tracked value cell the ambient locale state
//! lives in; [`UpdateBatch`] coalesces notification bursts so observers
//! see one change per tick instead of one per mutation.

pub mod batch;
pub mod signal;

pub use batch::UpdateBatch;
pub use signal::{Signal, Subscription};
