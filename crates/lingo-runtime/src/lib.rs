#![forbid(unsafe_code)]

//! Lingo Runtime
//!
//! This crate provides the reactive half of lingo: it ties the pure
//! resolution layer from `lingo-i18n` to ambient locale state, consumer
//! re-render scheduling, and locale-aware formatting.
//!
//! # Key Components
//!
//! - [`Localizer`] - Localization context: registry + ambient state +
//!   consumers + formatting behind one clonable handle
//! - [`Translator`] - Per-consumer accessor resolving at the effective
//!   locale (override else ambient)
//! - [`Consumer`] - Trait a rendering host implements to receive update
//!   broadcasts
//! - [`RootNode`] - Signal-backed stand-in for a document root carrying
//!   `lang`/`dir` attributes
//! - [`Signal`] / [`UpdateBatch`] - Reactive primitives with per-tick
//!   coalescing
//! - [`FormatProvider`] - Seam for date/number/relative-time rendering
//!
//! # Role in lingo
//! `lingo-runtime` is the orchestrator. It decides *which* locale applies
//! (ambient signal, per-consumer overrides), *when* consumers re-render
//! (registration, root-attribute mutation, forced updates), and hands
//! resolution itself to `lingo-i18n`.
//!
//! # How it fits in the system
//! Embedding hosts construct a [`Localizer`] (or use the thread-local
//! default), wire it to their root node, and hand each rendering unit a
//! [`Translator`]. Everything is single-threaded and cooperative:
//! `Rc`/`RefCell`/`Weak`, no locks.

pub mod ambient;
pub mod consumers;
pub mod context;
pub mod format;
pub mod reactive;
pub mod translator;

pub use ambient::{
    AmbientSource, AmbientState, DEFAULT_LOCALE, DetachedRoot, RootNode, system_locale,
};
pub use consumers::{Consumer, ConsumerSet};
pub use context::{
    Localizer, date, exists, force_update, number, register_translation, relative_time, term,
};
pub use format::{
    BasicFormats, DateLength, DateOptions, FormatError, FormatProvider, NumberOptions,
    RelativeOptions, TimeLength, TimeUnit, default_provider,
};
#[cfg(feature = "icu")]
pub use format::IcuFormats;
pub use reactive::{Signal, Subscription, UpdateBatch};
pub use translator::{ExistsOptions, Translator};
