#![forbid(unsafe_code)]

//! Translation storage and resolution for lingo.
//!
//! Provides the translation registry with merge-on-register semantics,
//! the language/region locale matcher with three-tier fallback, and the
//! term-value model (literals and formatter closures).
//!
//! # Role in lingo
//! `lingo-i18n` is the pure resolution layer: given a locale tag and a term
//! key, produce the best display string the registered translations allow.
//! It holds no reactive state and knows nothing about consumers.
//!
//! # How it fits in the system
//! `lingo-runtime` wraps a [`Registry`] in its context object and drives
//! re-renders when registrations happen; this crate stays synchronous and
//! side-effect free (apart from diagnostics), keeping resolution reusable
//! and testable on its own.

pub mod error;
pub mod locale;
pub mod registry;
pub mod translation;

pub use error::{Degradation, ResolveError};
pub use locale::{Direction, LocaleTag, sanitize_system_locale};
pub use registry::Registry;
pub use translation::{TermArg, TermFn, TermValue, Translation};
