#![forbid(unsafe_code)]

//! Lingo public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports common types from the internal crates and offers a lightweight
//! prelude for day-to-day usage.

use std::fmt;

// --- Translation re-exports -------------------------------------------------

pub use lingo_i18n::{
    Degradation, Direction, LocaleTag, Registry, ResolveError, TermArg, TermFn, TermValue,
    Translation, sanitize_system_locale,
};

// --- Runtime re-exports -----------------------------------------------------

pub use lingo_runtime::{
    AmbientSource, AmbientState, BasicFormats, Consumer, ConsumerSet, DEFAULT_LOCALE, DateLength,
    DateOptions, DetachedRoot, ExistsOptions, FormatError, FormatProvider, Localizer,
    NumberOptions, RelativeOptions, RootNode, Signal, Subscription, TimeLength, TimeUnit,
    Translator, UpdateBatch, default_provider, system_locale,
};

#[cfg(feature = "icu")]
pub use lingo_runtime::IcuFormats;

// --- Global-context convenience ---------------------------------------------

pub use lingo_runtime::{
    date, exists, force_update, number, register_translation, relative_time, term,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for lingo apps.
#[derive(Debug)]
pub enum Error {
    /// Term resolution failure.
    Resolve(ResolveError),
    /// Formatting backend failure.
    Format(FormatError),
}

impl Error {
    /// The degraded behavior the lenient surface applies for this error.
    #[must_use]
    pub fn degradation(&self) -> Degradation {
        match self {
            Self::Resolve(err) => err.degradation(),
            Self::Format(err) => err.degradation(),
        }
    }

    /// Stable label for diagnostics and log filtering.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Resolve(err) => err.error_type(),
            Self::Format(err) => err.error_type(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve(err) => write!(f, "{err}"),
            Self::Format(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resolve(err) => Some(err),
            Self::Format(err) => Some(err),
        }
    }
}

impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        Self::Resolve(err)
    }
}

impl From<FormatError> for Error {
    fn from(err: FormatError) -> Self {
        Self::Format(err)
    }
}

/// Standard result type for lingo APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Consumer, DateOptions, Direction, Error, Localizer, NumberOptions, RelativeOptions,
        Result, RootNode, TermArg, TimeUnit, Translation, Translator, UpdateBatch,
    };

    pub use crate::{i18n, runtime};
}

pub use lingo_i18n as i18n;
pub use lingo_runtime as runtime;
