#![forbid(unsafe_code)]

//! Per-consumer accessor.
//!
//! A [`Translator`] is what a rendering consumer actually holds: it knows
//! its [`Localizer`] and its own [`Consumer`] handle, resolves every call
//! at the consumer's effective locale, and manages consumer-set
//! membership (attach on construction, detach on drop).
//!
//! The effective locale is recomputed on every call, never cached: the
//! consumer's own override wins when present and non-empty, otherwise the
//! ambient locale applies. A consumer that clears its override between
//! two calls sees the ambient locale on the second call with no extra
//! wiring.

use crate::consumers::Consumer;
use crate::context::Localizer;
use crate::format::{DateOptions, NumberOptions, RelativeOptions, TimeUnit};
use lingo_i18n::{Direction, ResolveError, TermArg};
use std::rc::Rc;

/// Options for [`Translator::exists_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistsOptions {
    /// Check under this tag instead of the effective locale.
    pub locale: Option<String>,
    /// Count the fallback translation as a hit. Off by default.
    pub include_fallback: bool,
}

/// Locale-aware accessor bound to one consumer.
///
/// Construction attaches the consumer to the context's consumer set;
/// dropping the translator detaches it. Both are idempotent, so explicit
/// [`attach`](Self::attach)/[`detach`](Self::detach) calls around
/// connect/disconnect lifecycles are safe to repeat.
pub struct Translator {
    context: Localizer,
    consumer: Rc<dyn Consumer>,
}

impl Translator {
    /// Bind `consumer` to `context` and attach it to update broadcasts.
    #[must_use]
    pub fn new(context: &Localizer, consumer: Rc<dyn Consumer>) -> Self {
        context.attach(&consumer);
        Self {
            context: context.clone(),
            consumer,
        }
    }

    /// Re-attach the consumer after an explicit [`detach`](Self::detach).
    pub fn attach(&self) {
        self.context.attach(&self.consumer);
    }

    /// Stop receiving update broadcasts. Mandatory when the consumer
    /// leaves the render tree earlier than the translator is dropped.
    pub fn detach(&self) {
        self.context.detach(&self.consumer);
    }

    /// The context this translator resolves against.
    #[must_use]
    pub fn context(&self) -> &Localizer {
        &self.context
    }

    /// The effective locale: the consumer's override when present and
    /// non-empty, the ambient locale otherwise. Lowercased, recomputed on
    /// every call.
    #[must_use]
    pub fn lang(&self) -> String {
        self.consumer
            .locale_override()
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.context.ambient_locale())
    }

    /// The effective direction: the consumer's override when present, the
    /// ambient direction otherwise.
    #[must_use]
    pub fn dir(&self) -> Direction {
        self.consumer
            .direction_override()
            .unwrap_or_else(|| self.context.ambient_direction())
    }

    /// Resolve and render `key` at the effective locale. Missing terms
    /// degrade to the raw key.
    #[must_use]
    pub fn term(&self, key: &str, args: &[TermArg]) -> String {
        self.context.term(&self.lang(), key, args)
    }

    /// Strict variant of [`term`](Self::term).
    pub fn try_term(&self, key: &str, args: &[TermArg]) -> Result<String, ResolveError> {
        self.context.try_term(&self.lang(), key, args)
    }

    /// Whether `key` resolves at the effective locale, fallback excluded.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.context.exists(&self.lang(), key, false)
    }

    /// [`exists`](Self::exists) with an explicit locale and fallback
    /// switch.
    #[must_use]
    pub fn exists_with(&self, key: &str, options: &ExistsOptions) -> bool {
        let locale = options
            .locale
            .clone()
            .unwrap_or_else(|| self.lang());
        self.context.exists(&locale, key, options.include_fallback)
    }

    /// Format a timestamp at the effective locale.
    #[must_use]
    pub fn date(
        &self,
        value: &chrono::DateTime<chrono::Local>,
        options: &DateOptions,
    ) -> String {
        self.context.date(&self.lang(), value, options)
    }

    /// Format a number at the effective locale.
    #[must_use]
    pub fn number(&self, value: f64, options: &NumberOptions) -> String {
        self.context.number(&self.lang(), value, options)
    }

    /// Format a relative-time phrase at the effective locale.
    #[must_use]
    pub fn relative_time(&self, value: f64, unit: TimeUnit, options: &RelativeOptions) -> String {
        self.context.relative_time(&self.lang(), value, unit, options)
    }
}

impl Drop for Translator {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("lang", &self.lang())
            .field("dir", &self.dir())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
