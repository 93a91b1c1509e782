#![forbid(unsafe_code)]

//! The localization context.
//!
//! A [`Localizer`] bundles everything one localization domain needs: the
//! translation [`Registry`], the ambient locale [`Signal`], the attached
//! [`ConsumerSet`], and the [`FormatProvider`]. Contexts are explicitly
//! constructed and passed around; nothing forces a process-wide singleton.
//! Cloning a `Localizer` is cheap and shares the same inner state, so a
//! host can hand clones to widgets, loaders, and test harnesses alike.
//!
//! For embedders that want the classic implicit style there is a
//! thread-local default instance behind [`Localizer::global`] and the
//! module-level free functions ([`register_translation`], [`term`], ...).
//!
//! # Update flow
//!
//! - [`register`](Localizer::register) merges translations and broadcasts
//!   to consumers synchronously, before it returns.
//! - A watched [`RootNode`] pushes attribute changes through its signal;
//!   the context re-derives the ambient state and the ambient signal's
//!   own subscription broadcasts. Under an
//!   [`UpdateBatch`](crate::reactive::UpdateBatch) this coalesces to one
//!   broadcast per tick.
//! - [`force_update`](Localizer::force_update) covers isolation
//!   boundaries no watcher can see across: it re-reads the source and
//!   broadcasts exactly once whether or not anything changed.

use crate::ambient::{AmbientSource, AmbientState, RootNode, system_locale};
use crate::consumers::{Consumer, ConsumerSet};
use crate::format::{
    DateOptions, FormatProvider, NumberOptions, RelativeOptions, TimeUnit, default_provider,
};
use crate::reactive::{Signal, Subscription};
use lingo_i18n::{Direction, LocaleTag, Registry, ResolveError, TermArg, TermValue, Translation};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

struct LocalizerInner {
    registry: RefCell<Registry>,
    ambient: Signal<AmbientState>,
    consumers: ConsumerSet,
    formats: RefCell<Rc<dyn FormatProvider>>,
    source: RefCell<Option<Rc<dyn AmbientSource>>>,
    /// Wiring kept alive for the context's lifetime: the ambient-signal
    /// broadcast hook and, for watched roots, the attribute watcher.
    subscriptions: RefCell<Vec<Subscription>>,
}

/// A localization context: registry, ambient locale state, consumers, and
/// formatting, behind one cheaply clonable handle.
pub struct Localizer {
    inner: Rc<LocalizerInner>,
}

impl Clone for Localizer {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

thread_local! {
    static GLOBAL_CONTEXT: Localizer = Localizer::new();
}

/// Derive the ambient scalars from a source, falling back to the system
/// locale and left-to-right where the source stays silent.
fn ambient_from(source: &dyn AmbientSource) -> AmbientState {
    let locale = source
        .locale()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(system_locale);
    let direction = source.direction().unwrap_or_default();
    AmbientState::new(locale, direction)
}

impl Localizer {
    /// A context with no ambient source: the ambient locale starts at the
    /// system preference, direction left-to-right.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A context reading its ambient state from `source`.
    ///
    /// The source is consulted at construction and on every
    /// [`refresh`](Self::refresh) / [`force_update`](Self::force_update).
    /// Sources that can observe their own changes should call `refresh`
    /// when they do; a [`RootNode`] wired via [`watch_root`](Self::watch_root)
    /// does this automatically.
    #[must_use]
    pub fn with_source(source: Rc<dyn AmbientSource>) -> Self {
        Self::build(Some(source))
    }

    /// A context bound to `root`: the root is the ambient source **and**
    /// its attribute mutations trigger [`refresh`](Self::refresh) without
    /// further wiring.
    #[must_use]
    pub fn watch_root(root: &RootNode) -> Self {
        let localizer = Self::with_source(Rc::new(root.clone()));
        let weak = Rc::downgrade(&localizer.inner);
        let watcher = root.watch(move || {
            if let Some(inner) = weak.upgrade() {
                Self::refresh_inner(&inner);
            }
        });
        localizer.inner.subscriptions.borrow_mut().push(watcher);
        localizer
    }

    /// The thread-local default context.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_CONTEXT.with(Clone::clone)
    }

    fn build(source: Option<Rc<dyn AmbientSource>>) -> Self {
        let initial = match &source {
            Some(src) => ambient_from(src.as_ref()),
            None => AmbientState::system(),
        };
        let localizer = Self {
            inner: Rc::new(LocalizerInner {
                registry: RefCell::new(Registry::default()),
                ambient: Signal::new(initial),
                consumers: ConsumerSet::new(),
                formats: RefCell::new(default_provider()),
                source: RefCell::new(source),
                subscriptions: RefCell::new(Vec::new()),
            }),
        };

        // Ambient changes fan out to consumers. Weak upgrade keeps the
        // subscription from cycling the inner Rc it lives inside.
        let weak: Weak<LocalizerInner> = Rc::downgrade(&localizer.inner);
        let broadcast_hook = localizer.inner.ambient.subscribe(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.consumers.broadcast();
            }
        });
        localizer
            .inner
            .subscriptions
            .borrow_mut()
            .push(broadcast_hook);

        localizer
    }

    // --- registry surface ---

    /// Merge translations into the registry and broadcast to consumers,
    /// synchronously, before returning. Lookups made after this call
    /// observe the merge.
    ///
    /// Returns the number of translations merged or inserted.
    pub fn register<I>(&self, translations: I) -> usize
    where
        I: IntoIterator<Item = Translation>,
    {
        let merged = self.inner.registry.borrow_mut().register(translations);
        if merged > 0 {
            self.inner.consumers.broadcast();
        }
        merged
    }

    /// Resolve and render a term at an explicit locale tag. Missing terms
    /// degrade to the raw key.
    #[must_use]
    pub fn term(&self, locale: &str, key: &str, args: &[TermArg]) -> String {
        self.inner.registry.borrow().term(locale, key, args)
    }

    /// Strict variant of [`term`](Self::term).
    pub fn try_term(
        &self,
        locale: &str,
        key: &str,
        args: &[TermArg],
    ) -> Result<String, ResolveError> {
        self.inner.registry.borrow().try_term(locale, key, args)
    }

    /// Whether `key` resolves at `locale` (fallback tier only when asked).
    #[must_use]
    pub fn exists(&self, locale: &str, key: &str, include_fallback: bool) -> bool {
        self.inner.registry.borrow().exists(locale, key, include_fallback)
    }

    /// The term value `key` resolves to at `locale`, if any.
    #[must_use]
    pub fn resolve(&self, locale: &str, key: &str) -> Option<TermValue> {
        self.inner.registry.borrow().resolve(locale, key).cloned()
    }

    /// Read-only access to the registry for anything the passthroughs do
    /// not cover (locale listing, display names, fallback code).
    pub fn with_registry<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        f(&self.inner.registry.borrow())
    }

    // --- ambient surface ---

    /// Snapshot of the ambient locale and direction.
    #[must_use]
    pub fn ambient_state(&self) -> AmbientState {
        self.inner.ambient.get()
    }

    /// The ambient locale tag, lowercased.
    #[must_use]
    pub fn ambient_locale(&self) -> String {
        self.inner.ambient.with(|s| s.locale().to_string())
    }

    /// The ambient text direction.
    #[must_use]
    pub fn ambient_direction(&self) -> Direction {
        self.inner.ambient.with(AmbientState::direction)
    }

    /// Ambient-state version: one increment per observed change. Useful
    /// for hosts that diff instead of subscribing.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.ambient.version()
    }

    /// Re-read the ambient source (or the system default when there is
    /// none). Returns whether the ambient state changed; a change has
    /// already broadcast to consumers by the time this returns.
    pub fn refresh(&self) -> bool {
        Self::refresh_inner(&self.inner)
    }

    fn refresh_inner(inner: &Rc<LocalizerInner>) -> bool {
        let source = inner.source.borrow().clone();
        let next = match source {
            Some(src) => ambient_from(src.as_ref()),
            None => AmbientState::system(),
        };
        let previous = inner.ambient.get();
        if previous == next {
            return false;
        }
        tracing::debug!(old = %previous, new = %next, "ambient locale refreshed");
        inner.ambient.set(next);
        true
    }

    /// Manual update entry point for isolation boundaries no watcher can
    /// see across: re-reads the source, then guarantees exactly one
    /// broadcast whether or not anything changed.
    pub fn force_update(&self) {
        if !self.refresh() {
            self.inner.consumers.broadcast();
        }
    }

    // --- consumer surface ---

    /// Attach a consumer to update broadcasts. Idempotent per `Rc`.
    pub fn attach(&self, consumer: &Rc<dyn Consumer>) {
        self.inner.consumers.attach(consumer);
    }

    /// Detach a consumer. Idempotent; unknown consumers are ignored.
    pub fn detach(&self, consumer: &Rc<dyn Consumer>) {
        self.inner.consumers.detach(consumer);
    }

    /// Live consumers currently attached.
    #[must_use]
    pub fn consumer_count(&self) -> usize {
        self.inner.consumers.len()
    }

    // --- formatting surface ---

    /// Replace the formatting provider.
    pub fn set_formats(&self, provider: Rc<dyn FormatProvider>) {
        *self.inner.formats.borrow_mut() = provider;
    }

    /// The current formatting provider.
    #[must_use]
    pub fn formats(&self) -> Rc<dyn FormatProvider> {
        self.inner.formats.borrow().clone()
    }

    /// Format a timestamp at an explicit locale tag. Failures degrade to
    /// an empty string.
    #[must_use]
    pub fn date(
        &self,
        locale: &str,
        value: &chrono::DateTime<chrono::Local>,
        options: &DateOptions,
    ) -> String {
        let tag = LocaleTag::parse(locale);
        match self.formats().date(&tag, value, options) {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::warn!(
                    locale = %tag,
                    error = %err,
                    error_type = err.error_type(),
                    "date formatting degraded"
                );
                String::new()
            }
        }
    }

    /// Format a number at an explicit locale tag. Failures (including
    /// non-finite input) degrade to an empty string.
    #[must_use]
    pub fn number(&self, locale: &str, value: f64, options: &NumberOptions) -> String {
        let tag = LocaleTag::parse(locale);
        match self.formats().number(&tag, value, options) {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::warn!(
                    locale = %tag,
                    value,
                    error = %err,
                    error_type = err.error_type(),
                    "number formatting degraded"
                );
                String::new()
            }
        }
    }

    /// Format a relative-time phrase at an explicit locale tag. Failures
    /// degrade to an empty string.
    #[must_use]
    pub fn relative_time(
        &self,
        locale: &str,
        value: f64,
        unit: TimeUnit,
        options: &RelativeOptions,
    ) -> String {
        let tag = LocaleTag::parse(locale);
        match self.formats().relative_time(&tag, value, unit, options) {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::warn!(
                    locale = %tag,
                    value,
                    error = %err,
                    error_type = err.error_type(),
                    "relative-time formatting degraded"
                );
                String::new()
            }
        }
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Localizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Localizer")
            .field("ambient", &self.inner.ambient.get())
            .field("locales", &self.inner.registry.borrow().len())
            .field("consumers", &self.inner.consumers.len())
            .field("watched", &self.inner.source.borrow().is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Global-context conveniences
// ---------------------------------------------------------------------------

/// Merge one translation into the thread-local default context.
pub fn register_translation(translation: Translation) -> usize {
    Localizer::global().register([translation])
}

/// Resolve a term against the thread-local default context.
#[must_use]
pub fn term(locale: &str, key: &str, args: &[TermArg]) -> String {
    Localizer::global().term(locale, key, args)
}

/// Term existence against the thread-local default context.
#[must_use]
pub fn exists(locale: &str, key: &str, include_fallback: bool) -> bool {
    Localizer::global().exists(locale, key, include_fallback)
}

/// Date formatting against the thread-local default context.
#[must_use]
pub fn date(
    locale: &str,
    value: &chrono::DateTime<chrono::Local>,
    options: &DateOptions,
) -> String {
    Localizer::global().date(locale, value, options)
}

/// Number formatting against the thread-local default context.
#[must_use]
pub fn number(locale: &str, value: f64, options: &NumberOptions) -> String {
    Localizer::global().number(locale, value, options)
}

/// Relative-time formatting against the thread-local default context.
#[must_use]
pub fn relative_time(
    locale: &str,
    value: f64,
    unit: TimeUnit,
    options: &RelativeOptions,
) -> String {
    Localizer::global().relative_time(locale, value, unit, options)
}

/// Force one broadcast on the thread-local default context.
pub fn force_update() {
    Localizer::global().force_update()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
