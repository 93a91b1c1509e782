#![forbid(unsafe_code)]

//! Ambient locale state and where it comes from.
//!
//! The runtime keeps two scalars per context, bundled as [`AmbientState`]:
//! the ambient locale tag and the ambient text direction. Their values
//! come from an [`AmbientSource`], the host's document root or whatever
//! stands in for it. Hosts with a real mutable root use [`RootNode`],
//! which is signal-backed so attribute writes propagate on their own;
//! anything else implements [`AmbientSource`] and calls
//! [`Localizer::refresh`](crate::context::Localizer::refresh) when its
//! attributes change.
//!
//! When the source advertises nothing, the locale falls back to the
//! operating system's preference (sanitized, default `"en"`) and the
//! direction to left-to-right.

use crate::reactive::{Signal, Subscription};
use lingo_i18n::{Direction, sanitize_system_locale};

/// Locale used when neither the source nor the operating system
/// advertises one.
pub const DEFAULT_LOCALE: &str = "en";

/// The two ambient scalars every accessor reads: which locale applies and
/// which way text runs.
///
/// Equality is what gates change notification, so two states with the
/// same locale and direction are interchangeable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmbientState {
    locale: String,
    direction: Direction,
}

impl AmbientState {
    /// Bundle a locale tag and direction, trimming and lowercasing the
    /// tag. An empty tag falls back to [`DEFAULT_LOCALE`].
    #[must_use]
    pub fn new(locale: impl Into<String>, direction: Direction) -> Self {
        let locale = locale.into().trim().to_ascii_lowercase();
        let locale = if locale.is_empty() {
            DEFAULT_LOCALE.to_string()
        } else {
            locale
        };
        Self { locale, direction }
    }

    /// State reflecting the operating system's locale preference, with
    /// left-to-right direction.
    #[must_use]
    pub fn system() -> Self {
        Self::new(system_locale(), Direction::Ltr)
    }

    /// The ambient locale tag, lowercased.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// The ambient text direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl Default for AmbientState {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            direction: Direction::Ltr,
        }
    }
}

impl std::fmt::Display for AmbientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.locale, self.direction)
    }
}

/// The operating system's locale preference, sanitized to a plain
/// hyphenated tag. Falls back to [`DEFAULT_LOCALE`] when detection fails
/// or yields something unusable (`"C"`, `"POSIX"`, empty).
#[must_use]
pub fn system_locale() -> String {
    sys_locale::get_locale()
        .as_deref()
        .and_then(sanitize_system_locale)
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

/// Where ambient locale and direction come from.
///
/// Implementations wrap whatever the host treats as its document root.
/// Returning `None` from either method means "not advertised"; the
/// runtime then falls back to the system locale and left-to-right.
///
/// Sources that can observe their own mutations should arrange for
/// [`Localizer::refresh`](crate::context::Localizer::refresh) to run when
/// attributes change, or hand the runtime a [`RootNode`] which does this
/// automatically.
pub trait AmbientSource {
    /// Locale tag advertised by the host, if any.
    fn locale(&self) -> Option<String>;

    /// Text direction advertised by the host, if any.
    fn direction(&self) -> Option<Direction>;
}

/// A source that advertises nothing, leaving both scalars to their
/// fallbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedRoot;

impl AmbientSource for DetachedRoot {
    fn locale(&self) -> Option<String> {
        None
    }

    fn direction(&self) -> Option<Direction> {
        None
    }
}

/// Root attributes as most recently written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct RootAttrs {
    lang: Option<String>,
    dir: Option<Direction>,
}

/// An in-process stand-in for a document root carrying `lang` and `dir`
/// attributes.
///
/// Attribute writes go through a [`Signal`], so anyone holding a clone
/// observes them; the [`Localizer`](crate::context::Localizer) watches a
/// `RootNode` it is built with and re-derives the ambient state on every
/// attribute change. Writes of the current value are no-ops and notify
/// nobody.
#[derive(Clone, Debug)]
pub struct RootNode {
    attrs: Signal<RootAttrs>,
}

impl RootNode {
    /// A root with neither attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attrs: Signal::new(RootAttrs::default()),
        }
    }

    /// Write the `lang` attribute.
    pub fn set_locale(&self, tag: impl Into<String>) {
        let tag = tag.into();
        self.attrs.update(|a| a.lang = Some(tag));
    }

    /// Remove the `lang` attribute.
    pub fn clear_locale(&self) {
        self.attrs.update(|a| a.lang = None);
    }

    /// Write the `dir` attribute.
    pub fn set_direction(&self, direction: Direction) {
        self.attrs.update(|a| a.dir = Some(direction));
    }

    /// Remove the `dir` attribute.
    pub fn clear_direction(&self) {
        self.attrs.update(|a| a.dir = None);
    }

    /// Observe attribute changes. The callback runs after every mutation
    /// that changed something, or once per batch when coalesced.
    pub fn watch(&self, f: impl Fn() + 'static) -> Subscription {
        self.attrs.subscribe(move |_| f())
    }
}

impl Default for RootNode {
    fn default() -> Self {
        Self::new()
    }
}

impl AmbientSource for RootNode {
    /// A present-but-blank `lang` attribute counts as absent.
    fn locale(&self) -> Option<String> {
        self.attrs.with(|a| {
            a.lang
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
    }

    fn direction(&self) -> Option<Direction> {
        self.attrs.with(|a| a.dir)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
