#![forbid(unsafe_code)]

//! Translation records and term values.
//!
//! A [`Translation`] is the unit of registration: one locale code plus a map
//! of term keys to values. A value is either a literal string or a formatter
//! closure, tagged, so callers never have to inspect what kind of value a
//! key holds.

use crate::locale::{Direction, LocaleTag};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

// ── Term arguments ──────────────────────────────────────────────────────────

/// An argument passed to a formatter term.
#[derive(Debug, Clone, PartialEq)]
pub enum TermArg {
    /// A text argument.
    Text(String),
    /// An integer argument.
    Int(i64),
    /// A floating-point argument.
    Float(f64),
}

impl fmt::Display for TermArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for TermArg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TermArg {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for TermArg {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for TermArg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for TermArg {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for TermArg {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

// ── Term values ─────────────────────────────────────────────────────────────

/// A formatter term: a closure from arguments to display text.
pub type TermFn = Rc<dyn Fn(&[TermArg]) -> String>;

/// The value stored under one term key.
#[derive(Clone)]
pub enum TermValue {
    /// A fixed string, returned as-is.
    Literal(String),
    /// A closure invoked with the caller's arguments.
    Formatter(TermFn),
}

impl TermValue {
    /// Produce the display string for this value.
    ///
    /// Literals ignore `args`; formatters receive them.
    #[must_use]
    pub fn render(&self, args: &[TermArg]) -> String {
        match self {
            Self::Literal(text) => text.clone(),
            Self::Formatter(f) => f(args),
        }
    }

    /// True when this value is a formatter closure.
    #[must_use]
    pub fn is_formatter(&self) -> bool {
        matches!(self, Self::Formatter(_))
    }
}

impl fmt::Debug for TermValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Formatter(_) => f.write_str("Formatter(..)"),
        }
    }
}

impl From<&str> for TermValue {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for TermValue {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

// ── Translation ─────────────────────────────────────────────────────────────

/// One registrable translation: a locale code, optional display metadata,
/// and the term map.
///
/// The code is normalized on construction (lowercased, `_` rewritten to
/// `-`), so `Translation::new("en_GB")` and `Translation::new("en-GB")`
/// land on the same registry entry.
#[derive(Debug, Clone)]
pub struct Translation {
    code: String,
    display_name: Option<String>,
    direction: Option<Direction>,
    terms: HashMap<String, TermValue>,
}

impl Translation {
    /// Start a translation for the given locale code.
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Self {
        Self {
            code: LocaleTag::parse(code.as_ref()).key(),
            display_name: None,
            direction: None,
            terms: HashMap::new(),
        }
    }

    /// Human-readable language name (e.g. `"English"`, `"Español"`).
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Text direction of this language.
    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Add a literal term.
    #[must_use]
    pub fn term(mut self, key: impl Into<String>, value: impl Into<TermValue>) -> Self {
        self.terms.insert(key.into(), value.into());
        self
    }

    /// Add a formatter term.
    #[must_use]
    pub fn formatter(
        mut self,
        key: impl Into<String>,
        f: impl Fn(&[TermArg]) -> String + 'static,
    ) -> Self {
        self.terms
            .insert(key.into(), TermValue::Formatter(Rc::new(f)));
        self
    }

    /// Normalized locale code this translation registers under.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Display name, if one was provided.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Text direction, if one was provided.
    #[must_use]
    pub fn text_direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Look up a term value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TermValue> {
        self.terms.get(key)
    }

    /// True when the key is defined on this record.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.terms.contains_key(key)
    }

    /// Number of term keys on this record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True when no terms are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Shallow-merge `other` into this record: `other`'s term keys
    /// overwrite or augment, and its metadata wins where present. Fields
    /// `other` leaves unset keep their current values.
    pub fn merge(&mut self, other: Translation) {
        if other.display_name.is_some() {
            self.display_name = other.display_name;
        }
        if other.direction.is_some() {
            self.direction = other.direction;
        }
        self.terms.extend(other.terms);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_terms_and_metadata() {
        let t = Translation::new("en")
            .display_name("English")
            .direction(Direction::Ltr)
            .term("hello", "Hello")
            .formatter("num_files", |args| format!("{} files", args[0]));

        assert_eq!(t.code(), "en");
        assert_eq!(t.name(), Some("English"));
        assert_eq!(t.text_direction(), Some(Direction::Ltr));
        assert_eq!(t.len(), 2);
        assert!(t.contains("hello"));
    }

    #[test]
    fn code_is_normalized_on_construction() {
        assert_eq!(Translation::new("EN_gb").code(), "en-gb");
        assert_eq!(Translation::new("es").code(), "es");
    }

    #[test]
    fn literal_render_ignores_args() {
        let value = TermValue::from("Hello");
        assert_eq!(value.render(&[TermArg::from(42)]), "Hello");
        assert!(!value.is_formatter());
    }

    #[test]
    fn formatter_render_receives_args() {
        let t = Translation::new("en").formatter("greet", |args| format!("Hi, {}!", args[0]));
        let value = t.get("greet").unwrap();
        assert!(value.is_formatter());
        assert_eq!(value.render(&["Ada".into()]), "Hi, Ada!");
    }

    #[test]
    fn merge_overwrites_and_augments() {
        let mut base = Translation::new("en")
            .display_name("English")
            .term("greet", "Hi")
            .term("bye", "Bye");
        let patch = Translation::new("en")
            .term("greet", "Hello")
            .term("thanks", "Thanks");

        base.merge(patch);
        assert_eq!(base.get("greet").unwrap().render(&[]), "Hello");
        assert_eq!(base.get("bye").unwrap().render(&[]), "Bye");
        assert_eq!(base.get("thanks").unwrap().render(&[]), "Thanks");
        // Patch carried no display name, so the original survives.
        assert_eq!(base.name(), Some("English"));
    }

    #[test]
    fn term_arg_display() {
        assert_eq!(TermArg::from("x").to_string(), "x");
        assert_eq!(TermArg::from(7).to_string(), "7");
        assert_eq!(TermArg::from(2.5).to_string(), "2.5");
    }
}
