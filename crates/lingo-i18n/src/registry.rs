#![forbid(unsafe_code)]

//! The translation registry and its matching algorithm.
//!
//! The registry maps normalized locale codes to [`Translation`] records and
//! pins a single fallback: the first translation ever registered. Lookups
//! walk three tiers, first hit wins:
//!
//! 1. the `language-region` entry (when the tag carries a region),
//! 2. the bare `language` entry,
//! 3. the fallback translation.
//!
//! Together with merge-on-register this lets a regional registration
//! (`en-gb`) carry only the handful of terms that differ from the base
//! `en`, while everything else falls through.
//!
//! # Invariants
//!
//! 1. Registering an existing code merges (new keys win); it never replaces
//!    the whole record.
//! 2. The fallback, once pinned, never changes for the registry's lifetime.
//! 3. `term` never panics: a miss degrades to the raw key (see
//!    [`ResolveError`]).
//!
//! The fallback should be registered under a bare language code. A
//! region-qualified fallback is accepted but only matches at tiers 1 and 3,
//! which is rarely what the embedding application wants.

use crate::error::ResolveError;
use crate::locale::{Direction, LocaleTag};
use crate::translation::{TermArg, TermValue, Translation};
use std::collections::HashMap;

/// Process-lifetime store of translations plus the designated fallback.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, Translation>,
    fallback: Option<String>,
}

impl Registry {
    /// An empty registry with no fallback pinned.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register translations, merging into existing entries by code.
    ///
    /// The first translation of the first call ever made against this
    /// registry becomes the fallback. Returns the number of records
    /// registered (updates and inserts both count).
    pub fn register(&mut self, translations: impl IntoIterator<Item = Translation>) -> usize {
        let mut registered = 0;
        for translation in translations {
            let code = translation.code().to_string();
            if self.fallback.is_none() {
                self.fallback = Some(code.clone());
                tracing::debug!(code = %code, "fallback translation pinned");
            }
            match self.entries.get_mut(&code) {
                Some(existing) => existing.merge(translation),
                None => {
                    self.entries.insert(code, translation);
                }
            }
            registered += 1;
        }
        registered
    }

    /// Resolve a term through all three tiers.
    #[must_use]
    pub fn resolve(&self, tag: &str, key: &str) -> Option<&TermValue> {
        self.resolve_tiers(tag, key, true)
    }

    /// Render the term for the given locale tag.
    ///
    /// A literal is returned as-is; a formatter is invoked with `args`.
    /// When no tier defines the key, warns and returns the key itself so
    /// rendering can proceed with a visibly wrong value instead of failing.
    #[must_use]
    pub fn term(&self, tag: &str, key: &str, args: &[TermArg]) -> String {
        match self.resolve(tag, key) {
            Some(value) => value.render(args),
            None => {
                tracing::warn!(locale = tag, key, "missing term, returning raw key");
                key.to_string()
            }
        }
    }

    /// Strict variant of [`term`](Self::term).
    pub fn try_term(&self, tag: &str, key: &str, args: &[TermArg]) -> Result<String, ResolveError> {
        match self.resolve(tag, key) {
            Some(value) => Ok(value.render(args)),
            None => Err(ResolveError::MissingTerm {
                locale: tag.to_string(),
                key: key.to_string(),
            }),
        }
    }

    /// True when the key resolves at tier 1 or 2; tier 3 (the fallback) is
    /// consulted only when `include_fallback` is set. No side effects.
    #[must_use]
    pub fn exists(&self, tag: &str, key: &str, include_fallback: bool) -> bool {
        self.resolve_tiers(tag, key, include_fallback).is_some()
    }

    /// The registered translation for an exact (normalized) code.
    #[must_use]
    pub fn translation(&self, code: &str) -> Option<&Translation> {
        self.entries.get(&LocaleTag::parse(code).key())
    }

    /// The best-matching translation record for a tag, walking the same
    /// tiers as term resolution but without requiring any particular key.
    #[must_use]
    pub fn match_translation(&self, tag: &str) -> Option<&Translation> {
        let parsed = LocaleTag::parse(tag);
        if parsed.region().is_some()
            && let Some(entry) = self.entries.get(&parsed.key())
        {
            return Some(entry);
        }
        if let Some(entry) = self.entries.get(parsed.language()) {
            return Some(entry);
        }
        self.fallback_entry()
    }

    /// Display name of the best-matching translation.
    #[must_use]
    pub fn display_name(&self, tag: &str) -> Option<String> {
        self.match_translation(tag)
            .and_then(|t| t.name().map(str::to_string))
    }

    /// Text direction of the best-matching translation.
    #[must_use]
    pub fn direction_of(&self, tag: &str) -> Option<Direction> {
        self.match_translation(tag).and_then(Translation::text_direction)
    }

    /// Code of the pinned fallback translation, if any registration
    /// happened yet.
    #[must_use]
    pub fn fallback_code(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    /// Registered locale codes, sorted.
    #[must_use]
    pub fn locales(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.entries.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Number of registered translations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fallback_entry(&self) -> Option<&Translation> {
        self.fallback
            .as_ref()
            .and_then(|code| self.entries.get(code))
    }

    fn resolve_tiers(&self, tag: &str, key: &str, include_fallback: bool) -> Option<&TermValue> {
        let parsed = LocaleTag::parse(tag);

        if parsed.region().is_some()
            && let Some(value) = self.entries.get(&parsed.key()).and_then(|t| t.get(key))
        {
            return Some(value);
        }
        if let Some(value) = self
            .entries
            .get(parsed.language())
            .and_then(|t| t.get(key))
        {
            return Some(value);
        }
        if include_fallback {
            return self.fallback_entry().and_then(|t| t.get(key));
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register([
            Translation::new("en")
                .display_name("English")
                .direction(Direction::Ltr)
                .term("hello", "Hello")
                .term("bye", "Goodbye"),
            Translation::new("es")
                .display_name("Español")
                .term("hello", "Hola"),
        ]);
        registry
    }

    #[test]
    fn first_registration_pins_the_fallback() {
        let registry = base_registry();
        assert_eq!(registry.fallback_code(), Some("en"));
    }

    #[test]
    fn fallback_is_immutable_after_pinning() {
        let mut registry = base_registry();
        registry.register([Translation::new("fr").term("hello", "Bonjour")]);
        assert_eq!(registry.fallback_code(), Some("en"));
    }

    #[test]
    fn tier1_region_entry_wins() {
        let mut registry = base_registry();
        registry.register([Translation::new("en-GB").term("hello", "Hullo")]);
        assert_eq!(registry.term("en-GB", "hello", &[]), "Hullo");
        // Keys the regional entry does not define fall through to tier 2.
        assert_eq!(registry.term("en-GB", "bye", &[]), "Goodbye");
    }

    #[test]
    fn tier2_bare_language_match() {
        let registry = base_registry();
        assert_eq!(registry.term("es-MX", "hello", &[]), "Hola");
    }

    #[test]
    fn tier3_fallback_guarantee() {
        let registry = base_registry();
        assert_eq!(registry.term("de", "hello", &[]), "Hello");
        assert_eq!(registry.term("es", "bye", &[]), "Goodbye");
    }

    #[test]
    fn missing_term_returns_raw_key() {
        let registry = base_registry();
        assert_eq!(registry.term("en", "nonexistent", &[]), "nonexistent");
        assert_eq!(registry.term("xx", "nonexistent", &[]), "nonexistent");
    }

    #[test]
    fn try_term_reports_the_miss() {
        let registry = base_registry();
        let err = registry.try_term("en", "nonexistent", &[]).unwrap_err();
        assert_eq!(err.error_type(), "missing_term");
    }

    #[test]
    fn merge_on_register_augments_entry() {
        let mut registry = Registry::new();
        registry.register([Translation::new("en").term("greet", "Hi")]);
        registry.register([Translation::new("en").term("bye", "Bye")]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.term("en", "greet", &[]), "Hi");
        assert_eq!(registry.term("en", "bye", &[]), "Bye");
    }

    #[test]
    fn merge_overwrites_conflicting_keys() {
        let mut registry = Registry::new();
        registry.register([Translation::new("en").term("greet", "Hi")]);
        registry.register([Translation::new("en").term("greet", "Hello")]);
        assert_eq!(registry.term("en", "greet", &[]), "Hello");
    }

    #[test]
    fn underscore_tag_behaves_like_hyphen_tag() {
        let mut registry = base_registry();
        registry.register([Translation::new("en-US").term("color", "color")]);
        assert_eq!(
            registry.term("en_US", "color", &[]),
            registry.term("en-US", "color", &[])
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut registry = base_registry();
        registry.register([Translation::new("en-GB").term("hello", "Hullo")]);
        assert_eq!(registry.term("EN-gb", "hello", &[]), "Hullo");
    }

    #[test]
    fn exists_respects_the_fallback_switch() {
        let registry = base_registry();
        // "de" has no entry of its own; only the fallback defines "hello".
        assert!(!registry.exists("de", "hello", false));
        assert!(registry.exists("de", "hello", true));
        // Tier 2 hits are visible either way.
        assert!(registry.exists("es-MX", "hello", false));
        assert!(!registry.exists("es", "bye", false));
    }

    #[test]
    fn formatter_terms_receive_args() {
        let mut registry = Registry::new();
        registry.register([Translation::new("en")
            .formatter("num_files", |args| format!("{} files selected", args[0]))]);
        assert_eq!(
            registry.term("en", "num_files", &[3.into()]),
            "3 files selected"
        );
    }

    #[test]
    fn match_translation_walks_tiers() {
        let mut registry = base_registry();
        registry.register([Translation::new("en-GB").display_name("English (UK)")]);
        assert_eq!(registry.display_name("en-GB").as_deref(), Some("English (UK)"));
        assert_eq!(registry.display_name("en-US").as_deref(), Some("English"));
        assert_eq!(registry.display_name("de").as_deref(), Some("English"));
        assert_eq!(registry.direction_of("es-MX"), None);
        assert_eq!(registry.direction_of("en"), Some(Direction::Ltr));
    }

    #[test]
    fn locales_lists_sorted_codes() {
        let registry = base_registry();
        assert_eq!(registry.locales(), vec!["en".to_string(), "es".to_string()]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn empty_registry_resolves_nothing() {
        let registry = Registry::new();
        assert!(registry.resolve("en", "hello").is_none());
        assert_eq!(registry.term("en", "hello", &[]), "hello");
        assert_eq!(registry.fallback_code(), None);
    }
}
