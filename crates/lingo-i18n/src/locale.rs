#![forbid(unsafe_code)]

//! Locale tags and text direction.
//!
//! A [`LocaleTag`] is the language/region pair every lookup is scoped to.
//! Parsing is deliberately forgiving: both `-` and `_` separators are
//! accepted (underscores are rewritten before parsing because the underlying
//! parser rejects them), casing is normalized, and a tag that does not parse
//! at all degrades to "the whole tag is the language" rather than failing
//! the lookup that carried it.
//!
//! # Invariants
//!
//! 1. `language` and `region` are always lowercase.
//! 2. `parse("en_US")`, `parse("EN-us")` and `parse("en-US")` are equal.
//! 3. `parse` is total; `try_parse` is the strict variant.
//!
//! Script and variant subtags are accepted on input but not retained: the
//! resolution model matches on language and region only.

use crate::error::ResolveError;
use std::fmt;
use unic_langid::LanguageIdentifier;

/// Languages written right-to-left, by primary language subtag.
const RTL_LANGUAGES: &[&str] = &[
    "ar", "he", "fa", "ur", "yi", "ps", "sd", "ug", "ku", "ckb", "dv", "arc", "syr",
];

// ── Direction ───────────────────────────────────────────────────────────────

/// Text direction of a locale or document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Left-to-right.
    #[default]
    Ltr,
    /// Right-to-left.
    Rtl,
}

impl Direction {
    /// Lowercase attribute form (`"ltr"` / `"rtl"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }

    /// Parse an attribute value, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ltr" => Some(Self::Ltr),
            "rtl" => Some(Self::Rtl),
            _ => None,
        }
    }

    /// Classify a locale tag by its primary language subtag.
    ///
    /// Covers the common right-to-left languages; everything unknown is
    /// left-to-right. A helper for building [`Translation`] records, not a
    /// substitute for an explicit direction attribute.
    ///
    /// [`Translation`]: crate::translation::Translation
    #[must_use]
    pub fn for_locale(tag: &str) -> Self {
        let parsed = LocaleTag::parse(tag);
        if RTL_LANGUAGES.contains(&parsed.language()) {
            Self::Rtl
        } else {
            Self::Ltr
        }
    }

    /// True for left-to-right.
    #[must_use]
    pub fn is_ltr(&self) -> bool {
        matches!(self, Self::Ltr)
    }

    /// True for right-to-left.
    #[must_use]
    pub fn is_rtl(&self) -> bool {
        matches!(self, Self::Rtl)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── LocaleTag ───────────────────────────────────────────────────────────────

/// A normalized language/region pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleTag {
    language: String,
    region: Option<String>,
}

impl LocaleTag {
    /// Strict parse. Fails on tags the BCP 47 grammar rejects.
    ///
    /// Underscore separators are rewritten to `-` first; the parser itself
    /// only accepts hyphens.
    pub fn try_parse(raw: &str) -> Result<Self, ResolveError> {
        let normalized = raw.trim().replace('_', "-");
        match normalized.parse::<LanguageIdentifier>() {
            Ok(id) => Ok(Self {
                language: id.language.as_str().to_ascii_lowercase(),
                region: id.region.map(|r| r.as_str().to_ascii_lowercase()),
            }),
            Err(_) => Err(ResolveError::MalformedTag {
                raw: raw.to_string(),
            }),
        }
    }

    /// Lenient parse. Never fails: a malformed tag degrades to the whole
    /// trimmed tag (lowercased) as the language, with no region.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::try_parse(raw).unwrap_or_else(|_| {
            tracing::debug!(raw, "malformed locale tag, treating whole tag as language");
            Self {
                language: raw.trim().replace('_', "-").to_ascii_lowercase(),
                region: None,
            }
        })
    }

    /// Primary language subtag, lowercase.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Region subtag, lowercase, if the tag carried one.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Registry key form: `"language-region"` or bare `"language"`.
    #[must_use]
    pub fn key(&self) -> String {
        match &self.region {
            Some(region) => format!("{}-{}", self.language, region),
            None => self.language.clone(),
        }
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}-{}", self.language, region),
            None => f.write_str(&self.language),
        }
    }
}

// ── System locale strings ───────────────────────────────────────────────────

/// Sanitize a raw platform locale string (`en_US.UTF-8@latin`, `C`, ...)
/// into a plain tag usable for lookups.
///
/// Strips the codeset and modifier suffixes, rewrites `_` to `-`, and maps
/// the `C`/`POSIX` pseudo-locales to `en`. Returns `None` when nothing
/// usable remains.
#[must_use]
pub fn sanitize_system_locale(raw: &str) -> Option<String> {
    let base = raw.split(['@', '.']).next().unwrap_or(raw).trim();
    if base.is_empty() {
        return None;
    }
    if base.eq_ignore_ascii_case("c") || base.eq_ignore_ascii_case("posix") {
        return Some("en".to_string());
    }
    Some(base.replace('_', "-"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
