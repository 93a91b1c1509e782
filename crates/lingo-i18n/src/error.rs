#![forbid(unsafe_code)]

//! Error types for translation resolution.
//!
//! # Design Principles
//!
//! 1. **Result everywhere internally**: strict `try_*` entry points return
//!    typed errors; nothing panics in a lookup path.
//! 2. **Graceful degradation at the surface**: every error names the
//!    degraded value the lenient API substitutes, so a localization failure
//!    shows up as wrong text on screen instead of a crashed render.
//! 3. **Diagnosable**: stable `error_type()` labels for log filtering.

use std::fmt;

/// What the lenient resolution surface does when an error occurs.
///
/// The lenient API (`Registry::term`, `LocaleTag::parse`, the formatting
/// passthroughs) never propagates these errors; it applies the degradation
/// and emits a `tracing` event instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// Return the raw term key as the display value.
    ReturnKey,
    /// Treat the entire tag as the language subtag with no region.
    WholeTagAsLanguage,
    /// Produce an empty string.
    EmptyOutput,
}

/// Errors from locale-tag parsing and term resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No translation defines the key in any resolution tier.
    MissingTerm {
        /// The locale tag the lookup was scoped to.
        locale: String,
        /// The term key that could not be resolved.
        key: String,
    },
    /// The locale tag could not be parsed into language/region subtags.
    MalformedTag {
        /// The offending input.
        raw: String,
    },
}

impl ResolveError {
    /// Stable label for diagnostics and log filtering.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::MissingTerm { .. } => "missing_term",
            Self::MalformedTag { .. } => "malformed_tag",
        }
    }

    /// The degraded behavior the lenient surface applies for this error.
    #[must_use]
    pub fn degradation(&self) -> Degradation {
        match self {
            Self::MissingTerm { .. } => Degradation::ReturnKey,
            Self::MalformedTag { .. } => Degradation::WholeTagAsLanguage,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTerm { locale, key } => {
                write!(f, "no translation for term '{key}' under locale '{locale}'")
            }
            Self::MalformedTag { raw } => {
                write!(f, "locale tag '{raw}' is not a valid language identifier")
            }
        }
    }
}

impl std::error::Error for ResolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_inputs() {
        let err = ResolveError::MissingTerm {
            locale: "es-mx".to_string(),
            key: "greeting".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("greeting"));
        assert!(text.contains("es-mx"));
    }

    #[test]
    fn degradation_mapping_is_stable() {
        let missing = ResolveError::MissingTerm {
            locale: "en".to_string(),
            key: "x".to_string(),
        };
        assert_eq!(missing.degradation(), Degradation::ReturnKey);
        assert_eq!(missing.error_type(), "missing_term");

        let malformed = ResolveError::MalformedTag {
            raw: "not a tag!".to_string(),
        };
        assert_eq!(malformed.degradation(), Degradation::WholeTagAsLanguage);
        assert_eq!(malformed.error_type(), "malformed_tag");
    }
}
