#![forbid(unsafe_code)]

//! Locale-aware formatting seam.
//!
//! The runtime does not implement formatting rules. It resolves which
//! locale applies and hands the value plus that locale to a
//! [`FormatProvider`]. The shipped provider is [`IcuFormats`] (feature
//! `icu`, on by default), which delegates to ICU4X; builds without the
//! feature get [`BasicFormats`], locale-blind strftime dates and plain
//! `format!` numbers.
//!
//! Hosts with their own formatting source (a server-side CLDR bundle, a
//! platform API) implement [`FormatProvider`] and install it with
//! [`Localizer::set_formats`](crate::context::Localizer::set_formats).
//!
//! # Failure Modes
//!
//! - **Non-finite numeric input**: [`FormatError::InvalidNumericInput`].
//!   The lenient surfaces on the context and translator turn this into an
//!   empty string and a warning.
//! - **Unknown locale**: providers degrade to the root locale rather than
//!   erroring; the tag was already sanity-checked upstream.

use lingo_i18n::{Degradation, LocaleTag};

/// How much of the date to spell out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateLength {
    /// Numeric, e.g. `3/14/24`.
    Short,
    /// Abbreviated, e.g. `Mar 14, 2024`.
    #[default]
    Medium,
    /// Spelled out, e.g. `March 14, 2024`.
    Long,
    /// Spelled out with weekday.
    Full,
}

/// How much of the time to spell out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeLength {
    /// Hours and minutes.
    Short,
    /// Hours, minutes, seconds.
    #[default]
    Medium,
    /// Like `Medium`; providers with zone data may add it here.
    Long,
}

/// Which parts of a timestamp to render.
///
/// Both fields `None` means "medium date", the historical default of the
/// `date` term surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateOptions {
    pub date: Option<DateLength>,
    pub time: Option<TimeLength>,
}

impl DateOptions {
    /// Date part only.
    #[must_use]
    pub fn date(length: DateLength) -> Self {
        Self {
            date: Some(length),
            time: None,
        }
    }

    /// Time part only.
    #[must_use]
    pub fn time(length: TimeLength) -> Self {
        Self {
            date: None,
            time: Some(length),
        }
    }

    /// Both parts, rendered date first.
    #[must_use]
    pub fn date_time(date: DateLength, time: TimeLength) -> Self {
        Self {
            date: Some(date),
            time: Some(time),
        }
    }
}

/// Numeric rendering knobs, mirroring the common Intl-style surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberOptions {
    /// Insert locale grouping separators. On by default.
    pub grouping: bool,
    /// Minimum fraction digits to keep (zero-padded).
    pub min_fraction_digits: Option<i16>,
    /// Maximum fraction digits to keep (rounded). Defaults to 3.
    pub max_fraction_digits: Option<i16>,
}

impl Default for NumberOptions {
    fn default() -> Self {
        Self {
            grouping: true,
            min_fraction_digits: None,
            max_fraction_digits: None,
        }
    }
}

/// Calendar unit for relative-time phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Reserved knobs for relative-time rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct RelativeOptions {}

/// Formatting failure. Lenient callers map every variant to an empty
/// string.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The numeric input was NaN or infinite.
    InvalidNumericInput { value: f64 },
    /// The provider could not build a formatter for this request.
    Unformattable { what: &'static str },
}

impl FormatError {
    /// Stable label for diagnostics.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidNumericInput { .. } => "invalid_numeric_input",
            Self::Unformattable { .. } => "unformattable",
        }
    }

    /// What the lenient surface substitutes for the failed call.
    #[must_use]
    pub fn degradation(&self) -> Degradation {
        Degradation::EmptyOutput
    }
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumericInput { value } => {
                write!(f, "cannot format non-finite number {value}")
            }
            Self::Unformattable { what } => {
                write!(f, "no formatter available for {what}")
            }
        }
    }
}

impl std::error::Error for FormatError {}

/// Locale-aware formatting collaborator.
///
/// Implementations receive the already-resolved locale tag; they never
/// consult ambient state themselves.
pub trait FormatProvider {
    /// Render a timestamp per `options` (both parts `None` ⇒ medium date).
    fn date(
        &self,
        locale: &LocaleTag,
        value: &chrono::DateTime<chrono::Local>,
        options: &DateOptions,
    ) -> Result<String, FormatError>;

    /// Render a number per `options`.
    fn number(
        &self,
        locale: &LocaleTag,
        value: f64,
        options: &NumberOptions,
    ) -> Result<String, FormatError>;

    /// Render a relative-time phrase such as `in 3 days`.
    fn relative_time(
        &self,
        locale: &LocaleTag,
        value: f64,
        unit: TimeUnit,
        options: &RelativeOptions,
    ) -> Result<String, FormatError>;
}

/// The provider new contexts start with.
#[must_use]
pub fn default_provider() -> std::rc::Rc<dyn FormatProvider> {
    #[cfg(feature = "icu")]
    {
        std::rc::Rc::new(IcuFormats)
    }
    #[cfg(not(feature = "icu"))]
    {
        std::rc::Rc::new(BasicFormats)
    }
}

const DEFAULT_MAX_FRACTION_DIGITS: i16 = 3;
const MAX_FRACTION_DIGITS: i16 = 12;

/// Resolve the min/max fraction-digit pair, clamped and ordered.
fn fraction_bounds(options: &NumberOptions) -> (i16, i16) {
    let max = options
        .max_fraction_digits
        .unwrap_or(DEFAULT_MAX_FRACTION_DIGITS)
        .clamp(0, MAX_FRACTION_DIGITS);
    let min = options
        .min_fraction_digits
        .unwrap_or(0)
        .clamp(0, MAX_FRACTION_DIGITS)
        .min(max);
    (min, max)
}

fn unit_label(unit: TimeUnit, plural: bool) -> &'static str {
    match unit {
        TimeUnit::Second => {
            if plural {
                "seconds"
            } else {
                "second"
            }
        }
        TimeUnit::Minute => {
            if plural {
                "minutes"
            } else {
                "minute"
            }
        }
        TimeUnit::Hour => {
            if plural {
                "hours"
            } else {
                "hour"
            }
        }
        TimeUnit::Day => {
            if plural {
                "days"
            } else {
                "day"
            }
        }
        TimeUnit::Week => {
            if plural {
                "weeks"
            } else {
                "week"
            }
        }
        TimeUnit::Month => {
            if plural {
                "months"
            } else {
                "month"
            }
        }
        TimeUnit::Quarter => {
            if plural {
                "quarters"
            } else {
                "quarter"
            }
        }
        TimeUnit::Year => {
            if plural {
                "years"
            } else {
                "year"
            }
        }
    }
}

/// Assemble the relative-time phrase around an already-formatted
/// magnitude. The wording is the provider fallback pattern; hosts wanting
/// CLDR phrasing install their own [`FormatProvider`].
fn relative_phrase(magnitude: &str, value: f64, unit: TimeUnit) -> String {
    let label = unit_label(unit, value.abs() != 1.0);
    if value < 0.0 {
        format!("{magnitude} {label} ago")
    } else {
        format!("in {magnitude} {label}")
    }
}

// ---------------------------------------------------------------------------
// ICU4X provider
// ---------------------------------------------------------------------------

/// Formatting through ICU4X compiled data.
///
/// Dates and numbers follow the locale's CLDR conventions. Relative-time
/// phrases format the magnitude with the locale's decimal formatter but
/// keep English unit scaffolding; see [`FormatProvider::relative_time`].
#[cfg(feature = "icu")]
#[derive(Debug, Default, Clone, Copy)]
pub struct IcuFormats;

#[cfg(feature = "icu")]
impl IcuFormats {
    /// Best-effort conversion; unknown tags degrade to the root locale.
    fn icu_locale(tag: &LocaleTag) -> icu::locale::Locale {
        tag.key().parse().unwrap_or(icu::locale::Locale::UNKNOWN)
    }

    fn format_date_part(
        locale: &icu::locale::Locale,
        value: &chrono::DateTime<chrono::Local>,
        length: DateLength,
    ) -> String {
        use chrono::Datelike;
        use icu::calendar::Date;
        use icu::datetime::DateTimeFormatter;
        use icu::datetime::fieldsets;

        let naive = value.naive_local();
        let icu_date = match Date::try_new_iso(naive.year(), naive.month() as u8, naive.day() as u8)
        {
            Ok(d) => d,
            Err(_) => return value.format("%Y-%m-%d").to_string(),
        };

        let rendered = match length {
            DateLength::Short => DateTimeFormatter::try_new(
                locale.clone().into(),
                fieldsets::YMD::short(),
            )
            .ok()
            .map(|f| f.format(&icu_date).to_string()),
            DateLength::Medium => DateTimeFormatter::try_new(
                locale.clone().into(),
                fieldsets::YMD::medium(),
            )
            .ok()
            .map(|f| f.format(&icu_date).to_string()),
            DateLength::Long => DateTimeFormatter::try_new(
                locale.clone().into(),
                fieldsets::YMD::long(),
            )
            .ok()
            .map(|f| f.format(&icu_date).to_string()),
            DateLength::Full => DateTimeFormatter::try_new(
                locale.clone().into(),
                fieldsets::YMDE::long(),
            )
            .ok()
            .map(|f| f.format(&icu_date).to_string()),
        };

        rendered.unwrap_or_else(|| value.format("%Y-%m-%d").to_string())
    }

    fn format_time_part(
        locale: &icu::locale::Locale,
        value: &chrono::DateTime<chrono::Local>,
        length: TimeLength,
    ) -> String {
        use chrono::Timelike;
        use icu::datetime::NoCalendarFormatter;
        use icu::datetime::fieldsets;
        use icu::time::Time;

        let naive = value.naive_local();
        let icu_time = match Time::try_new(
            naive.hour() as u8,
            naive.minute() as u8,
            naive.second() as u8,
            0,
        ) {
            Ok(t) => t,
            Err(_) => return value.format("%H:%M:%S").to_string(),
        };

        let rendered = match length {
            TimeLength::Short => {
                NoCalendarFormatter::try_new(locale.clone().into(), fieldsets::T::short())
                    .ok()
                    .map(|f| f.format(&icu_time).to_string())
            }
            TimeLength::Medium => {
                NoCalendarFormatter::try_new(locale.clone().into(), fieldsets::T::medium())
                    .ok()
                    .map(|f| f.format(&icu_time).to_string())
            }
            TimeLength::Long => {
                NoCalendarFormatter::try_new(locale.clone().into(), fieldsets::T::long())
                    .ok()
                    .map(|f| f.format(&icu_time).to_string())
            }
        };

        rendered.unwrap_or_else(|| value.format("%H:%M:%S").to_string())
    }
}

#[cfg(feature = "icu")]
impl FormatProvider for IcuFormats {
    fn date(
        &self,
        locale: &LocaleTag,
        value: &chrono::DateTime<chrono::Local>,
        options: &DateOptions,
    ) -> Result<String, FormatError> {
        let icu_locale = Self::icu_locale(locale);
        let (date, time) = match (options.date, options.time) {
            (None, None) => (Some(DateLength::Medium), None),
            other => other,
        };

        let date_part = date.map(|len| Self::format_date_part(&icu_locale, value, len));
        let time_part = time.map(|len| Self::format_time_part(&icu_locale, value, len));

        Ok(match (date_part, time_part) {
            (Some(d), Some(t)) => format!("{d} {t}"),
            (Some(d), None) => d,
            (None, Some(t)) => t,
            // Unreachable once defaulting ran; stay panic-free regardless.
            (None, None) => String::new(),
        })
    }

    fn number(
        &self,
        locale: &LocaleTag,
        value: f64,
        options: &NumberOptions,
    ) -> Result<String, FormatError> {
        use icu::decimal::DecimalFormatter;
        use icu::decimal::input::Decimal;
        use icu::decimal::options::{DecimalFormatterOptions, GroupingStrategy};

        if !value.is_finite() {
            return Err(FormatError::InvalidNumericInput { value });
        }

        let mut formatter_options = DecimalFormatterOptions::default();
        if !options.grouping {
            formatter_options.grouping_strategy = Some(GroupingStrategy::Never);
        }

        let formatter =
            DecimalFormatter::try_new(Self::icu_locale(locale).into(), formatter_options)
                .map_err(|_| FormatError::Unformattable { what: "number" })?;

        // f64 → Decimal via integer scaling at the maximum precision, then
        // trim back down to the minimum.
        let (min, max) = fraction_bounds(options);
        let scale = 10_f64.powi(i32::from(max));
        let scaled = (value * scale).round() as i64;
        let mut decimal = Decimal::from(scaled);
        decimal.multiply_pow10(-max);
        decimal.trim_end();
        decimal.pad_end(-min);

        Ok(formatter.format(&decimal).to_string())
    }

    /// The magnitude is locale-formatted; the phrase around it is the
    /// English fallback pattern (`in 3 days` / `3 days ago`).
    fn relative_time(
        &self,
        locale: &LocaleTag,
        value: f64,
        unit: TimeUnit,
        _options: &RelativeOptions,
    ) -> Result<String, FormatError> {
        if !value.is_finite() {
            return Err(FormatError::InvalidNumericInput { value });
        }
        let magnitude = self.number(locale, value.abs(), &NumberOptions::default())?;
        Ok(relative_phrase(&magnitude, value, unit))
    }
}

// ---------------------------------------------------------------------------
// Locale-blind provider
// ---------------------------------------------------------------------------

/// Plain-Rust formatting for builds without the `icu` feature. Dates come
/// out in fixed English patterns and numbers ungrouped.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicFormats;

impl BasicFormats {
    fn date_pattern(length: DateLength) -> &'static str {
        match length {
            DateLength::Short => "%m/%d/%y",
            DateLength::Medium => "%b %d, %Y",
            DateLength::Long => "%B %d, %Y",
            DateLength::Full => "%A, %B %d, %Y",
        }
    }

    fn time_pattern(length: TimeLength) -> &'static str {
        match length {
            TimeLength::Short => "%H:%M",
            TimeLength::Medium | TimeLength::Long => "%H:%M:%S",
        }
    }

    /// Drop trailing fraction zeros past `min_digits`, and the point
    /// itself when nothing follows it.
    fn shrink_fraction(rendered: String, min_digits: usize) -> String {
        let Some(dot) = rendered.find('.') else {
            return rendered;
        };
        let bytes = rendered.as_bytes();
        let mut end = rendered.len();
        while end > dot + 1 + min_digits && bytes[end - 1] == b'0' {
            end -= 1;
        }
        if end == dot + 1 {
            end = dot;
        }
        rendered[..end].to_string()
    }
}

impl FormatProvider for BasicFormats {
    fn date(
        &self,
        _locale: &LocaleTag,
        value: &chrono::DateTime<chrono::Local>,
        options: &DateOptions,
    ) -> Result<String, FormatError> {
        let (date, time) = match (options.date, options.time) {
            (None, None) => (Some(DateLength::Medium), None),
            other => other,
        };

        let date_part = date.map(|len| value.format(Self::date_pattern(len)).to_string());
        let time_part = time.map(|len| value.format(Self::time_pattern(len)).to_string());

        Ok(match (date_part, time_part) {
            (Some(d), Some(t)) => format!("{d} {t}"),
            (Some(d), None) => d,
            (None, Some(t)) => t,
            // Unreachable once defaulting ran; stay panic-free regardless.
            (None, None) => String::new(),
        })
    }

    fn number(
        &self,
        _locale: &LocaleTag,
        value: f64,
        options: &NumberOptions,
    ) -> Result<String, FormatError> {
        if !value.is_finite() {
            return Err(FormatError::InvalidNumericInput { value });
        }
        let (min, max) = fraction_bounds(options);
        let rendered = format!("{value:.prec$}", prec = max as usize);
        Ok(Self::shrink_fraction(rendered, min as usize))
    }

    fn relative_time(
        &self,
        locale: &LocaleTag,
        value: f64,
        unit: TimeUnit,
        _options: &RelativeOptions,
    ) -> Result<String, FormatError> {
        if !value.is_finite() {
            return Err(FormatError::InvalidNumericInput { value });
        }
        let magnitude = self.number(locale, value.abs(), &NumberOptions::default())?;
        Ok(relative_phrase(&magnitude, value, unit))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lingo_i18n::LocaleTag;

    fn tag(raw: &str) -> LocaleTag {
        LocaleTag::parse(raw)
    }

    fn sample_datetime() -> chrono::DateTime<chrono::Local> {
        chrono::Local
            .with_ymd_and_hms(2024, 3, 14, 15, 9, 26)
            .unwrap()
    }

    fn digits(rendered: &str) -> String {
        rendered.chars().filter(char::is_ascii_digit).collect()
    }

    #[test]
    fn basic_number_honors_precision_bounds() {
        let provider = BasicFormats;
        let opts = NumberOptions {
            grouping: false,
            min_fraction_digits: Some(1),
            max_fraction_digits: Some(3),
        };

        assert_eq!(provider.number(&tag("en"), 1.5, &opts).unwrap(), "1.5");
        assert_eq!(provider.number(&tag("en"), 2.0, &opts).unwrap(), "2.0");
        assert_eq!(
            provider.number(&tag("en"), 1.23456, &opts).unwrap(),
            "1.235"
        );
    }

    #[test]
    fn basic_number_defaults_trim_whole_values() {
        let provider = BasicFormats;
        let opts = NumberOptions::default();
        assert_eq!(provider.number(&tag("en"), 42.0, &opts).unwrap(), "42");
        assert_eq!(provider.number(&tag("en"), 0.5, &opts).unwrap(), "0.5");
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let provider = BasicFormats;
        let opts = NumberOptions::default();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = provider.number(&tag("en"), bad, &opts).unwrap_err();
            assert_eq!(err.error_type(), "invalid_numeric_input");
            assert_eq!(err.degradation(), Degradation::EmptyOutput);
        }
    }

    #[test]
    fn basic_date_defaults_to_medium_date_only() {
        let provider = BasicFormats;
        let rendered = provider
            .date(&tag("en"), &sample_datetime(), &DateOptions::default())
            .unwrap();
        assert_eq!(rendered, "Mar 14, 2024");
    }

    #[test]
    fn basic_date_composes_date_and_time() {
        let provider = BasicFormats;
        let rendered = provider
            .date(
                &tag("en"),
                &sample_datetime(),
                &DateOptions::date_time(DateLength::Short, TimeLength::Medium),
            )
            .unwrap();
        assert_eq!(rendered, "03/14/24 15:09:26");
    }

    #[test]
    fn relative_phrases_cover_past_future_and_singular() {
        let provider = BasicFormats;
        let opts = RelativeOptions::default();
        let en = tag("en");

        assert_eq!(
            provider.relative_time(&en, 3.0, TimeUnit::Day, &opts).unwrap(),
            "in 3 days"
        );
        assert_eq!(
            provider
                .relative_time(&en, -5.0, TimeUnit::Hour, &opts)
                .unwrap(),
            "5 hours ago"
        );
        assert_eq!(
            provider.relative_time(&en, 1.0, TimeUnit::Week, &opts).unwrap(),
            "in 1 week"
        );
        assert_eq!(
            provider
                .relative_time(&en, 0.0, TimeUnit::Second, &opts)
                .unwrap(),
            "in 0 seconds"
        );
    }

    #[test]
    fn format_error_messages_name_the_problem() {
        let invalid = FormatError::InvalidNumericInput { value: f64::NAN };
        assert!(invalid.to_string().contains("non-finite"));

        let unformattable = FormatError::Unformattable { what: "number" };
        assert!(unformattable.to_string().contains("number"));
        assert_eq!(unformattable.error_type(), "unformattable");
    }

    #[cfg(feature = "icu")]
    mod icu_backed {
        use super::*;

        #[test]
        fn number_keeps_digits_and_groups_for_english() {
            let provider = IcuFormats;
            let rendered = provider
                .number(&tag("en"), 1234567.0, &NumberOptions::default())
                .unwrap();
            assert_eq!(digits(&rendered), "1234567");
            assert!(rendered.len() > 7, "grouping separators expected: {rendered}");
        }

        #[test]
        fn grouping_off_yields_bare_digits() {
            let provider = IcuFormats;
            let opts = NumberOptions {
                grouping: false,
                ..NumberOptions::default()
            };
            assert_eq!(provider.number(&tag("en"), 1234567.0, &opts).unwrap(), "1234567");
        }

        #[test]
        fn fraction_digits_round_and_pad() {
            let provider = IcuFormats;
            let opts = NumberOptions {
                grouping: false,
                min_fraction_digits: Some(2),
                max_fraction_digits: Some(2),
            };
            assert_eq!(provider.number(&tag("en"), 3.14159, &opts).unwrap(), "3.14");
            assert_eq!(provider.number(&tag("en"), 2.0, &opts).unwrap(), "2.00");
        }

        #[test]
        fn non_finite_input_is_rejected_by_icu_too() {
            let provider = IcuFormats;
            let err = provider
                .number(&tag("en"), f64::NAN, &NumberOptions::default())
                .unwrap_err();
            assert_eq!(err.error_type(), "invalid_numeric_input");
        }

        #[test]
        fn date_medium_carries_the_year() {
            let provider = IcuFormats;
            let rendered = provider
                .date(&tag("en"), &sample_datetime(), &DateOptions::default())
                .unwrap();
            assert!(rendered.contains("2024"), "unexpected date: {rendered}");
        }

        #[test]
        fn date_with_time_part_carries_a_clock() {
            let provider = IcuFormats;
            let rendered = provider
                .date(
                    &tag("en"),
                    &sample_datetime(),
                    &DateOptions::date_time(DateLength::Medium, TimeLength::Medium),
                )
                .unwrap();
            assert!(rendered.contains(':'), "unexpected datetime: {rendered}");
        }

        #[test]
        fn unknown_locale_degrades_instead_of_failing() {
            let provider = IcuFormats;
            let rendered = provider
                .number(&tag("not a tag!!"), 12.5, &NumberOptions::default())
                .unwrap();
            assert_eq!(digits(&rendered), "125");
        }

        #[test]
        fn relative_time_formats_the_magnitude() {
            let provider = IcuFormats;
            let rendered = provider
                .relative_time(&tag("en"), 3.0, TimeUnit::Day, &RelativeOptions::default())
                .unwrap();
            assert_eq!(rendered, "in 3 days");
        }
    }
}
