//! Field validators for the flight form
//!
//! Every validator is a pure function of the raw value and a
//! [`ValidationContext`]. Rules are attached to fields by explicit
//! registration in [`FieldName::rules`]; a field's result is every failing
//! rule in registration order, so the first failure is the one to display.
//!
//! Empty values only ever fail [`Rule::Required`]; every other rule treats an
//! empty value as valid.

use crate::types::FieldName;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;

static AIRLINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\s\-]+$").expect("valid airline pattern"));

static FLIGHT_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,3}\d{1,4}$").expect("valid flight number pattern"));

static TIME_24H_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid 24h time pattern"));

static TIME_12H_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(0?[1-9]|1[0-2]):[0-5][0-9]\s?(AM|PM)$").expect("valid 12h time pattern")
});

/// Date format accepted for arrival dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inputs a validator may depend on besides the value itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    /// Current calendar date; arrival dates before it are rejected
    pub today: NaiveDate,
}

impl ValidationContext {
    /// Context for a given date
    #[inline]
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Context for the local calendar date
    #[must_use]
    pub fn local_today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::local_today()
    }
}

/// Why a field value was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Required field is empty
    RequiredMissing,
    /// Fewer characters than allowed
    TooShort { min: usize, actual: usize },
    /// More characters than allowed
    TooLong { max: usize, actual: usize },
    /// Value does not match the field's format
    PatternMismatch,
    /// Not a real calendar date
    InvalidDate,
    /// Date lies before today
    PastDate,
    /// Not a whole number
    NotInteger,
    /// Number below the allowed minimum
    BelowMinimum { min: i64 },
}

impl ValidationFailure {
    /// Stable tag for machine-readable output
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::RequiredMissing => "required-missing",
            Self::TooShort { .. } => "too-short",
            Self::TooLong { .. } => "too-long",
            Self::PatternMismatch => "pattern-mismatch",
            Self::InvalidDate => "invalid-date",
            Self::PastDate => "past-date",
            Self::NotInteger => "not-integer",
            Self::BelowMinimum { .. } => "below-minimum",
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Failures for one field, in rule order
pub type FieldErrors = SmallVec<[ValidationFailure; 2]>;

/// A single validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Value must be non-empty
    Required,
    /// At least this many characters
    MinLength(usize),
    /// At most this many characters
    MaxLength(usize),
    /// Letters, whitespace and hyphens only
    AirlineName,
    /// Two or three letters then one to four digits, case-insensitive
    FlightNumberFormat,
    /// A calendar date that is not before today
    NotPastDate,
    /// 24-hour `HH:MM` or 12-hour `H:MM AM/PM`
    TimeOfDay,
    /// Numeric value at least this large
    Minimum(i64),
    /// Numeric value with no fractional part
    WholeNumber,
}

impl Rule {
    /// Check a raw value; `None` means the rule passes
    #[must_use]
    pub fn check(&self, value: &str, ctx: &ValidationContext) -> Option<ValidationFailure> {
        if value.is_empty() {
            return (*self == Rule::Required).then_some(ValidationFailure::RequiredMissing);
        }

        match *self {
            Rule::Required => None,
            Rule::MinLength(min) => {
                let actual = value.chars().count();
                (actual < min).then_some(ValidationFailure::TooShort { min, actual })
            }
            Rule::MaxLength(max) => {
                let actual = value.chars().count();
                (actual > max).then_some(ValidationFailure::TooLong { max, actual })
            }
            Rule::AirlineName => {
                (!AIRLINE_PATTERN.is_match(value)).then_some(ValidationFailure::PatternMismatch)
            }
            Rule::FlightNumberFormat => (!FLIGHT_NUMBER_PATTERN.is_match(&value.to_uppercase()))
                .then_some(ValidationFailure::PatternMismatch),
            Rule::NotPastDate => match parse_date(value) {
                None => Some(ValidationFailure::InvalidDate),
                Some(date) if date < ctx.today => Some(ValidationFailure::PastDate),
                Some(_) => None,
            },
            Rule::TimeOfDay => {
                (!is_time_of_day(value)).then_some(ValidationFailure::PatternMismatch)
            }
            Rule::Minimum(min) => match parse_number(value) {
                #[allow(clippy::cast_precision_loss)]
                Some(n) if n < min as f64 => Some(ValidationFailure::BelowMinimum { min }),
                _ => None,
            },
            Rule::WholeNumber => match parse_number(value) {
                Some(n) if n.fract() == 0.0 => None,
                _ => Some(ValidationFailure::NotInteger),
            },
        }
    }
}

impl FieldName {
    /// Rules registered for this field, in display priority order
    #[must_use]
    pub fn rules(&self) -> &'static [Rule] {
        match self {
            FieldName::Airline => &[
                Rule::Required,
                Rule::MinLength(2),
                Rule::MaxLength(50),
                Rule::AirlineName,
            ],
            FieldName::ArrivalDate => &[Rule::Required, Rule::NotPastDate],
            FieldName::ArrivalTime => &[Rule::Required, Rule::TimeOfDay],
            FieldName::FlightNumber => &[
                Rule::Required,
                Rule::MinLength(3),
                Rule::MaxLength(7),
                Rule::FlightNumberFormat,
            ],
            FieldName::NumOfGuests => &[Rule::Required, Rule::Minimum(1), Rule::WholeNumber],
            FieldName::Comments => &[],
        }
    }

    /// User-facing message for a failure of this field
    #[must_use]
    pub fn message_for(&self, failure: ValidationFailure) -> String {
        use ValidationFailure as F;

        match (self, failure) {
            (_, F::RequiredMissing) => format!("{} is required", self.label()),
            (_, F::TooShort { min, .. }) => {
                format!("{} must be at least {min} characters", self.label())
            }
            (_, F::TooLong { max, .. }) => {
                format!("{} must not exceed {max} characters", self.label())
            }
            (FieldName::Airline, F::PatternMismatch) => {
                "Airline name can only contain letters, spaces, and hyphens".to_string()
            }
            (FieldName::ArrivalTime, F::PatternMismatch) => {
                "Please use format: HH:MM AM/PM (e.g., 01:45 PM)".to_string()
            }
            (FieldName::FlightNumber, F::PatternMismatch) => {
                "Flight number format: 2-3 letters + 1-4 digits (e.g., AA123)".to_string()
            }
            (_, F::PatternMismatch) => format!("{} has an invalid format", self.label()),
            (_, F::InvalidDate) => "Please enter a valid date".to_string(),
            (_, F::PastDate) => "Arrival date cannot be in the past".to_string(),
            (_, F::NotInteger) => format!("{} must be a whole number", self.label()),
            (_, F::BelowMinimum { min }) => format!("{} must be at least {min}", self.label()),
        }
    }
}

/// Run a rule set over a value
#[must_use]
pub fn validate_with(rules: &[Rule], value: &str, ctx: &ValidationContext) -> FieldErrors {
    rules.iter().filter_map(|rule| rule.check(value, ctx)).collect()
}

/// Validate one field's raw value with its registered rules
#[inline]
#[must_use]
pub fn validate_field(field: FieldName, value: &str, ctx: &ValidationContext) -> FieldErrors {
    validate_with(field.rules(), value, ctx)
}

/// Validate an airline name
#[must_use]
pub fn validate_airline(value: &str) -> FieldErrors {
    validate_with(FieldName::Airline.rules(), value, &ValidationContext::local_today())
}

/// Validate an arrival date against `today`
#[must_use]
pub fn validate_arrival_date(value: &str, today: NaiveDate) -> FieldErrors {
    validate_with(FieldName::ArrivalDate.rules(), value, &ValidationContext::new(today))
}

/// Validate an arrival time
#[must_use]
pub fn validate_arrival_time(value: &str) -> FieldErrors {
    validate_with(FieldName::ArrivalTime.rules(), value, &ValidationContext::local_today())
}

/// Validate a flight number
#[must_use]
pub fn validate_flight_number(value: &str) -> FieldErrors {
    validate_with(FieldName::FlightNumber.rules(), value, &ValidationContext::local_today())
}

/// Validate a guest count
#[must_use]
pub fn validate_num_of_guests(value: &str) -> FieldErrors {
    validate_with(FieldName::NumOfGuests.rules(), value, &ValidationContext::local_today())
}

/// Parse an arrival date
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Whether a value is a well-formed 24-hour `HH:MM` time
#[inline]
#[must_use]
pub fn is_24_hour_time(value: &str) -> bool {
    TIME_24H_PATTERN.is_match(value)
}

/// Whether a value is a 24-hour or 12-hour time
#[inline]
#[must_use]
pub fn is_time_of_day(value: &str) -> bool {
    is_24_hour_time(value) || TIME_12H_PATTERN.is_match(value)
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
