//! Raw form values to canonical wire payload
//!
//! The transform is deterministic and idempotent on canonical input:
//! feeding a payload's own values back through it yields the same payload.

use crate::types::{FlightFormValues, FlightPayload};
use crate::validation::is_24_hour_time;

/// Guest count used when the raw value does not yield a positive integer
pub const DEFAULT_GUESTS: u32 = 1;

/// Build the wire payload from raw form values
#[must_use]
pub fn prepare_payload(values: &FlightFormValues) -> FlightPayload {
    FlightPayload {
        airline: values.airline.trim().to_string(),
        arrival_date: values.arrival_date.clone(),
        arrival_time: to_12_hour(&values.arrival_time),
        flight_number: values.flight_number.to_uppercase(),
        num_of_guests: parse_guests(&values.num_of_guests),
        comments: normalize_comments(&values.comments),
    }
}

/// Convert a 24-hour `HH:MM` time to `HH:MM AM/PM`
///
/// Anything that is not a well-formed 24-hour time is returned unchanged.
#[must_use]
pub fn to_12_hour(time: &str) -> String {
    if !is_24_hour_time(time) {
        return time.to_string();
    }

    let Some((hours, minutes)) = time.split_once(':') else {
        return time.to_string();
    };
    let Ok(hour) = hours.parse::<u8>() else {
        return time.to_string();
    };

    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };

    format!("{hour12:02}:{minutes} {meridiem}")
}

/// Leading-integer parse with a positive fallback
///
/// `"3"` and `"3.5"` both give 3; `"abc"`, `"0"` and `"-2"` give
/// [`DEFAULT_GUESTS`].
#[must_use]
pub fn parse_guests(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1i64, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end]
        .parse::<i64>()
        .ok()
        .map(|n| n * sign)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n >= 1)
        .unwrap_or(DEFAULT_GUESTS)
}

/// Trim comments; blank comments are omitted from the payload
#[must_use]
pub fn normalize_comments(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl From<&FlightPayload> for FlightFormValues {
    fn from(payload: &FlightPayload) -> Self {
        Self {
            airline: payload.airline.clone(),
            arrival_date: payload.arrival_date.clone(),
            arrival_time: payload.arrival_time.clone(),
            flight_number: payload.flight_number.clone(),
            num_of_guests: payload.num_of_guests.to_string(),
            comments: payload.comments.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn values() -> FlightFormValues {
        FlightFormValues {
            airline: "  Delta Air  ".to_string(),
            arrival_date: "2030-06-15".to_string(),
            arrival_time: "14:30".to_string(),
            flight_number: "aa123".to_string(),
            num_of_guests: "3".to_string(),
            comments: "  window seat  ".to_string(),
        }
    }

    #[test]
    fn prepares_canonical_payload() {
        let payload = prepare_payload(&values());
        assert_eq!(
            payload,
            FlightPayload {
                airline: "Delta Air".to_string(),
                arrival_date: "2030-06-15".to_string(),
                arrival_time: "02:30 PM".to_string(),
                flight_number: "AA123".to_string(),
                num_of_guests: 3,
                comments: Some("window seat".to_string()),
            }
        );
    }

    #[test]
    fn converts_24_hour_times() {
        assert_eq!(to_12_hour("14:30"), "02:30 PM");
        assert_eq!(to_12_hour("00:00"), "12:00 AM");
        assert_eq!(to_12_hour("12:00"), "12:00 PM");
        assert_eq!(to_12_hour("09:05"), "09:05 AM");
        assert_eq!(to_12_hour("23:59"), "11:59 PM");
    }

    #[test]
    fn passes_through_12_hour_times() {
        assert_eq!(to_12_hour("2:30 PM"), "2:30 PM");
        assert_eq!(to_12_hour("02:30 pm"), "02:30 pm");
        assert_eq!(to_12_hour("99:99"), "99:99");
        assert_eq!(to_12_hour(""), "");
    }

    #[test]
    fn guest_parsing_falls_back_to_one() {
        assert_eq!(parse_guests("3"), 3);
        assert_eq!(parse_guests("3.5"), 3);
        assert_eq!(parse_guests(" 12 "), 12);
        assert_eq!(parse_guests("abc"), 1);
        assert_eq!(parse_guests(""), 1);
        assert_eq!(parse_guests("0"), 1);
        assert_eq!(parse_guests("-2"), 1);
        assert_eq!(parse_guests("99999999999"), 1);
    }

    #[test]
    fn blank_comments_are_absent() {
        let mut raw = values();
        raw.comments = "   ".to_string();
        let payload = prepare_payload(&raw);
        assert_eq!(payload.comments, None);

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("comments").is_none());
    }

    #[test]
    fn airline_case_is_preserved() {
        let mut raw = values();
        raw.airline = "klm royal dutch".to_string();
        assert_eq!(prepare_payload(&raw).airline, "klm royal dutch");
    }

    proptest! {
        #[test]
        fn prop_transform_is_idempotent(
            airline in "[A-Za-z -]{0,20}",
            hour in 0u8..24,
            minute in 0u8..60,
            flight in "[a-zA-Z]{2,3}[0-9]{1,4}",
            guests in "[0-9]{0,4}",
            comments in "[ a-z]{0,12}",
        ) {
            let raw = FlightFormValues {
                airline,
                arrival_date: "2030-06-15".to_string(),
                arrival_time: format!("{hour:02}:{minute:02}"),
                flight_number: flight,
                num_of_guests: guests,
                comments,
            };
            let once = prepare_payload(&raw);
            let twice = prepare_payload(&FlightFormValues::from(&once));
            prop_assert_eq!(once, twice);
        }
    }
}
