//! Per-user flight history view

use crate::error::StoreError;
use crate::ports::FlightHistory;
use crate::types::StoredFlightRecord;
use crate::validation::parse_date;
use chrono::{DateTime, Local, Utc};
use std::collections::BTreeSet;

/// One user's submitted flights with summary figures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySummary {
    pub flights: Vec<StoredFlightRecord>,
    pub total_guests: u64,
    pub unique_airlines: usize,
}

impl HistorySummary {
    /// Summarise a user's records
    #[must_use]
    pub fn from_records(flights: Vec<StoredFlightRecord>) -> Self {
        let total_guests = flights
            .iter()
            .map(|f| u64::from(f.flight.num_of_guests))
            .sum();
        let unique_airlines = flights
            .iter()
            .map(|f| f.flight.airline.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            flights,
            total_guests,
            unique_airlines,
        }
    }

    /// Load and summarise the records owned by `owner_email`
    pub async fn load(history: &dyn FlightHistory, owner_email: &str) -> Result<Self, StoreError> {
        let flights = history.records_for(owner_email).await?;
        Ok(Self::from_records(flights))
    }

    /// Whether the user has no flights yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

/// Arrival date for listings, e.g. `Thu, Oct 16`
///
/// Unparseable dates are shown as stored.
#[must_use]
pub fn format_arrival_date(date: &str) -> String {
    parse_date(date).map_or_else(|| date.to_string(), |d| d.format("%a, %b %-d").to_string())
}

/// Submission time for listings in local time, e.g. `Oct 16, 02:30 PM`
#[must_use]
pub fn format_submitted_at(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%b %-d, %I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlightPayload;
    use chrono::TimeZone;

    fn record(airline: &str, guests: u32) -> StoredFlightRecord {
        StoredFlightRecord::new(
            FlightPayload {
                airline: airline.to_string(),
                arrival_date: "2030-10-17".to_string(),
                arrival_time: "09:00 AM".to_string(),
                flight_number: "AB12".to_string(),
                num_of_guests: guests,
                comments: None,
            },
            "crew@example.com",
            Utc.with_ymd_and_hms(2030, 10, 1, 8, 0, 0).unwrap(),
        )
    }

    #[test]
    fn summary_counts_guests_and_airlines() {
        let summary = HistorySummary::from_records(vec![
            record("Delta", 2),
            record("KLM", 3),
            record("Delta", 1),
        ]);
        assert_eq!(summary.total_guests, 6);
        assert_eq!(summary.unique_airlines, 2);
        assert_eq!(summary.flights.len(), 3);
    }

    #[test]
    fn empty_summary() {
        let summary = HistorySummary::from_records(Vec::new());
        assert!(summary.is_empty());
        assert_eq!(summary.total_guests, 0);
        assert_eq!(summary.unique_airlines, 0);
    }

    #[test]
    fn arrival_date_formatting() {
        assert_eq!(format_arrival_date("2030-10-17"), "Thu, Oct 17");
        assert_eq!(format_arrival_date("soon"), "soon");
    }
}
