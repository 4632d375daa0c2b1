//! Core types for flight intake
//!
//! Defines:
//! - Form field names and raw form values
//! - The canonical wire payload
//! - Stored history records
//! - Extraction results and user identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ulid::Ulid;

/// Form field identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    /// Airline name
    Airline,
    /// Arrival date (YYYY-MM-DD)
    ArrivalDate,
    /// Arrival time (24h or 12h)
    ArrivalTime,
    /// Flight number (e.g. AA123)
    FlightNumber,
    /// Number of guests
    NumOfGuests,
    /// Free-form comments
    Comments,
}

impl FieldName {
    /// Number of form fields
    pub const COUNT: usize = 6;

    /// All fields in form order
    pub const ALL: [FieldName; Self::COUNT] = [
        FieldName::Airline,
        FieldName::ArrivalDate,
        FieldName::ArrivalTime,
        FieldName::FlightNumber,
        FieldName::NumOfGuests,
        FieldName::Comments,
    ];

    /// Wire/form key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            FieldName::Airline => "airline",
            FieldName::ArrivalDate => "arrivalDate",
            FieldName::ArrivalTime => "arrivalTime",
            FieldName::FlightNumber => "flightNumber",
            FieldName::NumOfGuests => "numOfGuests",
            FieldName::Comments => "comments",
        }
    }

    /// Human-readable label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::Airline => "Airline name",
            FieldName::ArrivalDate => "Arrival date",
            FieldName::ArrivalTime => "Arrival time",
            FieldName::FlightNumber => "Flight number",
            FieldName::NumOfGuests => "Number of guests",
            FieldName::Comments => "Comments",
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw, unvalidated form values as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlightFormValues {
    pub airline: String,
    pub arrival_date: String,
    pub arrival_time: String,
    pub flight_number: String,
    pub num_of_guests: String,
    pub comments: String,
}

impl FlightFormValues {
    /// Raw value for a field
    #[must_use]
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::Airline => &self.airline,
            FieldName::ArrivalDate => &self.arrival_date,
            FieldName::ArrivalTime => &self.arrival_time,
            FieldName::FlightNumber => &self.flight_number,
            FieldName::NumOfGuests => &self.num_of_guests,
            FieldName::Comments => &self.comments,
        }
    }

    /// Mutable raw value for a field
    pub fn get_mut(&mut self, field: FieldName) -> &mut String {
        match field {
            FieldName::Airline => &mut self.airline,
            FieldName::ArrivalDate => &mut self.arrival_date,
            FieldName::ArrivalTime => &mut self.arrival_time,
            FieldName::FlightNumber => &mut self.flight_number,
            FieldName::NumOfGuests => &mut self.num_of_guests,
            FieldName::Comments => &mut self.comments,
        }
    }
}

/// Canonical payload sent to the submission endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightPayload {
    pub airline: String,
    pub arrival_date: String,
    pub arrival_time: String,
    pub flight_number: String,
    pub num_of_guests: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Lenient view of the submission endpoint's JSON reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionReceipt {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// History record identifier
///
/// New records get a ULID. Existing records may carry any string id, such
/// as a millisecond timestamp, and numeric ids are read as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate new record ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Wrap an existing id
    #[inline]
    #[must_use]
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => Self(id),
            RawId::Number(id) => Self(id.to_string()),
        })
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A flight that was accepted by the remote endpoint
///
/// Created only after a successful submission and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFlightRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub flight: FlightPayload,
    pub submitted_at: DateTime<Utc>,
    #[serde(rename = "userEmail", alias = "ownerEmail")]
    pub owner_email: String,
}

impl StoredFlightRecord {
    /// Create a record for an accepted payload
    #[inline]
    #[must_use]
    pub fn new(
        flight: FlightPayload,
        owner_email: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            flight,
            submitted_at,
            owner_email: owner_email.into(),
        }
    }
}

/// Partial flight data read from an image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFlightData {
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub flight_number: Option<String>,
    #[serde(default)]
    pub arrival_date: Option<String>,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub confidence: f64,
}

impl ExtractedFlightData {
    /// Extracted value for a form field, if the reply carried a non-blank one
    #[must_use]
    pub fn value_for(&self, field: FieldName) -> Option<&str> {
        let value = match field {
            FieldName::Airline => self.airline.as_deref(),
            FieldName::FlightNumber => self.flight_number.as_deref(),
            FieldName::ArrivalDate => self.arrival_date.as_deref(),
            FieldName::ArrivalTime => self.arrival_time.as_deref(),
            FieldName::NumOfGuests | FieldName::Comments => None,
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Signed-in user as reported by the identity provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl UserIdentity {
    /// Identity with an email address
    #[inline]
    #[must_use]
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            display_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload() -> FlightPayload {
        FlightPayload {
            airline: "Delta".to_string(),
            arrival_date: "2030-01-02".to_string(),
            arrival_time: "02:30 PM".to_string(),
            flight_number: "DL123".to_string(),
            num_of_guests: 2,
            comments: None,
        }
    }

    #[test]
    fn payload_omits_absent_comments() {
        let json = serde_json::to_value(payload()).unwrap();
        assert_eq!(json["flightNumber"], "DL123");
        assert_eq!(json["numOfGuests"], 2);
        assert!(json.get("comments").is_none());
    }

    #[test]
    fn stored_record_uses_flat_layout() {
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        let record = StoredFlightRecord::new(payload(), "a@b.c", at);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["airline"], "Delta");
        assert_eq!(json["userEmail"], "a@b.c");
        assert!(json.get("flight").is_none());

        let back: StoredFlightRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn stored_record_accepts_owner_email_alias() {
        let json = serde_json::json!({
            "id": RecordId::new(),
            "airline": "Delta",
            "arrivalDate": "2030-01-02",
            "arrivalTime": "02:30 PM",
            "flightNumber": "DL123",
            "numOfGuests": 2,
            "submittedAt": "2030-01-01T12:00:00Z",
            "ownerEmail": "x@y.z"
        });
        let record: StoredFlightRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.owner_email, "x@y.z");
    }

    #[test]
    fn record_id_accepts_timestamp_ids() {
        let text: RecordId = serde_json::from_str("\"1697045000000\"").unwrap();
        assert_eq!(text.as_str(), "1697045000000");

        let number: RecordId = serde_json::from_str("1697045000000").unwrap();
        assert_eq!(number, text);
        assert_eq!(serde_json::to_string(&number).unwrap(), "\"1697045000000\"");

        assert_eq!(RecordId::new().as_str().len(), 26);
    }

    #[test]
    fn extracted_value_skips_blank() {
        let data = ExtractedFlightData {
            airline: Some("  ".to_string()),
            flight_number: Some(" UA9 ".to_string()),
            ..Default::default()
        };
        assert_eq!(data.value_for(FieldName::Airline), None);
        assert_eq!(data.value_for(FieldName::FlightNumber), Some("UA9"));
        assert_eq!(data.value_for(FieldName::NumOfGuests), None);
    }

    #[test]
    fn field_keys_match_wire_names() {
        let keys: Vec<_> = FieldName::ALL.iter().map(FieldName::key).collect();
        assert_eq!(
            keys,
            ["airline", "arrivalDate", "arrivalTime", "flightNumber", "numOfGuests", "comments"]
        );
    }
}
