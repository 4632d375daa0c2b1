//! Testing utilities for the flight intake workspace
//!
//! Scripted collaborators, a fixed clock and form fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use intake_core::{
    Clock, ExtractError, ExtractedFlightData, FieldName, FlightExtractor, FlightForm,
    FlightFormValues, FlightGateway, FlightHistory, FlightPayload, ImageUpload, StaticIdentity,
    SubmissionFlow, SubmissionReceipt, SubmitError, UserIdentity, ValidationContext,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub use intake_store::InMemoryHistory;

pub const TEST_EMAIL: &str = "crew@example.com";

/// Gateway answering from a script; accepts everything once the script runs out
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<SubmissionReceipt, SubmitError>>>,
    payloads: Mutex<Vec<FlightPayload>>,
}

impl ScriptedGateway {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn with_results(
        results: impl IntoIterator<Item = Result<SubmissionReceipt, SubmitError>>,
    ) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            payloads: Mutex::default(),
        }
    }

    pub fn rejecting(status: u16, message: Option<&str>) -> Self {
        Self::with_results([Err(SubmitError::Rejected {
            status,
            message: message.map(str::to_string),
        })])
    }

    pub fn calls(&self) -> usize {
        self.payloads.lock().len()
    }

    pub fn payloads(&self) -> Vec<FlightPayload> {
        self.payloads.lock().clone()
    }
}

#[async_trait]
impl FlightGateway for ScriptedGateway {
    async fn submit(&self, payload: &FlightPayload) -> Result<SubmissionReceipt, SubmitError> {
        self.payloads.lock().push(payload.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(SubmissionReceipt::default()))
    }
}

/// Gateway that holds every call until released
#[derive(Debug, Default)]
pub struct GatedGateway {
    entered: Notify,
    release: Notify,
    calls: AtomicUsize,
}

impl GatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until a submission is parked inside the gateway
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the parked submission complete
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FlightGateway for GatedGateway {
    async fn submit(&self, _payload: &FlightPayload) -> Result<SubmissionReceipt, SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(SubmissionReceipt::default())
    }
}

/// Extractor returning a fixed answer
#[derive(Debug)]
pub struct ScriptedExtractor {
    result: Result<ExtractedFlightData, ExtractError>,
    calls: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn returning(data: ExtractedFlightData) -> Self {
        Self {
            result: Ok(data),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ExtractError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FlightExtractor for ScriptedExtractor {
    async fn extract(&self, _image: ImageUpload) -> Result<ExtractedFlightData, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Extractor that holds every call until released
#[derive(Debug)]
pub struct GatedExtractor {
    data: ExtractedFlightData,
    entered: Notify,
    release: Notify,
    calls: AtomicUsize,
}

impl GatedExtractor {
    pub fn returning(data: ExtractedFlightData) -> Self {
        Self {
            data,
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Wait until an extraction is parked inside the extractor
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the parked extraction complete
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FlightExtractor for GatedExtractor {
    async fn extract(&self, _image: ImageUpload) -> Result<ExtractedFlightData, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.data.clone())
    }
}

/// Clock stopped at noon UTC on a given day
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    today: NaiveDate,
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn on(today: NaiveDate) -> Self {
        let now = Utc.from_utc_datetime(&today.and_hms_opt(12, 0, 0).unwrap_or_default());
        Self { today, now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

/// Reference date used by the fixtures
pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 15).unwrap_or_default()
}

/// Raw values that pass every validator for `today`
pub fn valid_values(today: NaiveDate) -> FlightFormValues {
    let arrival = today.checked_add_days(Days::new(5)).unwrap_or(today);
    FlightFormValues {
        airline: "Delta Air Lines".to_string(),
        arrival_date: arrival.format("%Y-%m-%d").to_string(),
        arrival_time: "14:30".to_string(),
        flight_number: "DL404".to_string(),
        num_of_guests: "2".to_string(),
        comments: "  Vegetarian meal  ".to_string(),
    }
}

/// Filled, valid form for `today`
pub fn valid_form(today: NaiveDate) -> FlightForm {
    FlightForm::from_values(valid_values(today), ValidationContext::new(today))
}

/// Empty form for `today`
pub fn empty_form(today: NaiveDate) -> FlightForm {
    FlightForm::with_context(ValidationContext::new(today))
}

/// Form with one field overridden
pub fn form_with(today: NaiveDate, field: FieldName, value: &str) -> FlightForm {
    let mut form = valid_form(today);
    form.set_value(field, value);
    form
}

pub fn signed_in(email: &str) -> Arc<StaticIdentity> {
    Arc::new(StaticIdentity::signed_in(UserIdentity::with_email(email)))
}

/// Flow over the given gateway and history, signed in as [`TEST_EMAIL`]
pub fn flow_with(
    gateway: Arc<dyn FlightGateway>,
    history: Arc<dyn FlightHistory>,
) -> SubmissionFlow {
    SubmissionFlow::new(
        gateway,
        history,
        signed_in(TEST_EMAIL),
        Arc::new(FixedClock::on(test_today())),
    )
}

/// Extraction answer with every field set
pub fn extraction(confidence: f64) -> ExtractedFlightData {
    ExtractedFlightData {
        airline: Some("United Airlines".to_string()),
        flight_number: Some("UA889".to_string()),
        arrival_date: Some("2030-06-20".to_string()),
        arrival_time: Some("06:45 PM".to_string()),
        confidence,
    }
}
