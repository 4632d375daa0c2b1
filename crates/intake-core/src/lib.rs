//! Flight Intake Core - arrival details capture
//!
//! Everything between the user typing and the wire:
//! - Per-field validation with user-facing messages
//! - Form state with touched/dirty tracking
//! - Payload normalisation for the submission endpoint
//! - The submission state machine and per-user history
//! - Confidence-gated autofill from boarding-pass images
//!
//! Network, storage and identity live behind the traits in [`ports`].
//!
//! # Example
//!
//! ```rust,ignore
//! use intake_core::prelude::*;
//!
//! # async fn example(flow: SubmissionFlow) {
//! let mut form = FlightForm::new();
//! form.set_value(FieldName::Airline, "Delta");
//! form.set_value(FieldName::FlightNumber, "DL404");
//!
//! match flow.submit(&mut form).await {
//!     SubmissionOutcome::Invalid { fields } => println!("fix {} field(s)", fields.len()),
//!     outcome => println!("{outcome:?}"),
//! }
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod autofill;
pub mod config;
pub mod error;
pub mod form;
pub mod history;
pub mod payload;
pub mod ports;
pub mod submission;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use autofill::{AutofillFlow, AutofillReport, ConfidenceTier};
pub use config::IntakeConfig;
pub use error::{ConfigError, ExtractError, IntakeError, StoreError, SubmitError};
pub use form::{FieldFlags, FlightForm};
pub use history::{format_arrival_date, format_submitted_at, HistorySummary};
pub use payload::prepare_payload;
pub use ports::{
    Clock, FlightExtractor, FlightGateway, FlightHistory, IdentitySource, ImageUpload,
    StaticIdentity, SystemClock, WatchIdentity,
};
pub use submission::{SubmissionFlow, SubmissionOutcome, SubmissionState};
pub use types::{
    ExtractedFlightData, FieldName, FlightFormValues, FlightPayload, RecordId, StoredFlightRecord,
    SubmissionReceipt, UserIdentity,
};
pub use validation::{FieldErrors, ValidationContext, ValidationFailure};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building an intake front end
    pub use crate::{
        AutofillFlow, AutofillReport, FieldName, FlightForm, FlightPayload, HistorySummary,
        ImageUpload, IntakeConfig, IntakeError, SubmissionFlow, SubmissionOutcome,
        SubmissionState, UserIdentity,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
