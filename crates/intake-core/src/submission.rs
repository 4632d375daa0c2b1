//! Submission flow
//!
//! validate → transform → POST → record history → update state
//!
//! The flow is a small state machine; every move is checked against
//! [`allowed_transitions`]. There is no automatic retry: each call to
//! [`SubmissionFlow::submit`] is a single attempt.

use crate::form::FlightForm;
use crate::payload::prepare_payload;
use crate::ports::{Clock, FlightGateway, FlightHistory, IdentitySource};
use crate::types::{FieldName, FlightPayload, StoredFlightRecord, SubmissionReceipt};
use parking_lot::Mutex;
use std::sync::Arc;

/// Message shown after an accepted submission
pub const SUBMIT_SUCCESS_MESSAGE: &str = "Flight information submitted successfully!";

/// Message left behind when a submit call is dropped mid-flight
pub const SUBMIT_CANCELLED_MESSAGE: &str = "Submission was cancelled. Please try again.";

/// Submission states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    /// Waiting for the user
    Idle,
    /// Remote call in flight
    Submitting,
    /// Last attempt was accepted
    Success { message: String },
    /// Last attempt failed
    Failed { message: String },
}

impl SubmissionState {
    /// Discriminant for the transition table
    #[must_use]
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Idle => StateKind::Idle,
            Self::Submitting => StateKind::Submitting,
            Self::Success { .. } => StateKind::Success,
            Self::Failed { .. } => StateKind::Failed,
        }
    }

    /// Message of a terminal state
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { message } | Self::Failed { message } => Some(message),
            Self::Idle | Self::Submitting => None,
        }
    }
}

/// State discriminant used by the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Idle,
    Submitting,
    Success,
    Failed,
}

/// Illegal state machine move
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal submission transition: {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: StateKind,
    pub to: StateKind,
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: StateKind) -> &'static [StateKind] {
    use StateKind::{Failed, Idle, Submitting, Success};
    match from {
        Idle => &[Idle, Submitting],
        Submitting => &[Success, Failed],
        Success | Failed => &[Idle],
    }
}

/// Validate a state transition
pub fn validate_transition(from: StateKind, to: StateKind) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

/// Result of one submit call
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Form was invalid; no network call was made
    Invalid { fields: Vec<FieldName> },
    /// A previous submission is still in flight
    Busy,
    /// Endpoint accepted the payload
    Accepted {
        payload: FlightPayload,
        receipt: SubmissionReceipt,
        /// Record appended to history, if the user could be resolved
        record: Option<StoredFlightRecord>,
    },
    /// Endpoint call failed; form values are kept
    Rejected { message: String },
}

impl SubmissionOutcome {
    /// Whether the endpoint accepted the payload
    #[inline]
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Orchestrates one form's submissions
pub struct SubmissionFlow {
    gateway: Arc<dyn FlightGateway>,
    history: Arc<dyn FlightHistory>,
    identity: Arc<dyn IdentitySource>,
    clock: Arc<dyn Clock>,
    state: Mutex<SubmissionState>,
}

impl std::fmt::Debug for SubmissionFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionFlow")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl SubmissionFlow {
    /// Create a flow over its collaborators
    #[must_use]
    pub fn new(
        gateway: Arc<dyn FlightGateway>,
        history: Arc<dyn FlightHistory>,
        identity: Arc<dyn IdentitySource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            history,
            identity,
            clock,
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SubmissionState {
        self.state.lock().clone()
    }

    /// Busy flag; disables duplicate submit triggers
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        *self.state.lock() == SubmissionState::Submitting
    }

    /// Submit the form once
    ///
    /// Invalid forms get every field marked touched and never reach the
    /// gateway. On success the form is reset and a history record is
    /// appended on a best-effort basis; on failure the form is untouched.
    pub async fn submit(&self, form: &mut FlightForm) -> SubmissionOutcome {
        {
            let mut state = self.state.lock();
            match state.kind() {
                StateKind::Submitting => {
                    tracing::debug!("Submit ignored: submission already in flight");
                    return SubmissionOutcome::Busy;
                }
                StateKind::Idle => {}
                // terminal states fall back to Idle on the next user submit
                StateKind::Success | StateKind::Failed => *state = SubmissionState::Idle,
            }
        }

        form.set_today(self.clock.today());
        if !form.is_valid() {
            form.mark_all_touched();
            let fields = form.invalid_fields();
            tracing::info!("Submission blocked: {} invalid field(s)", fields.len());
            return SubmissionOutcome::Invalid { fields };
        }

        let Some(_in_flight) = self.try_begin() else {
            return SubmissionOutcome::Busy;
        };

        let payload = prepare_payload(form.values());
        tracing::info!(
            "Submitting flight {} arriving {}",
            payload.flight_number,
            payload.arrival_date
        );
        tracing::debug!("Prepared payload: {:?}", payload);

        match self.gateway.submit(&payload).await {
            Ok(receipt) => {
                tracing::info!("Submission accepted for {}", payload.flight_number);
                let record = self.record_history(&payload).await;
                form.reset();
                self.transition(SubmissionState::Success {
                    message: SUBMIT_SUCCESS_MESSAGE.to_string(),
                });
                SubmissionOutcome::Accepted {
                    payload,
                    receipt,
                    record,
                }
            }
            Err(e) => {
                tracing::error!("Submission failed: {}", e);
                let message = e.user_message();
                self.transition(SubmissionState::Failed {
                    message: message.clone(),
                });
                SubmissionOutcome::Rejected { message }
            }
        }
    }

    /// Append an accepted payload to history; never fails the submission
    async fn record_history(&self, payload: &FlightPayload) -> Option<StoredFlightRecord> {
        let Some(email) = self.identity.current_user().and_then(|u| u.email) else {
            tracing::warn!("No signed-in user email; skipping flight history");
            return None;
        };

        let record = StoredFlightRecord::new(payload.clone(), email, self.clock.now());
        match self.history.append(record.clone()).await {
            Ok(()) => {
                tracing::debug!("Stored flight record {}", record.id);
                Some(record)
            }
            Err(e) => {
                tracing::warn!("Failed to store flight history: {}", e);
                None
            }
        }
    }

    /// Move to `Submitting` unless another call got there first
    fn try_begin(&self) -> Option<InFlight<'_>> {
        let mut state = self.state.lock();
        if validate_transition(state.kind(), StateKind::Submitting).is_err() {
            tracing::debug!("Submit ignored: state is {:?}", state.kind());
            return None;
        }
        *state = SubmissionState::Submitting;
        Some(InFlight { state: &self.state })
    }

    fn transition(&self, to: SubmissionState) {
        let mut state = self.state.lock();
        if let Err(e) = validate_transition(state.kind(), to.kind()) {
            tracing::error!("{}", e);
        }
        *state = to;
    }
}

/// Leaves `Submitting` if the submit future is dropped before the endpoint answers
struct InFlight<'a> {
    state: &'a Mutex<SubmissionState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if *state == SubmissionState::Submitting {
            tracing::warn!("Submission dropped before the endpoint replied");
            *state = SubmissionState::Failed {
                message: SUBMIT_CANCELLED_MESSAGE.to_string(),
            };
        }
    }
}
