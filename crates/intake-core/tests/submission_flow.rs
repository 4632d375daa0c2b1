//! End-to-end submission flow with real stores and scripted gateways

use intake_core::submission::SUBMIT_CANCELLED_MESSAGE;
use intake_core::{
    FieldName, FlightHistory, HistorySummary, SubmissionOutcome, SubmissionState, SubmitError,
};
use intake_store::JsonFileHistory;
use intake_test_utils::{
    flow_with, form_with, test_today, valid_form, GatedGateway, InMemoryHistory, ScriptedGateway,
    TEST_EMAIL,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn accepted_submission_is_normalised_and_recorded() {
    let gateway = Arc::new(ScriptedGateway::accepting());
    let history = Arc::new(InMemoryHistory::new());
    let flow = flow_with(gateway.clone(), history.clone());

    let mut form = form_with(test_today(), FieldName::FlightNumber, "dl404");
    let outcome = flow.submit(&mut form).await;

    let (payload, record) = match outcome {
        SubmissionOutcome::Accepted {
            payload, record, ..
        } => (payload, record),
        other => panic!("expected acceptance, got {other:?}"),
    };
    assert_eq!(payload.flight_number, "DL404");
    assert_eq!(payload.arrival_time, "02:30 PM");
    assert_eq!(payload.arrival_date, "2030-06-20");
    assert_eq!(payload.num_of_guests, 2);
    assert_eq!(payload.comments.as_deref(), Some("Vegetarian meal"));

    let record = record.expect("history record");
    assert_eq!(record.owner_email, TEST_EMAIL);
    assert_eq!(record.flight, payload);
    assert_eq!(history.snapshot(), vec![record]);

    assert_eq!(gateway.payloads(), vec![payload]);
    assert_eq!(form.value(FieldName::Airline), "");
    assert!(matches!(flow.state(), SubmissionState::Success { .. }));
}

#[tokio::test]
async fn invalid_form_makes_no_request() {
    let gateway = Arc::new(ScriptedGateway::accepting());
    let history = Arc::new(InMemoryHistory::new());
    let flow = flow_with(gateway.clone(), history.clone());

    let mut form = form_with(test_today(), FieldName::ArrivalDate, "2030-06-14");
    let outcome = flow.submit(&mut form).await;

    assert_eq!(
        outcome,
        SubmissionOutcome::Invalid {
            fields: vec![FieldName::ArrivalDate]
        }
    );
    assert_eq!(gateway.calls(), 0);
    assert!(history.is_empty());
    assert_eq!(
        form.visible_errors(),
        vec![(
            FieldName::ArrivalDate,
            "Arrival date cannot be in the past".to_string()
        )]
    );
}

#[tokio::test]
async fn rejected_submission_keeps_values_and_allows_retry() {
    let gateway = Arc::new(ScriptedGateway::with_results([
        Err(SubmitError::Transport("connection reset".to_string())),
        Ok(Default::default()),
    ]));
    let history = Arc::new(InMemoryHistory::new());
    let flow = flow_with(gateway.clone(), history.clone());

    let mut form = valid_form(test_today());
    let first = flow.submit(&mut form).await;
    assert_eq!(
        first,
        SubmissionOutcome::Rejected {
            message: "Failed to submit flight information. Please try again.".to_string()
        }
    );
    assert_eq!(form.value(FieldName::FlightNumber), "DL404");
    assert!(history.is_empty());

    let second = flow.submit(&mut form).await;
    assert!(second.is_accepted());
    assert_eq!(gateway.calls(), 2);
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn server_message_is_surfaced() {
    let gateway = Arc::new(ScriptedGateway::rejecting(409, Some("Flight already registered")));
    let flow = flow_with(gateway, Arc::new(InMemoryHistory::new()));

    let outcome = flow.submit(&mut valid_form(test_today())).await;
    assert_eq!(
        outcome,
        SubmissionOutcome::Rejected {
            message: "Flight already registered".to_string()
        }
    );
    assert_eq!(flow.state().message(), Some("Flight already registered"));
}

#[tokio::test]
async fn second_submit_while_in_flight_is_ignored() {
    let gateway = Arc::new(GatedGateway::new());
    let flow = flow_with(gateway.clone(), Arc::new(InMemoryHistory::new()));

    let mut first_form = valid_form(test_today());
    let mut second_form = valid_form(test_today());

    let (first, second) = tokio::join!(flow.submit(&mut first_form), async {
        gateway.wait_entered().await;
        assert!(flow.is_submitting());
        let outcome = flow.submit(&mut second_form).await;
        gateway.release();
        outcome
    });

    assert!(first.is_accepted());
    assert_eq!(second, SubmissionOutcome::Busy);
    assert_eq!(gateway.calls(), 1);
    assert_eq!(second_form.value(FieldName::FlightNumber), "DL404");
}

#[tokio::test]
async fn dropped_submit_does_not_leave_flow_busy() {
    let gateway = Arc::new(GatedGateway::new());
    let history = Arc::new(InMemoryHistory::new());
    let flow = flow_with(gateway.clone(), history.clone());
    let mut form = valid_form(test_today());

    {
        let submit = flow.submit(&mut form);
        tokio::pin!(submit);
        tokio::select! {
            _ = &mut submit => panic!("gateway never released"),
            () = gateway.wait_entered() => {}
        }
        assert!(flow.is_submitting());
    }

    assert_eq!(
        flow.state(),
        SubmissionState::Failed {
            message: SUBMIT_CANCELLED_MESSAGE.to_string()
        }
    );
    assert!(history.is_empty());
    assert_eq!(form.value(FieldName::FlightNumber), "DL404");

    // the permit is consumed by the next attempt, which is no longer busy
    gateway.release();
    assert!(flow.submit(&mut form).await.is_accepted());
    assert_eq!(gateway.calls(), 2);
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn history_persists_across_store_handles() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(ScriptedGateway::accepting());

    let flow = flow_with(gateway, Arc::new(JsonFileHistory::in_dir(dir.path())));
    assert!(flow.submit(&mut valid_form(test_today())).await.is_accepted());
    assert!(flow.submit(&mut valid_form(test_today())).await.is_accepted());

    let reopened = JsonFileHistory::in_dir(dir.path());
    assert_eq!(reopened.all().await.unwrap().len(), 2);

    let summary = HistorySummary::load(&reopened, TEST_EMAIL).await.unwrap();
    assert_eq!(summary.total_guests, 4);
    assert_eq!(summary.unique_airlines, 1);

    let other = HistorySummary::load(&reopened, "someone@else.com").await.unwrap();
    assert!(other.is_empty());
}
