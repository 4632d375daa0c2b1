use crate::cli::{field_values, form_values};
use crate::settings::Settings;
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use intake_client::{HttpFlightGateway, VisionExtractor};
use intake_core::{
    format_arrival_date, format_submitted_at, prepare_payload, AutofillFlow, AutofillReport,
    ConfidenceTier, FlightForm, FlightHistory, HistorySummary, IdentitySource, ImageUpload,
    StaticIdentity, SubmissionFlow, SubmissionOutcome, SystemClock, UserIdentity,
    ValidationContext,
};
use intake_store::JsonFileHistory;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

/// Exit code for a form that failed validation
const EXIT_INVALID: u8 = 2;

pub(crate) async fn submit(settings: &Settings, args: &ArgMatches) -> Result<ExitCode> {
    let gateway = HttpFlightGateway::from_config(&settings.config)?;
    let mut form = FlightForm::new();

    if let Some(path) = args.get_one::<std::path::PathBuf>("image") {
        let extractor = VisionExtractor::from_config(&settings.config)?;
        let report = AutofillFlow::new(Arc::new(extractor))
            .autofill(&mut form, read_image(path).await?)
            .await;
        eprintln!("{}", report.message());
    }
    for (field, value) in field_values(args) {
        form.set_value(field, value);
    }

    let flow = SubmissionFlow::new(
        Arc::new(gateway),
        history(settings),
        identity(settings),
        Arc::new(SystemClock),
    );

    match flow.submit(&mut form).await {
        SubmissionOutcome::Invalid { .. } => {
            print_errors(&form);
            Ok(ExitCode::from(EXIT_INVALID))
        }
        SubmissionOutcome::Accepted {
            payload, record, ..
        } => {
            if let Some(message) = flow.state().message() {
                println!("{message}");
            }
            println!(
                "{} {} arriving {} {}",
                payload.flight_number, payload.airline, payload.arrival_date, payload.arrival_time
            );
            if record.is_none() {
                eprintln!("Flight was not added to local history (no signed-in email)");
            }
            Ok(ExitCode::SUCCESS)
        }
        SubmissionOutcome::Rejected { message } => {
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
        SubmissionOutcome::Busy => Ok(ExitCode::FAILURE),
    }
}

pub(crate) fn check(args: &ArgMatches) -> Result<ExitCode> {
    let mut form = FlightForm::from_values(form_values(args), ValidationContext::local_today());
    form.mark_all_touched();

    if !form.is_valid() {
        print_errors(&form);
        return Ok(ExitCode::from(EXIT_INVALID));
    }

    let payload = prepare_payload(form.values());
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(ExitCode::SUCCESS)
}

pub(crate) async fn extract(settings: &Settings, args: &ArgMatches) -> Result<ExitCode> {
    let path = args
        .get_one::<std::path::PathBuf>("image")
        .context("image path is required")?;
    let extractor = VisionExtractor::from_config(&settings.config)?;

    let mut form = FlightForm::new();
    let report = AutofillFlow::new(Arc::new(extractor))
        .autofill(&mut form, read_image(path).await?)
        .await;

    println!("{}", render_report(&report, &form));
    Ok(if matches!(report, AutofillReport::Failed { .. }) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

pub(crate) async fn history_cmd(settings: &Settings, args: &ArgMatches) -> Result<ExitCode> {
    let Some(email) = identity(settings).current_user().and_then(|u| u.email) else {
        bail!("no signed-in email; pass --email or set identity.email");
    };

    let store = history(settings);
    let summary = HistorySummary::load(store.as_ref(), &email).await?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&summary.flights)?);
    } else {
        print!("{}", render_summary(&summary));
    }
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn show_config(settings: &Settings) -> Result<ExitCode> {
    match &settings.source {
        Some(path) => println!("# loaded from {}", path.display()),
        None => println!("# no config file; defaults and environment only"),
    }
    println!("# history directory: {}", settings.data_dir().display());
    print!("{}", settings.config.redacted().to_toml_string()?);
    Ok(ExitCode::SUCCESS)
}

fn history(settings: &Settings) -> Arc<dyn FlightHistory> {
    Arc::new(JsonFileHistory::in_dir(settings.data_dir()))
}

fn identity(settings: &Settings) -> Arc<dyn IdentitySource> {
    let identity = &settings.config.identity;
    match &identity.email {
        Some(email) => Arc::new(StaticIdentity::signed_in(UserIdentity {
            email: Some(email.clone()),
            display_name: identity.display_name.clone(),
        })),
        None => Arc::new(StaticIdentity::anonymous()),
    }
}

async fn read_image(path: &Path) -> Result<ImageUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading image {}", path.display()))?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(ImageUpload::new(name, bytes))
}

fn print_errors(form: &FlightForm) {
    for (field, message) in form.visible_errors() {
        eprintln!("{}: {}", field.label(), message);
    }
}

pub(crate) fn render_report(report: &AutofillReport, form: &FlightForm) -> String {
    let mut out = report.message();
    if let Some(confidence) = report.confidence() {
        let tier = match ConfidenceTier::from_confidence(confidence) {
            ConfidenceTier::High => "high",
            ConfidenceTier::Low => "low",
            ConfidenceTier::Rejected => "rejected",
        };
        out.push_str(&format!("\nConfidence: {confidence:.2} ({tier})"));
    }
    for field in report.filled_fields() {
        out.push_str(&format!("\n  {}: {}", field.label(), form.value(*field)));
        if let Some(error) = form.error_message(*field) {
            out.push_str(&format!("  ({error})"));
        }
    }
    out
}

pub(crate) fn render_summary(summary: &HistorySummary) -> String {
    if summary.is_empty() {
        return "No flights submitted yet.\n".to_string();
    }

    let mut out = format!(
        "{} flight(s), {} guest(s), {} airline(s)\n",
        summary.flights.len(),
        summary.total_guests,
        summary.unique_airlines
    );
    for record in &summary.flights {
        let flight = &record.flight;
        out.push_str(&format!(
            "{:<8} {:<20} {} {}  {} guest(s)  submitted {}\n",
            flight.flight_number,
            flight.airline,
            format_arrival_date(&flight.arrival_date),
            flight.arrival_time,
            flight.num_of_guests,
            format_submitted_at(&record.submitted_at)
        ));
        if let Some(comments) = &flight.comments {
            out.push_str(&format!("         {comments}\n"));
        }
    }
    out
}
