use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use intake_core::{FieldName, FlightFormValues};
use std::path::PathBuf;

/// Flag name for each form field
const FIELD_FLAGS: [(FieldName, &str, &str); FieldName::COUNT] = [
    (FieldName::Airline, "airline", "Airline name"),
    (FieldName::ArrivalDate, "date", "Arrival date (YYYY-MM-DD)"),
    (FieldName::ArrivalTime, "time", "Arrival time (HH:MM or HH:MM AM/PM)"),
    (FieldName::FlightNumber, "flight", "Flight number (e.g. AA123)"),
    (FieldName::NumOfGuests, "guests", "Number of guests"),
    (FieldName::Comments, "comments", "Free-text comments"),
];

pub(crate) fn command() -> Command {
    Command::new("flight-intake")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Capture and submit flight arrival details")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: <config dir>/flight-intake/config.toml)"),
        )
        .arg(
            Arg::new("email")
                .long("email")
                .global(true)
                .help("Signed-in user email, used for history"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            field_args(Command::new("submit").about("Validate and submit a flight")).arg(
                Arg::new("image")
                    .long("image")
                    .value_parser(value_parser!(PathBuf))
                    .help("Boarding pass image to prefill from; explicit flags win"),
            ),
        )
        .subcommand(field_args(
            Command::new("check").about("Validate fields and show the payload without sending"),
        ))
        .subcommand(
            Command::new("extract")
                .about("Read flight details from a boarding pass image")
                .arg(
                    Arg::new("image")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Image file"),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("List flights submitted by the signed-in user")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("config").about("Show the effective configuration"))
}

fn field_args(command: Command) -> Command {
    FIELD_FLAGS.iter().fold(command, |command, (_, flag, help)| {
        command.arg(Arg::new(*flag).long(*flag).help(*help))
    })
}

/// Field values given on the command line; absent flags stay `None`
pub(crate) fn field_values(args: &ArgMatches) -> Vec<(FieldName, String)> {
    FIELD_FLAGS
        .iter()
        .filter_map(|(field, flag, _)| {
            args.get_one::<String>(flag)
                .map(|value| (*field, value.clone()))
        })
        .collect()
}

/// Form values built only from flags
pub(crate) fn form_values(args: &ArgMatches) -> FlightFormValues {
    let mut values = FlightFormValues::default();
    for (field, value) in field_values(args) {
        *values.get_mut(field) = value;
    }
    values
}
