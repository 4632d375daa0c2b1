//! flight-intake - capture and submit flight arrival details
//!
//! Exit codes: 0 success, 1 failure, 2 invalid form.

mod cli;
mod commands;
mod settings;

use settings::Settings;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli::command().get_matches();
    settings::init_tracing(matches.get_flag("verbose"), matches.get_flag("log-json"));

    match run(&matches).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(matches: &clap::ArgMatches) -> anyhow::Result<ExitCode> {
    let settings = Settings::resolve(matches)?;

    match matches.subcommand() {
        Some(("submit", args)) => commands::submit(&settings, args).await,
        Some(("check", args)) => commands::check(args),
        Some(("extract", args)) => commands::extract(&settings, args).await,
        Some(("history", args)) => commands::history_cmd(&settings, args).await,
        Some(("config", _)) => commands::show_config(&settings),
        _ => Ok(ExitCode::FAILURE),
    }
}
