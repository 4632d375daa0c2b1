//! Config discovery, layering and log setup

use anyhow::{Context, Result};
use clap::ArgMatches;
use intake_core::IntakeConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const APP_DIR: &str = "flight-intake";
const CONFIG_FILE: &str = "config.toml";

/// Default config file location
pub(crate) fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Effective configuration and where it came from
#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) config: IntakeConfig,
    pub(crate) source: Option<PathBuf>,
}

impl Settings {
    /// defaults → file → environment → flags
    pub(crate) fn resolve(matches: &ArgMatches) -> Result<Self> {
        let explicit = matches.get_one::<PathBuf>("config").cloned();
        let (config, source) = load_file(explicit, default_config_path())?;

        let mut config = config.apply_env();
        if let Some(email) = matches.get_one::<String>("email") {
            config = config.with_email(email.clone());
        }
        Ok(Self { config, source })
    }

    /// Directory holding the history file
    pub(crate) fn data_dir(&self) -> PathBuf {
        resolve_data_dir(&self.config, dirs::data_dir())
    }
}

/// Load the explicit file, or the default one when it exists
pub(crate) fn load_file(
    explicit: Option<PathBuf>,
    default: Option<PathBuf>,
) -> Result<(IntakeConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let config = IntakeConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?;
        return Ok((config, Some(path)));
    }

    match default.filter(|path| path.is_file()) {
        Some(path) => {
            let config = IntakeConfig::load(&path)
                .with_context(|| format!("loading config {}", path.display()))?;
            Ok((config, Some(path)))
        }
        None => Ok((IntakeConfig::default(), None)),
    }
}

pub(crate) fn resolve_data_dir(config: &IntakeConfig, platform: Option<PathBuf>) -> PathBuf {
    config
        .storage
        .data_dir
        .clone()
        .or_else(|| platform.map(|dir| dir.join(APP_DIR)))
        .unwrap_or_else(|| Path::new(".").join(APP_DIR))
}

/// Install the global subscriber; `RUST_LOG` wins over `--verbose`
pub(crate) fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose {
        "debug,hyper=info,hyper_util=info,rustls=info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_default_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, source) =
            load_file(None, Some(dir.path().join("config.toml"))).unwrap();
        assert_eq!(config, IntakeConfig::default());
        assert!(source.is_none());
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file(Some(dir.path().join("nope.toml")), None).is_err());
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.toml");
        std::fs::write(&path, "[identity]\nemail = \"crew@example.com\"\n").unwrap();

        let (config, source) = load_file(Some(path.clone()), None).unwrap();
        assert_eq!(config.identity.email.as_deref(), Some("crew@example.com"));
        assert_eq!(source, Some(path));
    }

    #[test]
    fn data_dir_precedence() {
        let platform = Some(PathBuf::from("/data"));
        assert_eq!(
            resolve_data_dir(&IntakeConfig::default(), platform.clone()),
            PathBuf::from("/data/flight-intake")
        );
        assert_eq!(
            resolve_data_dir(&IntakeConfig::default().with_data_dir("/custom"), platform),
            PathBuf::from("/custom")
        );
        assert_eq!(
            resolve_data_dir(&IntakeConfig::default(), None),
            PathBuf::from("./flight-intake")
        );
    }
}
