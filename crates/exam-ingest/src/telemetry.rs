//! Run log setup. Events go to stderr so that stdout stays free for the run summary.

use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Target of this crate's own events; `verbose` lowers it to `debug`, which shows each
/// discarded attempt and each receipt as it is collected.
const CRATE_TARGET: &str = "exam_ingest";

#[derive(Debug)]
pub enum TelemetryError {
    Filter { directives: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Filter { directives, .. } => write!(
                f,
                "log filter '{directives}' is not valid; check INGEST_LOG_LEVEL and RUST_LOG"
            ),
            TelemetryError::Subscriber(err) => write!(f, "could not install log subscriber: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Filter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Filter directives for a run: `base` as given, plus debug output for this crate when
/// `verbose` is set.
pub fn directives(base: &str, verbose: bool) -> String {
    let base = base.trim();
    match (base.is_empty(), verbose) {
        (true, true) => format!("{CRATE_TARGET}=debug"),
        (true, false) => "info".to_string(),
        (false, true) => format!("{base},{CRATE_TARGET}=debug"),
        (false, false) => base.to_string(),
    }
}

/// `RUST_LOG` replaces the configured level when set; `verbose` applies either way.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    let base = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.log_level.clone());
    let directives = directives(&base, config.verbose);

    EnvFilter::try_new(&directives).map_err(|source| TelemetryError::Filter { directives, source })
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_lowers_only_this_crate_to_debug() {
        assert_eq!(directives(" warn ", false), "warn");
        assert_eq!(directives("warn", true), "warn,exam_ingest=debug");
        assert_eq!(directives("", false), "info");
        assert_eq!(directives("", true), "exam_ingest=debug");
    }

    #[test]
    fn rejects_unparseable_level() {
        std::env::remove_var("RUST_LOG");
        let config = TelemetryConfig {
            log_level: "exam_ingest=loud".to_string(),
            verbose: true,
        };

        match env_filter(&config) {
            Err(TelemetryError::Filter { directives, .. }) => {
                assert_eq!(directives, "exam_ingest=loud,exam_ingest=debug")
            }
            other => panic!("expected filter error, got {other:?}"),
        }
    }
}
