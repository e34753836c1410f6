use crate::workflows::ingest::Deadline;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Process-level settings read from the environment (and an optional `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        let log_level = env::var("INGEST_LOG_LEVEL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "info".to_string());

        Self {
            telemetry: TelemetryConfig {
                log_level,
                verbose: false,
            },
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Set from the command line; adds debug output for the ingest itself.
    pub verbose: bool,
}

/// Everything a single ingest run needs. Passed explicitly into the collector,
/// the selection engine and the pipeline.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub course_code: String,
    pub roster_path: PathBuf,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub deadline: Deadline,
}

impl IngestConfig {
    /// Validate the input locations and create the output directory if needed.
    ///
    /// Runs before anything in the source directory is touched, so a failure here
    /// never leaves a half-processed export behind.
    pub fn prepare(&self) -> Result<(), ConfigError> {
        if !self.roster_path.is_file() {
            return Err(ConfigError::MissingRoster {
                path: self.roster_path.clone(),
            });
        }

        if !self.source_dir.exists() {
            return Err(ConfigError::MissingSourceDir {
                path: self.source_dir.clone(),
            });
        }
        if !self.source_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.source_dir.clone(),
            });
        }

        std::fs::create_dir_all(&self.output_dir).map_err(|source| ConfigError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;
        if !self.output_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.output_dir.clone(),
            });
        }

        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingRoster {
        path: PathBuf,
    },
    MissingSourceDir {
        path: PathBuf,
    },
    NotADirectory {
        path: PathBuf,
    },
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRoster { path } => {
                write!(f, "class list {} does not exist", path.display())
            }
            ConfigError::MissingSourceDir { path } => {
                write!(f, "learn folder {} does not exist", path.display())
            }
            ConfigError::NotADirectory { path } => {
                write!(f, "{} is not a directory", path.display())
            }
            ConfigError::OutputDir { path, .. } => {
                write!(f, "could not create output folder {}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::OutputDir { source, .. } => Some(source),
            _ => None,
        }
    }
}
