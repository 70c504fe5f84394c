use super::traits::{invalid, ConfigSection};
use crate::error::SweetspotError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub base_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("output"),
        }
    }
}

impl OutputConfig {
    pub fn results_dir(&self) -> PathBuf {
        self.base_dir.join("results")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }
}

impl ConfigSection for OutputConfig {
    fn section_name() -> &'static str {
        "output"
    }

    fn validate(&self) -> Result<(), SweetspotError> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(invalid::<Self>("base_dir must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `env_logger` filter; `RUST_LOG` takes precedence.
    pub level: String,
    /// Also write a per-session log file under `<output.base_dir>/logs`.
    pub file: bool,
    /// Filter of the session log file.
    pub file_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: true,
            file_level: "debug".to_string(),
        }
    }
}

impl ConfigSection for LoggingConfig {
    fn section_name() -> &'static str {
        "logging"
    }

    fn validate(&self) -> Result<(), SweetspotError> {
        for level in [&self.level, &self.file_level] {
            match level.to_ascii_lowercase().as_str() {
                "error" | "warn" | "info" | "debug" | "trace" | "off" => {}
                other => return Err(invalid::<Self>(format!("unknown log level '{}'", other))),
            }
        }
        Ok(())
    }
}

/// Coordinates of an interrupted run to pick up again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeConfig {
    pub checkpoint: PathBuf,
    pub encoder: String,
    pub rate_control: String,
    pub algorithm: String,
    pub epoch: usize,
    pub generations_done: usize,
}

impl ConfigSection for ResumeConfig {
    fn section_name() -> &'static str {
        "resume"
    }

    fn validate(&self) -> Result<(), SweetspotError> {
        if self.checkpoint.as_os_str().is_empty() {
            return Err(invalid::<Self>("checkpoint path is required"));
        }
        if self.epoch == 0 {
            return Err(invalid::<Self>("epochs are numbered from 1"));
        }
        Ok(())
    }
}
