use crate::config::{LoggingConfig, OutputConfig};
use crate::error::{Result, SweetspotError};
use log::{Log, Metadata, Record};
use std::fs::File;
use std::path::PathBuf;

/// Console logger plus an optional per-session file logger with its own filter.
pub struct SessionLogger {
    console: env_logger::Logger,
    file: Option<env_logger::Logger>,
}

impl SessionLogger {
    /// Console filter from `RUST_LOG`, falling back to `logging.level`.
    /// When `logging.file` is set, everything at `logging.file_level` also goes to
    /// `<output.base_dir>/logs/<session>.log`.
    pub fn build(logging: &LoggingConfig, output: &OutputConfig, session: &str) -> Result<(Self, Option<PathBuf>)> {
        let console = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(logging.level.as_str()),
        )
        .build();

        if !logging.file {
            return Ok((Self { console, file: None }, None));
        }

        let path = output.logs_dir().join(format!("{}.log", session));
        std::fs::create_dir_all(output.logs_dir())?;
        let sink = File::create(&path)?;
        let file = env_logger::Builder::new()
            .parse_filters(&logging.file_level)
            .write_style(env_logger::WriteStyle::Never)
            .target(env_logger::Target::Pipe(Box::new(sink)))
            .build();

        Ok((
            Self {
                console,
                file: Some(file),
            },
            Some(path),
        ))
    }

    /// Install as the global logger.
    pub fn install(self) -> Result<()> {
        let max = match &self.file {
            Some(file) => self.console.filter().max(file.filter()),
            None => self.console.filter(),
        };
        log::set_boxed_logger(Box::new(self))
            .map_err(|e| SweetspotError::Configuration(format!("Logger already installed: {}", e)))?;
        log::set_max_level(max);
        Ok(())
    }
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.console.enabled(metadata) || self.file.as_ref().is_some_and(|f| f.enabled(metadata))
    }

    fn log(&self, record: &Record<'_>) {
        self.console.log(record);
        if let Some(file) = &self.file {
            file.log(record);
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(file) = &self.file {
            file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn configs(file: bool, base_dir: &std::path::Path) -> (LoggingConfig, OutputConfig) {
        let logging = LoggingConfig {
            level: "error".to_string(),
            file,
            file_level: "debug".to_string(),
        };
        let output = OutputConfig {
            base_dir: base_dir.to_path_buf(),
        };
        (logging, output)
    }

    #[test]
    fn test_session_file_receives_debug_records() {
        let dir = tempfile::tempdir().unwrap();
        let (logging, output) = configs(true, dir.path());
        let (logger, path) = SessionLogger::build(&logging, &output, "2026-01-01_00-00-00").unwrap();
        let path = path.unwrap();
        assert_eq!(path, dir.path().join("logs").join("2026-01-01_00-00-00.log"));

        logger.log(
            &Record::builder()
                .args(format_args!("Decision vector: [0.75000 10.00000]"))
                .level(Level::Debug)
                .target("sweetspot::engines")
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("per-pixel detail"))
                .level(Level::Trace)
                .target("sweetspot::engines")
                .build(),
        );
        logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Decision vector: [0.75000 10.00000]"));
        assert!(!contents.contains("per-pixel detail"));
    }

    #[test]
    fn test_file_logging_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let (logging, output) = configs(false, dir.path());
        let (_, path) = SessionLogger::build(&logging, &output, "session").unwrap();
        assert!(path.is_none());
        assert!(!dir.path().join("logs").exists());
    }
}
