use super::{
    encoders::EncodersConfig,
    output::{LoggingConfig, OutputConfig, ResumeConfig},
    pipeline::PipelineConfig,
    scoring::ScoringConfig,
    search::SearchConfig,
    traits::ConfigSection,
};
use crate::error::SweetspotError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub pipeline: PipelineConfig,
    pub scoring: ScoringConfig,
    pub encoders: EncodersConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub resume: Option<ResumeConfig>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), SweetspotError> {
        self.search.validate()?;
        self.pipeline.validate()?;
        self.scoring.validate()?;
        self.encoders.validate()?;
        self.output.validate()?;
        self.logging.validate()?;
        if let Some(resume) = &self.resume {
            resume.validate()?;
        }
        Ok(())
    }
}

/// Loads the application configuration once; the result is never mutated afterwards.
pub struct ConfigManager {
    config: AppConfig,
}

impl ConfigManager {
    pub const ENV_PREFIX: &'static str = "SWEETSPOT";

    pub fn new(config: AppConfig) -> Result<Self, SweetspotError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Read a TOML file layered with `SWEETSPOT__SECTION__KEY` environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SweetspotError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SweetspotError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(Self::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| SweetspotError::Configuration(format!("Failed to parse config: {}", e)))?;

        Self::new(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SweetspotError> {
        let toml_str = toml::to_string_pretty(&self.config)
            .map_err(|e| SweetspotError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| SweetspotError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> &AppConfig {
        &self.config
    }

    pub fn into_inner(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweetspot.toml");

        let mut config = AppConfig::default();
        config.search.population_size = 8;
        config.search.epochs = 2;
        ConfigManager::new(config).unwrap().save_to_file(&path).unwrap();

        let loaded = ConfigManager::load_from_file(&path).unwrap().into_inner();
        assert_eq!(loaded.search.population_size, 8);
        assert_eq!(loaded.search.epochs, 2);
        assert_eq!(loaded.scoring.measure, "mean_IoU");
    }

    #[test]
    fn test_invalid_population_rejected() {
        let mut config = AppConfig::default();
        config.search.population_size = 7;
        assert!(matches!(
            ConfigManager::new(config),
            Err(SweetspotError::Configuration(_))
        ));
    }
}
