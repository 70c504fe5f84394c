use super::traits::{invalid, ConfigSection};
use crate::error::SweetspotError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodersConfig {
    /// Directory holding one `<encoder>-parameters.json` file per encoder.
    pub parameter_dir: PathBuf,
    pub targets: Vec<EncoderTarget>,
}

/// An encoder and the rate-control modes to search it under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderTarget {
    pub encoder: String,
    pub rate_controls: Vec<String>,
}

impl Default for EncodersConfig {
    fn default() -> Self {
        Self {
            parameter_dir: PathBuf::from("config/encoding_parameters"),
            targets: vec![EncoderTarget {
                encoder: "libx264".to_string(),
                rate_controls: vec!["ABR".to_string()],
            }],
        }
    }
}

impl EncodersConfig {
    pub fn parameter_file(&self, encoder: &str) -> PathBuf {
        self.parameter_dir.join(format!("{}-parameters.json", encoder))
    }

    /// Load the gene bounds, value tables and constants for one
    /// (encoder, rate-control) pair.
    pub fn load_parameters(
        &self,
        encoder: &str,
        rate_control: &str,
    ) -> Result<RateControlParameters, SweetspotError> {
        RateControlParameters::load(&self.parameter_file(encoder), rate_control)
    }
}

impl ConfigSection for EncodersConfig {
    fn section_name() -> &'static str {
        "encoders"
    }

    fn validate(&self) -> Result<(), SweetspotError> {
        if self.targets.is_empty() {
            return Err(invalid::<Self>("at least one encoder target is required"));
        }
        for target in &self.targets {
            if target.rate_controls.is_empty() {
                return Err(invalid::<Self>(format!(
                    "encoder '{}' has no rate controls",
                    target.encoder
                )));
            }
        }
        Ok(())
    }
}

/// Contents of one rate-control block of an encoder parameter file.
///
/// `bounds` keeps the file's key order; each entry is `[low, high, type]` where the
/// type code is `f` (continuous), `i` (integer) or `c` (categorical).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateControlParameters {
    pub bounds: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub categorical: BTreeMap<String, Vec<serde_json::Value>>,
    #[serde(default)]
    pub constants: BTreeMap<String, serde_json::Value>,
}

impl RateControlParameters {
    pub fn load(path: &Path, rate_control: &str) -> Result<Self, SweetspotError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SweetspotError::Configuration(format!(
                "Failed to read encoder parameters {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&contents, rate_control).map_err(|e| match e {
            SweetspotError::Configuration(msg) => {
                SweetspotError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn parse(contents: &str, rate_control: &str) -> Result<Self, SweetspotError> {
        let mut document: serde_json::Value = serde_json::from_str(contents)
            .map_err(|e| SweetspotError::Configuration(format!("Faulty JSON: {}", e)))?;

        let block = document
            .get_mut(rate_control)
            .map(serde_json::Value::take)
            .ok_or_else(|| {
                SweetspotError::Configuration(format!("No parameters for rate control '{}'", rate_control))
            })?;

        serde_json::from_value(block).map_err(|e| {
            SweetspotError::Configuration(format!("Faulty '{}' parameter block: {}", rate_control, e))
        })
    }

    /// Constants rendered as encoder argument strings.
    pub fn constant_args(&self) -> BTreeMap<String, String> {
        self.constants
            .iter()
            .map(|(k, v)| (k.clone(), json_to_arg(v)))
            .collect()
    }
}

pub(crate) fn json_to_arg(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: &str = r#"{
        "ABR": {
            "bounds": {"b:v": [1, 50, "i"], "preset": [0, 2, "c"]},
            "categorical": {"preset": ["slow", "medium", "fast"]},
            "constants": {"pix_fmt": "yuv420p", "g": 30}
        }
    }"#;

    #[test]
    fn test_parse_rate_control_block() {
        let params = RateControlParameters::parse(PARAMS, "ABR").unwrap();
        let keys: Vec<_> = params.bounds.keys().cloned().collect();
        assert_eq!(keys, vec!["b:v".to_string(), "preset".to_string()]);
        assert_eq!(params.categorical["preset"].len(), 3);
        assert_eq!(params.constant_args()["g"], "30");
    }

    #[test]
    fn test_missing_rate_control_is_config_error() {
        let err = RateControlParameters::parse(PARAMS, "CBR").unwrap_err();
        assert!(matches!(err, SweetspotError::Configuration(_)));
    }
}
