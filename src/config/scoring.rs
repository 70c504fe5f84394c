use super::traits::{invalid, ConfigSection};
use crate::error::SweetspotError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub request_address: String,
    /// Field of the response body used as the scalar score.
    pub measure: String,
    pub timeout_secs: u64,
    /// Score of the untouched dataset, logged for comparison.
    pub baseline: Option<f64>,
    pub eval_list: Option<Vec<String>>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            request_address: "http://localhost:5001/eval".to_string(),
            measure: "mean_IoU".to_string(),
            timeout_secs: 120 * 60,
            baseline: None,
            eval_list: None,
        }
    }
}

impl ScoringConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ConfigSection for ScoringConfig {
    fn section_name() -> &'static str {
        "scoring"
    }

    fn validate(&self) -> Result<(), SweetspotError> {
        if !self.request_address.starts_with("http://") && !self.request_address.starts_with("https://") {
            return Err(invalid::<Self>(format!(
                "request_address must be an http(s) URL, got '{}'",
                self.request_address
            )));
        }
        if self.measure.is_empty() {
            return Err(invalid::<Self>("measure must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid::<Self>("timeout_secs must be positive"));
        }
        Ok(())
    }
}
