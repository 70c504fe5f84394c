use crate::config::ScoringConfig;
use crate::error::{Result, SweetspotError};
use crate::types::RawMetrics;

/// Outcome of one scoring request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    pub score: f64,
    pub metrics: RawMetrics,
}

/// The ML service that scores the degraded evaluation set.
pub trait ScoringService {
    fn score(&mut self) -> Result<ScoreReport>;
}

/// Blocking HTTP client for the scoring service's `/eval` endpoint.
pub struct HttpScoringService {
    client: reqwest::blocking::Client,
    config: ScoringConfig,
}

impl HttpScoringService {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SweetspotError::ScoringService(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

impl ScoringService for HttpScoringService {
    fn score(&mut self) -> Result<ScoreReport> {
        log::info!("Requesting evaluation from ML-algorithm...");

        let mut request = self.client.get(&self.config.request_address);
        if let Some(eval_list) = &self.config.eval_list {
            request = request.query(&[("eval_list", eval_list.join(","))]);
        }

        let response = request.send().map_err(|e| {
            SweetspotError::ScoringService(format!(
                "Error encountered while communicating with the ML-algorithm: {}",
                e
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SweetspotError::ScoringService(format!(
                "ML-algorithm responded with {}",
                status
            )));
        }

        let body: serde_json::Value = response.json().map_err(|e| {
            SweetspotError::ScoringService(format!("Unreadable ML-algorithm response: {}", e))
        })?;

        parse_report(&body, &self.config.measure)
    }
}

/// Pull the configured measure out of a response body; numeric top-level
/// fields become raw metrics.
pub fn parse_report(body: &serde_json::Value, measure: &str) -> Result<ScoreReport> {
    let fields = body.as_object().ok_or_else(|| {
        SweetspotError::ScoringService(format!("Expected a JSON object, got {}", body))
    })?;

    let score = fields
        .get(measure)
        .and_then(as_number)
        .ok_or_else(|| {
            SweetspotError::ScoringService(format!("Response has no numeric '{}' field", measure))
        })?;

    let metrics: RawMetrics = fields
        .iter()
        .filter_map(|(name, value)| as_number(value).map(|v| (name.clone(), v)))
        .collect();

    Ok(ScoreReport { score, metrics })
}

fn as_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_report_extracts_measure() {
        let body = json!({"mean_IoU": 0.81, "pixel_acc": "0.95", "per_class": [0.1, 0.2]});
        let report = parse_report(&body, "mean_IoU").unwrap();
        assert_eq!(report.score, 0.81);
        assert_eq!(report.metrics.len(), 2);
        assert_eq!(report.metrics["pixel_acc"], 0.95);
    }

    #[test]
    fn test_missing_measure_is_fatal() {
        let body = json!({"mean_iu": 0.81});
        assert!(matches!(
            parse_report(&body, "mean_IoU"),
            Err(SweetspotError::ScoringService(_))
        ));
    }
}
