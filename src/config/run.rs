use super::{
    manager::AppConfig, pipeline::PipelineConfig, scoring::ScoringConfig, search::SearchConfig,
};
use crate::engines::encoding::{EncoderFamily, EncoderRegistry};
use crate::engines::genes::GeneSpace;
use crate::error::Result;
use std::collections::BTreeMap;

/// Everything one (encoder, rate-control) search needs, fixed at construction.
///
/// Switching encoder means building a new `RunConfig` (and a new evaluation cache),
/// never editing this one.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub encoder: String,
    pub rate_control: String,
    pub family: EncoderFamily,
    pub gene_space: GeneSpace,
    pub constants: BTreeMap<String, String>,
    pub search: SearchConfig,
    pub pipeline: PipelineConfig,
    pub scoring: ScoringConfig,
}

impl RunConfig {
    pub fn build(app: &AppConfig, encoder: &str, rate_control: &str) -> Result<Self> {
        let family = EncoderRegistry::default().family_for(encoder)?;
        let parameters = app.encoders.load_parameters(encoder, rate_control)?;
        let gene_space = GeneSpace::build(&parameters)?;

        log::info!(
            "Run config for {} / {}: {} genes ({} continuous)",
            encoder,
            rate_control,
            gene_space.len(),
            gene_space.continuous_count()
        );

        Ok(Self {
            encoder: encoder.to_string(),
            rate_control: rate_control.to_string(),
            family,
            gene_space,
            constants: parameters.constant_args(),
            search: app.search.clone(),
            pipeline: app.pipeline.clone(),
            scoring: app.scoring.clone(),
        })
    }

    /// Directory-safe `<encoder>_<rate_control>` label.
    pub fn label(&self) -> String {
        format!("{}_{}", self.encoder, self.rate_control)
    }
}
