pub mod traits;
pub mod search;
pub mod pipeline;
pub mod scoring;
pub mod encoders;
pub mod output;
pub mod manager;
pub mod run;

pub use manager::{ConfigManager, AppConfig};
pub use search::{SearchConfig, Nsga2Settings};
pub use pipeline::PipelineConfig;
pub use scoring::ScoringConfig;
pub use encoders::{EncodersConfig, EncoderTarget, RateControlParameters};
pub use output::{OutputConfig, LoggingConfig, ResumeConfig};
pub use run::RunConfig;
pub use traits::ConfigSection;
