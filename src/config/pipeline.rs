use super::traits::{invalid, ConfigSection};
use crate::error::SweetspotError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// One sub-directory of source frames per clip.
    pub input_dir: PathBuf,
    /// Where degraded frames are written for the scoring service to pick up.
    pub output_dir: PathBuf,
    pub temp_video_path: PathBuf,
    pub image_type: String,
    pub naming_scheme: String,
    pub image_compression_level: u32,
    pub framerate: u32,
    pub ffmpeg_binary: String,
    pub transcode_attempts: usize,
    pub retry_cooldown_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/Cityscapes-dataset/untouched_tiny"),
            output_dir: PathBuf::from("data/HRNet-mldata/cityscapes/leftImg8bit/val"),
            temp_video_path: PathBuf::from("/tmp/temp.mp4"),
            image_type: "png".to_string(),
            naming_scheme: "%06d".to_string(),
            image_compression_level: 1,
            framerate: 30,
            ffmpeg_binary: "ffmpeg".to_string(),
            transcode_attempts: 3,
            retry_cooldown_secs: 240,
        }
    }
}

impl PipelineConfig {
    pub fn retry_cooldown(&self) -> Duration {
        Duration::from_secs(self.retry_cooldown_secs)
    }
}

impl ConfigSection for PipelineConfig {
    fn section_name() -> &'static str {
        "pipeline"
    }

    fn validate(&self) -> Result<(), SweetspotError> {
        if self.transcode_attempts == 0 {
            return Err(invalid::<Self>("transcode_attempts must be at least 1"));
        }
        if self.input_dir == self.output_dir {
            return Err(invalid::<Self>("input_dir and output_dir must differ"));
        }
        if self.image_type.is_empty() {
            return Err(invalid::<Self>("image_type must not be empty"));
        }
        if self.framerate == 0 {
            return Err(invalid::<Self>("framerate must be positive"));
        }
        Ok(())
    }
}
