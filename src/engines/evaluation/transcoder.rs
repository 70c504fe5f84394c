use crate::config::PipelineConfig;
use crate::engines::encoding::EncoderArgs;
use crate::error::{Result, SweetspotError};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use walkdir::WalkDir;

/// Encode a clip's frames and decode them back with compression artifacts.
pub trait Transcoder {
    /// Returns the size in bytes of the compressed intermediate artifact.
    fn transcode(&mut self, input_dir: &Path, output_dir: &Path, args: &EncoderArgs) -> Result<u64>;
}

/// Drives the `ffmpeg` binary: frames -> temp video -> frames.
pub struct FfmpegTranscoder {
    config: PipelineConfig,
}

impl FfmpegTranscoder {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    fn frame_names(&self, dir: &Path) -> Result<Vec<String>> {
        let suffix = format!(".{}", self.config.image_type);
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.ends_with(&suffix) {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn base_command(&self) -> Command {
        let mut command = Command::new(&self.config.ffmpeg_binary);
        command.args(["-loglevel", "error", "-hide_banner", "-y"]);
        command
    }

    fn encode(&self, input_dir: &Path, args: &EncoderArgs) -> Result<()> {
        let pattern = input_dir.join(format!("*.{}", self.config.image_type));

        if args.two_pass {
            log::debug!("Applying two passes");
            let mut first = args.output_args.clone();
            first.insert("pass".to_string(), "1".to_string());
            self.run_encode(&pattern, &args.input_args, &first, Path::new(null_device()))?;
        }

        let mut output_args = args.output_args.clone();
        if args.two_pass {
            output_args.insert("pass".to_string(), "2".to_string());
        }
        self.run_encode(&pattern, &args.input_args, &output_args, &self.config.temp_video_path)
    }

    fn run_encode(
        &self,
        pattern: &Path,
        input_args: &BTreeMap<String, String>,
        output_args: &BTreeMap<String, String>,
        out_path: &Path,
    ) -> Result<()> {
        log::debug!("Img -> Vid {:?} {:?}", input_args, output_args);
        let mut command = self.base_command();
        command.args(option_pairs(input_args));
        command.arg("-i").arg(pattern);
        command.args(option_pairs(output_args));
        command.arg(out_path);
        run(command, "converting images to video")
    }

    fn decode(&self, output_dir: &Path) -> Result<()> {
        let naming = output_dir.join(format!(
            "{}.{}",
            self.config.naming_scheme, self.config.image_type
        ));
        log::debug!(
            "Vid -> Img {} (compression level {})",
            naming.display(),
            self.config.image_compression_level
        );

        let mut command = self.base_command();
        command.arg("-i").arg(&self.config.temp_video_path);
        command.args([
            "-compression_level".to_string(),
            self.config.image_compression_level.to_string(),
        ]);
        command.arg(naming);
        run(command, "converting video to images")
    }

    /// Give decoded frames the names of the source frames they replace.
    fn restore_names(&self, source_names: &[String], output_dir: &Path) -> Result<()> {
        let generated = self.frame_names(output_dir)?;
        if generated.len() != source_names.len() {
            log::warn!(
                "Frame count mismatch of {} frames: {}",
                generated.len() as i64 - source_names.len() as i64,
                output_dir.display()
            );
        }

        for (from, to) in generated.iter().zip(source_names) {
            std::fs::rename(output_dir.join(from), output_dir.join(to)).map_err(|e| {
                SweetspotError::Transcode(format!("Error while naming degraded image {}: {}", from, e))
            })?;
        }
        Ok(())
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&mut self, input_dir: &Path, output_dir: &Path, args: &EncoderArgs) -> Result<u64> {
        std::fs::create_dir_all(output_dir)?;
        let source_names = self.frame_names(input_dir)?;

        self.encode(input_dir, args)?;
        self.decode(output_dir)?;

        let video_size = std::fs::metadata(&self.config.temp_video_path)?.len();
        std::fs::remove_file(&self.config.temp_video_path)?;

        self.restore_names(&source_names, output_dir)?;
        Ok(video_size)
    }
}

fn option_pairs(options: &BTreeMap<String, String>) -> Vec<OsString> {
    options
        .iter()
        .flat_map(|(k, v)| [OsString::from(format!("-{}", flag_for(k))), OsString::from(v)])
        .collect()
}

/// ffmpeg spells the container option `-f`.
fn flag_for(option: &str) -> &str {
    match option {
        "format" => "f",
        other => other,
    }
}

fn run(mut command: Command, what: &str) -> Result<()> {
    let output = command
        .output()
        .map_err(|e| SweetspotError::Transcode(format!("ffmpeg could not start while {}: {}", what, e)))?;

    if !output.status.success() {
        return Err(SweetspotError::Transcode(format!(
            "ffmpeg failed while {} ({}): {}",
            what,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

fn null_device() -> &'static str {
    if cfg!(windows) {
        "NUL"
    } else {
        "/dev/null"
    }
}

/// Total size in bytes of every file below `dir`.
pub fn directory_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            total += entry.metadata().map_err(std::io::Error::from)?.len();
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_pairs_are_flag_value() {
        let mut options = BTreeMap::new();
        options.insert("b:v".to_string(), "5M".to_string());
        options.insert("c:v".to_string(), "libx264".to_string());
        options.insert("format".to_string(), "mp4".to_string());
        let pairs: Vec<String> = option_pairs(&options)
            .into_iter()
            .map(|s| s.to_string_lossy().to_string())
            .collect();
        assert_eq!(pairs, vec!["-b:v", "5M", "-c:v", "libx264", "-f", "mp4"]);
    }

    #[test]
    fn test_directory_size_is_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), [0u8; 10]).unwrap();
        std::fs::create_dir(dir.path().join("clip")).unwrap();
        std::fs::write(dir.path().join("clip").join("b.png"), [0u8; 5]).unwrap();
        assert_eq!(directory_size(dir.path()).unwrap(), 15);
    }
}
