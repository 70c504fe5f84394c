use super::registry::EncoderFamily;
use crate::config::RunConfig;
use crate::engines::genes::GeneKind;
use crate::error::Result;
use std::collections::BTreeMap;

/// Genes expressed in Mbit/s.
const BITRATE_GENES: [&str; 4] = ["b:v", "maxrate", "minrate", "bufsize"];

/// Categorical value meaning "leave the option unset".
const UNSET_VALUE: &str = "none";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncoderArgs {
    pub input_args: BTreeMap<String, String>,
    pub output_args: BTreeMap<String, String>,
    pub two_pass: bool,
}

/// Map a decision vector onto ffmpeg input/output options for the run's encoder.
pub fn build_args(run: &RunConfig, x: &[f64]) -> Result<EncoderArgs> {
    let x = run.gene_space.canonicalize(x)?;

    let mut args = EncoderArgs {
        two_pass: run.family.is_two_pass(),
        ..Default::default()
    };

    args.input_args.insert("pattern_type".to_string(), "glob".to_string());
    args.input_args
        .insert("framerate".to_string(), run.pipeline.framerate.to_string());

    args.output_args.insert("c:v".to_string(), run.encoder.clone());
    args.output_args.insert("format".to_string(), "mp4".to_string());
    args.output_args.insert("pix_fmt".to_string(), "yuv420p".to_string());
    args.output_args
        .extend(run.constants.iter().map(|(k, v)| (k.clone(), v.clone())));

    for (gene, &raw) in run.gene_space.genes().iter().zip(&x) {
        let value = gene.value_of(raw);
        if gene.kind == GeneKind::Categorical && value == UNSET_VALUE {
            continue;
        }
        let value = if BITRATE_GENES.contains(&gene.name.as_str()) {
            format!("{}M", value)
        } else {
            value
        };
        args.output_args.insert(gene.name.clone(), value);
    }

    apply_rate_control(&run.rate_control, &mut args);
    apply_family(run.family, &mut args);

    Ok(args)
}

fn apply_rate_control(rate_control: &str, args: &mut EncoderArgs) {
    match rate_control {
        "CBR" => {
            if let Some(bitrate) = args.output_args.get("b:v").cloned() {
                args.output_args.insert("maxrate".to_string(), bitrate.clone());
                args.output_args.insert("minrate".to_string(), bitrate);
            }
        }
        "CQP" => {
            args.output_args.remove("b:v");
        }
        _ => {}
    }
}

fn apply_family(family: EncoderFamily, args: &mut EncoderArgs) {
    if family.uses_hwaccel() {
        args.input_args.insert("hwaccel".to_string(), "vaapi".to_string());
        args.input_args
            .insert("hwaccel_output_format".to_string(), "vaapi".to_string());
        args.input_args
            .insert("hwaccel_device".to_string(), "/dev/dri/renderD128".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, RateControlParameters};
    use crate::engines::encoding::EncoderRegistry;
    use crate::engines::genes::GeneSpace;

    fn run(encoder: &str, rate_control: &str) -> RunConfig {
        let params = RateControlParameters::parse(
            &format!(
                r#"{{"{}": {{
                    "bounds": {{"b:v": [1, 50, "i"], "preset": [0, 2, "c"], "tune": [0, 1, "c"]}},
                    "categorical": {{"preset": ["slow", "medium", "fast"], "tune": ["none", "film"]}},
                    "constants": {{"g": 30}}
                }}}}"#,
                rate_control
            ),
            rate_control,
        )
        .unwrap();
        let app = AppConfig::default();
        RunConfig {
            encoder: encoder.to_string(),
            rate_control: rate_control.to_string(),
            family: EncoderRegistry::default().family_for(encoder).unwrap(),
            gene_space: GeneSpace::build(&params).unwrap(),
            constants: params.constant_args(),
            search: app.search,
            pipeline: app.pipeline,
            scoring: app.scoring,
        }
    }

    #[test]
    fn test_libx264_abr_args() {
        let args = build_args(&run("libx264", "ABR"), &[12.3, 1.0, 0.0]).unwrap();
        assert_eq!(args.output_args["c:v"], "libx264");
        assert_eq!(args.output_args["b:v"], "12M");
        assert_eq!(args.output_args["preset"], "medium");
        assert_eq!(args.output_args["g"], "30");
        assert!(!args.output_args.contains_key("tune"));
        assert!(!args.output_args.contains_key("maxrate"));
        assert!(!args.two_pass);
    }

    #[test]
    fn test_cbr_pins_rate_window() {
        let args = build_args(&run("h264_nvenc", "CBR"), &[20.0, 2.0, 1.0]).unwrap();
        assert_eq!(args.output_args["maxrate"], "20M");
        assert_eq!(args.output_args["minrate"], "20M");
        assert_eq!(args.output_args["tune"], "film");
    }

    #[test]
    fn test_family_adjustments() {
        let vaapi = build_args(&run("h264_vaapi", "CQP"), &[5.0, 0.0, 0.0]).unwrap();
        assert_eq!(vaapi.input_args["hwaccel"], "vaapi");
        assert!(!vaapi.output_args.contains_key("b:v"));

        let vpx = build_args(&run("libvpx-vp9", "CBR"), &[5.0, 0.0, 0.0]).unwrap();
        assert!(vpx.two_pass);
    }

    #[test]
    fn test_unknown_encoder() {
        assert!(EncoderRegistry::default().family_for("mpeg1video").is_err());
    }
}
