use sweetspot::config::{ConfigManager, RunConfig};
use sweetspot::engines::encoding::{build_args, EncoderFamily};
use sweetspot::engines::genes::initialize;

#[test]
fn test_bundled_config_builds_every_target() {
    let app = ConfigManager::load_from_file("sweetspot.toml").unwrap().into_inner();
    assert_eq!(app.search.population_size, 16);
    assert!(app.resume.is_none());
    assert!(app.logging.file);
    assert_eq!(app.logging.file_level, "debug");
    assert_eq!(app.output.logs_dir(), std::path::PathBuf::from("output/logs"));

    for target in &app.encoders.targets {
        for rate_control in &target.rate_controls {
            let run = RunConfig::build(&app, &target.encoder, rate_control).unwrap();
            assert_eq!(run.family, EncoderFamily::X264);

            let population = initialize(&run.gene_space, app.search.population_size, 4).unwrap();
            let args = build_args(&run, &population[0]).unwrap();
            assert_eq!(args.output_args["c:v"], "libx264");
            assert!(args.output_args.contains_key("preset"));
        }
    }
}

#[test]
fn test_libx264_abr_gene_order() {
    let app = ConfigManager::load_from_file("sweetspot.toml").unwrap().into_inner();
    let run = RunConfig::build(&app, "libx264", "ABR").unwrap();

    assert_eq!(run.gene_space.names(), vec!["qcomp", "b:v", "preset", "tune", "bf"]);
    assert_eq!(run.gene_space.integer_dimension_count(), 4);
    assert_eq!(run.constants["g"], "30");
}

#[test]
fn test_unknown_encoder_is_rejected() {
    let app = ConfigManager::load_from_file("sweetspot.toml").unwrap().into_inner();
    assert!(RunConfig::build(&app, "libfoo", "ABR").is_err());
}
