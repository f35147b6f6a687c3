use clap::Parser;

use crate::cli::{build_job_config, Cli, Commands, ConventionArg, RegionArg, SeriesKindArg};
use crate::input::OutputKind;
use crate::region::{LonConvention, MeanWeighting};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("arguments should parse")
}

#[test]
fn test_run_command_parses_sources_and_flags() {
    let cli = parse(&[
        "nc2series",
        "run",
        "a.nc",
        "b.nc",
        "-n",
        "tas",
        "--region",
        "-44:-10:112:154",
        "--convention",
        "0-360",
    ]);

    match cli.command {
        Commands::Run {
            sources,
            variable,
            region,
            convention,
            ..
        } => {
            assert_eq!(sources, vec!["a.nc", "b.nc"]);
            assert_eq!(variable.as_deref(), Some("tas"));
            assert_eq!(
                region,
                Some(RegionArg {
                    lat_min: -44.0,
                    lat_max: -10.0,
                    lon_min: 112.0,
                    lon_max: 154.0,
                })
            );
            assert_eq!(convention, Some(ConventionArg::ZeroTo360));
        }
        other => panic!("expected run command, got {other:?}"),
    }
}

#[test]
fn test_region_parser_rejects_malformed_bounds() {
    assert!(Cli::try_parse_from(["nc2series", "run", "a.nc", "--region", "1:2:3"]).is_err());
    assert!(Cli::try_parse_from(["nc2series", "run", "a.nc", "--region", "10:0:0:10"]).is_err());
    assert!(Cli::try_parse_from(["nc2series", "run", "a.nc", "--region", "a:b:c:d"]).is_err());
}

#[test]
fn test_verbose_and_quiet_conflict() {
    assert!(Cli::try_parse_from(["nc2series", "-v", "-q", "run", "a.nc"]).is_err());
}

#[test]
fn test_info_command_defaults() {
    let cli = parse(&["nc2series", "info", "tas.nc"]);
    match cli.command {
        Commands::Info {
            source,
            variable,
            detailed,
            time_name,
            json,
        } => {
            assert_eq!(source, "tas.nc");
            assert!(variable.is_none());
            assert!(!detailed);
            assert_eq!(time_name, "time");
            assert!(!json);
        }
        other => panic!("expected info command, got {other:?}"),
    }
}

#[test]
fn test_build_config_from_flags_alone() {
    let config = build_job_config(
        None,
        &["a.nc".to_string(), "b.nc".to_string()],
        Some("tas"),
        Some(RegionArg {
            lat_min: 30.0,
            lat_max: 60.0,
            lon_min: -10.0,
            lon_max: 40.0,
        }),
        Some(ConventionArg::Neg180To180),
        true,
        Some("out.parquet"),
        SeriesKindArg::Monthly,
    )
    .unwrap();

    assert_eq!(config.sources, vec!["a.nc", "b.nc"]);
    assert_eq!(config.variable_name, "tas");
    assert_eq!(config.region.convention, LonConvention::Neg180To180);
    assert_eq!(config.weighting, MeanWeighting::CosLat);
    let output = config.output.unwrap();
    assert_eq!(output.series_key, "out.parquet");
    assert_eq!(output.kind, OutputKind::Monthly);
}

#[test]
fn test_build_config_requires_region_without_file() {
    let result = build_job_config(
        None,
        &["a.nc".to_string()],
        Some("tas"),
        None,
        None,
        false,
        None,
        SeriesKindArg::Annual,
    );
    assert!(result.is_err());
}

#[test]
fn test_flags_override_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("job.json");
    std::fs::write(
        &path,
        r#"{
            "sources": ["old.nc"],
            "variable_name": "tas",
            "region": {
                "lat_min": 0.0, "lat_max": 10.0,
                "lon_min": 0.0, "lon_max": 10.0,
                "convention": "0_360"
            }
        }"#,
    )?;

    let config = build_job_config(
        Some(&path),
        &["new.nc".to_string()],
        Some("pr"),
        None,
        Some(ConventionArg::Neg180To180),
        false,
        None,
        SeriesKindArg::Annual,
    )?;

    assert_eq!(config.sources, vec!["new.nc"]);
    assert_eq!(config.variable_name, "pr");
    assert_eq!(config.region.convention, LonConvention::Neg180To180);
    // Bounds from the file survive when no --region is given.
    assert_eq!(config.region.lat_max, 10.0);

    Ok(())
}

#[test]
fn test_empty_flag_sources_keep_config_file_sources() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("job.json");
    std::fs::write(
        &path,
        r#"{
            "sources": ["a.nc", "b.nc"],
            "variable_name": "tas",
            "region": {
                "lat_min": 0.0, "lat_max": 10.0,
                "lon_min": 0.0, "lon_max": 10.0,
                "convention": "0_360"
            }
        }"#,
    )?;

    let config = build_job_config(
        Some(&path),
        &[],
        None,
        None,
        None,
        false,
        None,
        SeriesKindArg::Annual,
    )?;

    assert_eq!(config.sources, vec!["a.nc", "b.nc"]);
    Ok(())
}
