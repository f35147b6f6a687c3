//! # CLI Module
//!
//! Command-line interface for nc2series:
//! - Argument parsing with clap
//! - Configuration file loading (JSON/YAML) with command-line overrides
//! - Environment variable support with NC2SERIES_ prefix
//! - Subcommands for running jobs, inspecting sources, and shell completions
//! - Progress reporting while sources are staged and read

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

use crate::input::{JobConfig, OutputConfig, OutputKind};
use crate::log::{
    config_echo, show_farewell_with_timing, show_greeting, show_selection_summary,
    show_stitch_summary,
};
use crate::region::{LonConvention, MeanWeighting, RegionBounds};

/// Stitch gridded NetCDF climate-model output into regional annual-mean series
#[derive(Parser, Debug)]
#[command(name = "nc2series")]
#[command(about = "Stitch NetCDF climate-model output into a regional annual-mean series")]
#[command(version)]
#[command(long_about = "
nc2series loads one or more NetCDF files of gridded climate-model output,
aligns their time axes (including 365-day model calendars), concatenates them
into one continuous record, averages a lat/lon region, and aggregates the
result to annual means.

EXAMPLES:
  # Stitch two files and print the annual series
  nc2series run tas_185001-189912.nc tas_190001-194912.nc \\
    -n tas --region '-44:-10:112:154' --convention 0-360

  # Same job from a config file, exporting Parquet
  nc2series run --config job.json

  # Sources on S3
  nc2series run s3://cmip6/tas_185001-189912.nc -n tas \\
    --region '30:60:-10:40' --convention neg180-180 -o s3://results/tas.parquet

  # Inspect a source's structure and time encoding
  nc2series info tas_185001-189912.nc --detailed

  # Generate a config template
  nc2series template > job.json

  # Generate completions
  nc2series completions bash > ~/.bash_completion.d/nc2series
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors and results
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path (JSON or YAML)
    #[arg(short, long, global = true, env = "NC2SERIES_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an extraction job
    Run {
        /// Input NetCDF sources in chronological order (local or S3)
        #[arg(value_name = "SOURCE")]
        sources: Vec<String>,

        /// Variable name to extract
        #[arg(short = 'n', long, env = "NC2SERIES_VARIABLE")]
        variable: Option<String>,

        /// Region bounds as 'lat_min:lat_max:lon_min:lon_max'
        #[arg(long, value_parser = parse_region, allow_hyphen_values = true, env = "NC2SERIES_REGION")]
        region: Option<RegionArg>,

        /// Longitude convention the region bounds are expressed in
        #[arg(long, value_enum, env = "NC2SERIES_CONVENTION")]
        convention: Option<ConventionArg>,

        /// Use cosine-of-latitude area weighting instead of the plain mean
        #[arg(long)]
        cos_lat: bool,

        /// Output Parquet destination (local or S3)
        #[arg(short = 'o', long, env = "NC2SERIES_OUTPUT")]
        output: Option<String>,

        /// Which series the output file holds
        #[arg(long, value_enum, default_value_t = SeriesKindArg::Annual)]
        output_kind: SeriesKindArg,

        /// Validate the configuration without reading any source
        #[arg(long)]
        dry_run: bool,
    },

    /// Inspect a source's dimensions, variables, and time encoding
    Info {
        /// Source locator (local or S3)
        source: String,

        /// Describe only this variable
        #[arg(short = 'n', long)]
        variable: Option<String>,

        /// Include every variable attribute
        #[arg(long)]
        detailed: bool,

        /// Name of the time coordinate variable
        #[arg(long, default_value = "time")]
        time_name: String,

        /// Emit machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print a configuration template
    Template,

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Region bounds parsed from the command line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionArg {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

/// Longitude convention flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConventionArg {
    /// Bounds use longitudes in [0, 360)
    #[value(name = "0-360")]
    ZeroTo360,
    /// Bounds use longitudes in [-180, 180)
    #[value(name = "neg180-180")]
    Neg180To180,
}

impl From<ConventionArg> for LonConvention {
    fn from(arg: ConventionArg) -> Self {
        match arg {
            ConventionArg::ZeroTo360 => LonConvention::ZeroTo360,
            ConventionArg::Neg180To180 => LonConvention::Neg180To180,
        }
    }
}

/// Output series flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeriesKindArg {
    Annual,
    Monthly,
}

impl From<SeriesKindArg> for OutputKind {
    fn from(arg: SeriesKindArg) -> Self {
        match arg {
            SeriesKindArg::Annual => OutputKind::Annual,
            SeriesKindArg::Monthly => OutputKind::Monthly,
        }
    }
}

/// Parse region bounds from the command line
/// Format: lat_min:lat_max:lon_min:lon_max
fn parse_region(s: &str) -> Result<RegionArg, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 4 {
        return Err("Region must be in format 'lat_min:lat_max:lon_min:lon_max'".to_string());
    }

    let lat_min = parts[0]
        .parse::<f64>()
        .map_err(|_| "Invalid lat_min value")?;
    let lat_max = parts[1]
        .parse::<f64>()
        .map_err(|_| "Invalid lat_max value")?;
    let lon_min = parts[2]
        .parse::<f64>()
        .map_err(|_| "Invalid lon_min value")?;
    let lon_max = parts[3]
        .parse::<f64>()
        .map_err(|_| "Invalid lon_max value")?;

    if lat_min > lat_max {
        return Err("lat_min must not exceed lat_max".to_string());
    }
    if lon_min > lon_max {
        return Err("lon_min must not exceed lon_max".to_string());
    }

    Ok(RegionArg {
        lat_min,
        lat_max,
        lon_min,
        lon_max,
    })
}

/// Builds the effective job configuration for `run`: the config file (when
/// given) provides the base, command-line values override it.
pub fn build_job_config(
    config_path: Option<&PathBuf>,
    sources: &[String],
    variable: Option<&str>,
    region: Option<RegionArg>,
    convention: Option<ConventionArg>,
    cos_lat: bool,
    output: Option<&str>,
    output_kind: SeriesKindArg,
) -> Result<JobConfig, Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => load_config_file(path)?,
        None => {
            let region = region.ok_or("--region is required when no config file is given")?;
            let convention =
                convention.ok_or("--convention is required when no config file is given")?;
            JobConfig {
                sources: Vec::new(),
                variable_name: variable
                    .ok_or("--variable is required when no config file is given")?
                    .to_string(),
                lon_name: "lon".to_string(),
                lat_name: "lat".to_string(),
                time_name: "time".to_string(),
                region: RegionBounds {
                    lat_min: region.lat_min,
                    lat_max: region.lat_max,
                    lon_min: region.lon_min,
                    lon_max: region.lon_max,
                    convention: convention.into(),
                },
                weighting: MeanWeighting::Unweighted,
                output: None,
            }
        }
    };

    if !sources.is_empty() {
        config.sources = sources.to_vec();
    }
    if let Some(variable) = variable {
        config.variable_name = variable.to_string();
    }
    if let Some(region) = region {
        config.region.lat_min = region.lat_min;
        config.region.lat_max = region.lat_max;
        config.region.lon_min = region.lon_min;
        config.region.lon_max = region.lon_max;
    }
    if let Some(convention) = convention {
        config.region.convention = convention.into();
    }
    if cos_lat {
        config.weighting = MeanWeighting::CosLat;
    }
    if let Some(output) = output {
        config.output = Some(OutputConfig {
            series_key: output.to_string(),
            kind: output_kind.into(),
        });
    }

    config.validate()?;
    Ok(config)
}

/// Loads a JSON or YAML config file, picked by extension.
fn load_config_file(path: &PathBuf) -> Result<JobConfig, Box<dyn std::error::Error>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => JobConfig::from_yaml_file(path),
        _ => JobConfig::from_file(path),
    }
}

/// Dispatches a parsed command line.
pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run {
            sources,
            variable,
            region,
            convention,
            cos_lat,
            output,
            output_kind,
            dry_run,
        } => {
            let config = build_job_config(
                cli.config.as_ref(),
                &sources,
                variable.as_deref(),
                region,
                convention,
                cos_lat,
                output.as_deref(),
                output_kind,
            )?;

            if !cli.quiet {
                let shown = cli
                    .config
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "command line".to_string());
                show_greeting(&shown);
                config_echo(&config);
            }

            if dry_run {
                println!("\nConfiguration is valid; no sources were read.");
                return Ok(());
            }

            run_job(&config, cli.quiet).await
        }

        Commands::Info {
            source,
            variable,
            detailed,
            time_name,
            json,
        } => {
            let info =
                crate::info::get_source_info(&source, variable.as_deref(), detailed, &time_name)
                    .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                crate::info::print_source_info(&info);
            }
            Ok(())
        }

        Commands::Template => {
            println!("{}", config_template());
            Ok(())
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "nc2series", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Runs a job with per-source progress reporting.
async fn run_job(config: &JobConfig, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(config.sources.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    let mut segments = Vec::with_capacity(config.sources.len());
    for locator in &config.sources {
        progress.set_message(locator.clone());
        segments.push(crate::read_source(config, locator).await?);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let n_segments = segments.len();
    let result = crate::reduce_segments(config, segments)?;

    if !quiet {
        if let (Some(&first), Some(&last)) = (
            result.monthly.dates().first(),
            result.monthly.dates().last(),
        ) {
            show_stitch_summary(n_segments, result.monthly.len(), first, last);
        }
        show_selection_summary(&result.selection);
    }

    match &config.output {
        Some(output_config) => {
            let df = match output_config.kind {
                OutputKind::Annual => {
                    crate::output::annual_to_dataframe(&result.annual, &config.variable_name)?
                }
                OutputKind::Monthly => {
                    crate::output::monthly_to_dataframe(&result.monthly, &config.variable_name)?
                }
            };
            crate::output::write_series_to_parquet_async(&df, &output_config.series_key).await?;
            if !quiet {
                println!("\nWrote {}", output_config.series_key);
            }
        }
        None => {
            println!("\n{:>6}  {:>12}", "year", config.variable_name);
            for point in result.annual.points() {
                println!("{:>6}  {:>12.4}", point.year, point.mean);
            }
            if let Some(trend) = result.annual.linear_trend() {
                println!(
                    "\ntrend: {:+.4} per year ({:+.2} per century)",
                    trend.slope_per_year,
                    trend.slope_per_year * 100.0
                );
            }
        }
    }

    if !quiet {
        show_farewell_with_timing(start_time.elapsed(), result.annual.len());
    }

    Ok(())
}

/// Sample configuration printed by `nc2series template`.
fn config_template() -> &'static str {
    r#"{
  "sources": [
    "tas_Amon_MODEL_historical_185001-189912.nc",
    "tas_Amon_MODEL_historical_190001-194912.nc"
  ],
  "variable_name": "tas",
  "lon_name": "lon",
  "lat_name": "lat",
  "time_name": "time",
  "region": {
    "lat_min": -44.0,
    "lat_max": -10.0,
    "lon_min": 112.0,
    "lon_max": 154.0,
    "convention": "0_360"
  },
  "weighting": "unweighted",
  "output": {
    "series_key": "tas_region_annual.parquet",
    "kind": "annual"
  }
}"#
}
