//! # nc2series
//!
//! A Rust library for stitching gridded NetCDF climate-model output into a
//! regional annual-mean time series.
//!
//! ## Features
//!
//! - **Multi-file stitching**: Concatenates sources covering disjoint time
//!   spans along the time axis, validating spatial-grid consistency and
//!   chronological order
//! - **Model calendars**: Normalizes CF time encodings, including the 365-day
//!   "no-leap" calendar many models run on
//! - **Region extraction**: Inclusive lat/lon bounds with explicit longitude
//!   convention handling (0–360 vs -180–180)
//! - **Cloud sources**: Local paths and `s3://bucket/key` locators
//! - **Fail-fast**: A single bad source aborts the run; there is no partial
//!   output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nc2series::{process_series_job, input::JobConfig};
//!
//! # tokio_test::block_on(async {
//! // Load configuration from JSON file
//! let config = JobConfig::from_file("job.json").expect("Failed to load config");
//!
//! // Stitch the sources and reduce to an annual regional series
//! let result = process_series_job(&config).await.expect("Pipeline failed");
//!
//! for point in result.annual.points() {
//!     println!("{}: {:.2}", point.year, point.mean);
//! }
//! # });
//! ```

pub mod calendar;
pub mod cli;
pub mod errors;
pub mod info;
pub mod input;
pub mod log;
pub mod output;
pub mod reader;
pub mod region;
pub mod resample;
pub mod series;
pub mod stack;
pub mod storage;


#[cfg(test)]
mod cli_tests;

use crate::errors::{PipelineError, Result};
use crate::input::{JobConfig, OutputKind};
use crate::reader::GridSource;
use crate::region::RegionSelection;
use crate::series::{AnnualSeries, TimeSeries1D};
use crate::stack::Segment;
use crate::storage::stage_source;

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Monthly regional series before annual aggregation
    pub monthly: TimeSeries1D,
    /// Per-year means
    pub annual: AnnualSeries,
    /// Grid indices the region resolved to
    pub selection: RegionSelection,
}

/// Stages and reads one source: axes, field, and normalized time axis.
///
/// The NetCDF handle and any staged temp copy are released when this returns,
/// on success and failure alike.
pub async fn read_source(config: &JobConfig, locator: &str) -> Result<Segment> {
    let staged = stage_source(locator)
        .await
        .map_err(|e| PipelineError::unavailable(locator, e))?;
    let source = GridSource::open(staged)?;

    let (offsets, encoding) = source.read_time(&config.time_name)?;
    let dates = calendar::normalize(&offsets, &encoding, source.locator())?;

    let lon_axis = source.read_axis(&config.lon_name)?;
    let lat_axis = source.read_axis(&config.lat_name)?;
    let (field, meta) = source.read_variable(
        &config.variable_name,
        &config.time_name,
        &config.lat_name,
        &config.lon_name,
    )?;

    ::log::debug!(
        "read {}: {} time steps, {} lat x {} lon, units {:?}",
        locator,
        field.n_time(),
        field.n_lat(),
        field.n_lon(),
        meta.units
    );

    Ok(Segment {
        locator: locator.to_string(),
        field,
        dates,
        lon_axis,
        lat_axis,
    })
}

/// Stitches the segments and reduces them to the regional series.
///
/// Segments must be in the caller's chronological order; the stitcher
/// validates that order but never reorders.
pub fn reduce_segments(config: &JobConfig, segments: Vec<Segment>) -> Result<JobResult> {
    let (lon_axis, lat_axis) = match segments.first() {
        Some(first) => (first.lon_axis.clone(), first.lat_axis.clone()),
        None => {
            return Err(PipelineError::ShapeError {
                source_name: "<none>".to_string(),
                detail: "no sources were read".to_string(),
            });
        }
    };

    let n_segments = segments.len();
    let (field, dates) = stack::concatenate(segments)?;
    ::log::debug!(
        "stitched {} segments: {} total time steps",
        n_segments,
        field.n_time()
    );

    let selection = region::select_region(&lon_axis, &lat_axis, &config.region)?;
    let values = region::reduce_to_series(&field, &lat_axis, &selection, config.weighting)?;

    let monthly = TimeSeries1D::new(dates, values)?;
    let annual = resample::resample_annual(&monthly);

    Ok(JobResult {
        monthly,
        annual,
        selection,
    })
}

/// Runs the whole pipeline for one job configuration.
///
/// 1. Stages and reads every source, in the configured order
/// 2. Stitches the fields along the time axis
/// 3. Selects the region and reduces to a monthly series
/// 4. Aggregates to annual means
/// 5. Writes the configured Parquet output, if any
///
/// # Errors
///
/// Fails fast on the first unavailable source, missing variable, malformed
/// time encoding, grid mismatch, empty region, or all-missing time step. The
/// error names the offending source so the caller can surface it verbatim.
pub async fn process_series_job(config: &JobConfig) -> std::result::Result<JobResult, Box<dyn std::error::Error>> {
    config.validate()?;

    let mut segments = Vec::with_capacity(config.sources.len());
    for locator in &config.sources {
        segments.push(read_source(config, locator).await?);
    }

    let result = reduce_segments(config, segments)?;

    if let Some(output_config) = &config.output {
        let df = match output_config.kind {
            OutputKind::Annual => output::annual_to_dataframe(&result.annual, &config.variable_name)?,
            OutputKind::Monthly => {
                output::monthly_to_dataframe(&result.monthly, &config.variable_name)?
            }
        };
        output::write_series_to_parquet_async(&df, &output_config.series_key).await?;
    }

    Ok(result)
}
