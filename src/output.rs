//! Parquet export of the extracted series.
//!
//! The pipeline performs no rendering; the annual (or monthly) series is
//! written as a small Parquet table for whatever plotting or reporting layer
//! comes next. S3 destinations are written via a local temp file and an
//! upload, like the inputs are staged.

use log::debug;
use polars::prelude::*;
use std::fs::File;

use crate::series::{AnnualSeries, TimeSeries1D};
use crate::storage::{StorageBackend, StorageFactory};

/// Builds a two-column (year, value) frame from an annual series.
pub fn annual_to_dataframe(
    series: &AnnualSeries,
    value_column: &str,
) -> Result<DataFrame, PolarsError> {
    let years: Vec<i32> = series.years().collect();
    let means: Vec<f64> = series.means().collect();

    let columns = vec![
        Series::new("year".into(), years).into(),
        Series::new(value_column.into(), means).into(),
    ];
    DataFrame::new(columns)
}

/// Builds a two-column (date, value) frame from the monthly series. Dates are
/// ISO-formatted strings so non-Gregorian calendar dates survive the trip.
pub fn monthly_to_dataframe(
    series: &TimeSeries1D,
    value_column: &str,
) -> Result<DataFrame, PolarsError> {
    let dates: Vec<String> = series.dates().iter().map(|d| d.to_string()).collect();
    let values: Vec<f64> = series.values().to_vec();

    let columns = vec![
        Series::new("date".into(), dates).into(),
        Series::new(value_column.into(), values).into(),
    ];
    DataFrame::new(columns)
}

/// Writes a DataFrame to a local Parquet file.
pub fn write_series_to_parquet(
    df: &DataFrame,
    output_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!("writing series to parquet file: {}", output_path);
    debug!("DataFrame shape: {:?}", df.shape());

    let file = File::create(output_path)?;
    let writer = ParquetWriter::new(file);
    let mut df_clone = df.clone();
    writer.finish(&mut df_clone)?;

    debug!("successfully wrote parquet file: {}", output_path);
    Ok(())
}

/// Writes a DataFrame to a local or `s3://` Parquet destination.
///
/// S3 destinations are written to a temporary file first, then uploaded.
pub async fn write_series_to_parquet_async(
    df: &DataFrame,
    output_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if StorageFactory::is_s3_path(output_path) {
        let temp_file = tempfile::NamedTempFile::new()?;
        let temp_path = temp_file
            .path()
            .to_str()
            .ok_or("temporary path is not valid UTF-8")?;

        write_series_to_parquet(df, temp_path)?;

        let storage = StorageFactory::from_path(output_path).await?;
        let data: Vec<u8> = tokio::fs::read(temp_file.path()).await?;
        storage.write(output_path, &data).await?;

        debug!("successfully wrote parquet file to S3: {}", output_path);
    } else {
        write_series_to_parquet(df, output_path)?;
    }

    Ok(())
}
