//! Job configuration for a pipeline run.
//!
//! Everything a run needs arrives in one explicit [`JobConfig`] value: the
//! ordered source list, the variable to extract, the region bounds with their
//! declared longitude convention, and the optional output destination. There
//! is no process-wide configuration state.
//!
//! ## Configuration Example
//!
//! ```json
//! {
//!   "sources": [
//!     "tas_Amon_ACCESS_historical_185001-189912.nc",
//!     "tas_Amon_ACCESS_historical_190001-194912.nc"
//!   ],
//!   "variable_name": "tas",
//!   "region": {
//!     "lat_min": -44.0, "lat_max": -10.0,
//!     "lon_min": 112.0, "lon_max": 154.0,
//!     "convention": "0_360"
//!   },
//!   "output": { "series_key": "tas_australia_annual.parquet" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::region::{MeanWeighting, RegionBounds};

fn default_lon_name() -> String {
    "lon".to_string()
}

fn default_lat_name() -> String {
    "lat".to_string()
}

fn default_time_name() -> String {
    "time".to_string()
}

/// Complete configuration for one extraction run.
///
/// `sources` must be in chronological order; the stitcher validates the order
/// against each file's own time axis but never reorders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Ordered source locators (local paths or s3://bucket/key)
    pub sources: Vec<String>,
    /// Name of the 3-D variable to extract
    pub variable_name: String,
    /// Name of the longitude axis variable
    #[serde(default = "default_lon_name")]
    pub lon_name: String,
    /// Name of the latitude axis variable
    #[serde(default = "default_lat_name")]
    pub lat_name: String,
    /// Name of the time coordinate variable
    #[serde(default = "default_time_name")]
    pub time_name: String,
    /// Region to extract, with its longitude convention
    pub region: RegionBounds,
    /// Spatial averaging weights
    #[serde(default)]
    pub weighting: MeanWeighting,
    /// Optional Parquet export of the result
    #[serde(default)]
    pub output: Option<OutputConfig>,
}

/// Where and what to export after the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Destination for the series file (local path or s3://bucket/key)
    pub series_key: String,
    /// Which series to export
    #[serde(default)]
    pub kind: OutputKind,
}

/// Which series the output file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Per-year means
    #[default]
    Annual,
    /// The monthly regional series before annual aggregation
    Monthly,
}

impl JobConfig {
    /// Loads a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: JobConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: JobConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: JobConfig = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.sources.is_empty() {
            return Err("configuration lists no sources".into());
        }
        if self.variable_name.is_empty() {
            return Err("variable_name is empty".into());
        }
        if self.region.lat_min > self.region.lat_max {
            return Err(format!(
                "region lat_min {} exceeds lat_max {}",
                self.region.lat_min, self.region.lat_max
            )
            .into());
        }
        if self.region.lon_min > self.region.lon_max {
            return Err(format!(
                "region lon_min {} exceeds lon_max {}",
                self.region.lon_min, self.region.lon_max
            )
            .into());
        }
        Ok(())
    }
}
