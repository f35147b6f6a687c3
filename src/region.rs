//! Regional selection and spatial reduction.
//!
//! A region is an inclusive lat/lon box. Longitude is the classic trap: some
//! models publish a 0–360° axis, others -180–180°, and bounds expressed in the
//! wrong convention select nothing. The bounds therefore declare their
//! convention explicitly and the source axis is normalized into it before any
//! comparison, so a mismatched convention either selects the right cells or
//! fails loudly with an empty-region error instead of silently averaging the
//! wrong side of the planet.

use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};
use crate::reader::GridAxis;
use crate::stack::Field3D;

/// Longitude convention a set of bounds is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LonConvention {
    /// Longitudes in [0, 360)
    #[serde(rename = "0_360")]
    ZeroTo360,
    /// Longitudes in [-180, 180)
    #[serde(rename = "-180_180")]
    Neg180To180,
}

impl LonConvention {
    /// Maps any longitude in degrees into this convention's range.
    pub fn normalize(self, lon: f64) -> f64 {
        match self {
            LonConvention::ZeroTo360 => lon.rem_euclid(360.0),
            LonConvention::Neg180To180 => (lon + 180.0).rem_euclid(360.0) - 180.0,
        }
    }
}

impl std::fmt::Display for LonConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LonConvention::ZeroTo360 => write!(f, "0..360"),
            LonConvention::Neg180To180 => write!(f, "-180..180"),
        }
    }
}

/// Inclusive lat/lon box with an explicit longitude convention
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub convention: LonConvention,
}

/// How selected cells are averaged into one value per time step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeanWeighting {
    /// Plain arithmetic mean, the reference behavior
    #[default]
    Unweighted,
    /// Cosine-of-latitude area weighting
    CosLat,
}

/// Axis indices falling inside a region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSelection {
    pub lat_indices: Vec<usize>,
    pub lon_indices: Vec<usize>,
}

impl RegionSelection {
    /// Number of selected grid cells.
    pub fn n_cells(&self) -> usize {
        self.lat_indices.len() * self.lon_indices.len()
    }
}

/// Returns the axis indices whose coordinate falls within the inclusive
/// bounds, normalizing the longitude axis into the bounds' declared
/// convention first.
///
/// Fails with `EmptyRegion` if either index set comes out empty. That is
/// almost always bounds expressed in a convention the source does not use,
/// which is why the error reports both the bounds and the axis ranges.
pub fn select_region(
    lon_axis: &GridAxis,
    lat_axis: &GridAxis,
    bounds: &RegionBounds,
) -> Result<RegionSelection> {
    let lat_indices: Vec<usize> = lat_axis
        .values()
        .iter()
        .enumerate()
        .filter(|&(_, &lat)| lat >= bounds.lat_min && lat <= bounds.lat_max)
        .map(|(idx, _)| idx)
        .collect();

    let lon_indices: Vec<usize> = lon_axis
        .values()
        .iter()
        .enumerate()
        .filter(|&(_, &lon)| {
            let lon = bounds.convention.normalize(lon);
            lon >= bounds.lon_min && lon <= bounds.lon_max
        })
        .map(|(idx, _)| idx)
        .collect();

    if lat_indices.is_empty() || lon_indices.is_empty() {
        let which = if lat_indices.is_empty() { "latitude" } else { "longitude" };
        return Err(PipelineError::EmptyRegion {
            detail: format!(
                "no {which} values match bounds lat [{}, {}], lon [{}, {}] ({}); \
                 axis ranges are lat [{}, {}], lon [{}, {}]",
                bounds.lat_min,
                bounds.lat_max,
                bounds.lon_min,
                bounds.lon_max,
                bounds.convention,
                lat_axis.first(),
                lat_axis.last(),
                lon_axis.first(),
                lon_axis.last(),
            ),
        });
    }

    log::debug!(
        "region selects {} x {} = {} cells",
        lat_indices.len(),
        lon_indices.len(),
        lat_indices.len() * lon_indices.len()
    );

    Ok(RegionSelection {
        lat_indices,
        lon_indices,
    })
}

/// Reduces the 3-D field to one value per time step: the mean over the
/// selected cells, ignoring cells equal to the declared fill value.
///
/// The default is the unweighted arithmetic mean, matching reference
/// behavior; `MeanWeighting::CosLat` applies cosine-of-latitude area weights
/// instead. Fails with `AllMissing` if every selected cell at some time step
/// is fill-valued: the mean is undefined there, and interpolating one in
/// would fabricate data.
pub fn reduce_to_series(
    field: &Field3D,
    lat_axis: &GridAxis,
    selection: &RegionSelection,
    weighting: MeanWeighting,
) -> Result<Vec<f64>> {
    let data = field.data();
    let mut series = Vec::with_capacity(field.n_time());

    for t in 0..field.n_time() {
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;

        for &j in &selection.lat_indices {
            let weight = match weighting {
                MeanWeighting::Unweighted => 1.0,
                MeanWeighting::CosLat => lat_axis.values()[j].to_radians().cos(),
            };
            for &i in &selection.lon_indices {
                let value = data[[t, j, i]];
                if field.is_missing(value) {
                    continue;
                }
                weighted_sum += weight * value;
                weight_total += weight;
            }
        }

        if weight_total == 0.0 {
            return Err(PipelineError::AllMissing { time_index: t });
        }
        series.push(weighted_sum / weight_total);
    }

    Ok(series)
}
